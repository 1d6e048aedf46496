//! Field validators for the booking conversation.
//!
//! Every validator takes raw user text and returns either a canonical value
//! or a user-facing rejection message. Rejections are expected input
//! problems, not system faults, so they are plain values rather than errors
//! that propagate. Canonical values are stable: feeding one back into its
//! validator yields the same value.

pub mod datetime;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::domain::booking::AppointmentType;

/// A user-correctable input problem. The message is surfaced to the user
/// verbatim together with a retry prompt.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

pub type FieldResult = Result<String, ValidationError>;

fn rejected(message: impl Into<String>) -> FieldResult {
    Err(ValidationError(message.into()))
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

static EMAIL_SCAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email scan pattern")
});

static NAME_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s\-.']+$").expect("name charset pattern"));

static EVENT_HANDLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on\w+=").expect("event handler pattern"));

/// Raw substrings removed from input after HTML-escaping, case-insensitively.
/// Statement separators and quote characters double as entity terminators,
/// so escaped entities may lose their trailing `;`. The result is display
/// text, not markup. This pass is defense-in-depth only; the persistence
/// layer must use parameterized queries regardless.
const DENYLIST: &[&str] = &["--", ";", "'", "\"", "<script", "javascript:"];

/// HTML-escape, strip the denylist, trim.
pub fn sanitize_input(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }

    let mut cleaned = escaped;
    for pattern in DENYLIST {
        cleaned = remove_case_insensitive(&cleaned, pattern);
    }
    cleaned = EVENT_HANDLER_RE.replace_all(&cleaned, "").into_owned();

    cleaned.trim().to_string()
}

// ASCII lowercasing keeps byte offsets aligned with the original text; the
// denylist patterns are all ASCII.
fn remove_case_insensitive(text: &str, pattern: &str) -> String {
    let lower_text = text.to_ascii_lowercase();
    let lower_pattern = pattern.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(found) = lower_text[cursor..].find(&lower_pattern) {
        let start = cursor + found;
        out.push_str(&text[cursor..start]);
        cursor = start + lower_pattern.len();
    }
    out.push_str(&text[cursor..]);
    out
}

/// Validate and normalize a customer name. Accepts letters, spaces, hyphens,
/// periods, and apostrophes; 2-100 characters; canonical form capitalizes
/// each whitespace-delimited word.
pub fn validate_name(name: &str) -> FieldResult {
    if name.trim().is_empty() {
        return rejected("Name is required");
    }

    let name = sanitize_input(name);

    if name.len() < 2 {
        return rejected("Name must be at least 2 characters");
    }
    if name.len() > 100 {
        return rejected("Name is too long (max 100 characters)");
    }
    if !NAME_CHARSET_RE.is_match(&name) {
        return rejected("Name can only contain letters, spaces, hyphens, and apostrophes");
    }

    Ok(capitalize_words(&name))
}

/// Validate and normalize an email address: trimmed, lowercased, matched
/// against a local@domain.tld pattern. No DNS or mailbox verification.
pub fn validate_email(email: &str) -> FieldResult {
    if email.trim().is_empty() {
        return rejected("Email address is required");
    }

    let email = email.trim().to_lowercase();

    if email.len() > 254 {
        return rejected("Email address is too long");
    }
    if !EMAIL_RE.is_match(&email) {
        return rejected("Please enter a valid email address (e.g., name@example.com)");
    }

    Ok(email)
}

/// Validate a phone number. The canonical value is the bare digit string,
/// 10-15 digits; all punctuation and spacing is discarded.
pub fn validate_phone(phone: &str) -> FieldResult {
    if phone.trim().is_empty() {
        return rejected("Phone number is required");
    }

    let digits: String = phone.chars().filter(|ch| ch.is_ascii_digit()).collect();

    if digits.len() < 10 {
        return rejected("Phone number must have at least 10 digits");
    }
    if digits.len() > 15 {
        return rejected("Phone number is too long");
    }

    Ok(digits)
}

/// Validate an appointment type against the catalog. Matching is
/// case-insensitive and accepts substring containment in either direction.
/// Unmatched input is accepted verbatim (title-cased) rather than rejected:
/// the catalog is a convenience, not a gate.
pub fn validate_booking_type(booking_type: &str) -> FieldResult {
    if booking_type.trim().is_empty() {
        return rejected("Appointment type is required");
    }

    let booking_type = sanitize_input(booking_type);
    let booking_lower = booking_type.to_lowercase();

    for appointment in AppointmentType::ALL {
        let catalog_lower = appointment.label().to_lowercase();
        if booking_lower == catalog_lower
            || catalog_lower.contains(&booking_lower)
            || booking_lower.contains(&catalog_lower)
        {
            return Ok(title_case(&catalog_lower));
        }
    }

    Ok(title_case(&booking_type))
}

/// Scan free text for the first embedded email address (used by the
/// booking-lookup conversation path).
pub fn find_email(text: &str) -> Option<String> {
    EMAIL_SCAN_RE.find(text).map(|found| found.as_str().to_lowercase())
}

/// Capitalize each whitespace-delimited word: first letter upper, rest lower.
/// Collapses runs of whitespace to single spaces.
fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Uppercase the first letter after every non-alphabetic boundary, lowercase
/// the rest ("follow-up visit" -> "Follow-Up Visit").
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        find_email, sanitize_input, validate_booking_type, validate_email, validate_name,
        validate_phone,
    };

    #[test]
    fn name_is_title_cased() {
        assert_eq!(validate_name("ada lovelace").unwrap(), "Ada Lovelace");
        assert_eq!(validate_name("  MARIE   curie ").unwrap(), "Marie Curie");
        assert_eq!(validate_name("dr. mary-jane watson").unwrap(), "Dr. Mary-jane Watson");
    }

    #[test]
    fn name_rejects_empty_short_and_long() {
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("a").is_err());
        assert!(validate_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn name_rejects_markup_and_digits() {
        assert!(validate_name("Robert<script>alert(1)</script>").is_err());
        assert!(validate_name("agent 007").is_err());
    }

    #[test]
    fn email_normalizes_to_lowercase() {
        assert_eq!(validate_email("  Ada.Lovelace@Example.COM ").unwrap(), "ada.lovelace@example.com");
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        for bad in ["", "plainaddress", "missing@tld", "@example.com", "a b@example.com"] {
            assert!(validate_email(bad).is_err(), "expected rejection for {bad:?}");
        }
        let long_local = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long_local).is_err());
    }

    #[test]
    fn email_canonical_value_round_trips() {
        let canonical = validate_email("Ada@Example.com").unwrap();
        assert_eq!(validate_email(&canonical).unwrap(), canonical);
    }

    #[test]
    fn name_canonical_value_round_trips() {
        let canonical = validate_name("ada   lovelace").unwrap();
        assert_eq!(validate_name(&canonical).unwrap(), canonical);
    }

    #[test]
    fn phone_extracts_digits_from_any_punctuation() {
        for raw in ["(555) 123-4567", "555.123.4567", "+1 555 123 4567 ext", "555-123-4567"] {
            let digits = validate_phone(raw).unwrap();
            assert!(digits.chars().all(|ch| ch.is_ascii_digit()));
            assert!((10..=15).contains(&digits.len()), "unexpected length for {raw:?}");
        }
        assert_eq!(validate_phone("(555) 123-4567").unwrap(), "5551234567");
    }

    #[test]
    fn phone_enforces_digit_count_window() {
        assert!(validate_phone("123456789").is_err());
        assert!(validate_phone("1234567890123456").is_err());
        assert_eq!(validate_phone("1234567890").unwrap(), "1234567890");
        assert_eq!(validate_phone("123456789012345").unwrap(), "123456789012345");
    }

    #[test]
    fn booking_type_matches_catalog_case_insensitively() {
        assert_eq!(validate_booking_type("DENTAL care").unwrap(), "Dental Care");
        assert_eq!(validate_booking_type("vaccination").unwrap(), "Vaccination");
    }

    #[test]
    fn booking_type_matches_on_partial_input() {
        // "dental" is contained in "dental care"
        assert_eq!(validate_booking_type("dental").unwrap(), "Dental Care");
        // catalog entry contained in a longer request
        assert_eq!(validate_booking_type("urgent lab tests please").unwrap(), "Lab Tests");
    }

    #[test]
    fn unknown_booking_type_is_accepted_verbatim() {
        assert_eq!(validate_booking_type("acupuncture session").unwrap(), "Acupuncture Session");
    }

    #[test]
    fn booking_type_canonical_value_round_trips() {
        for input in ["follow-up", "eye exam", "acupuncture session"] {
            let canonical = validate_booking_type(input).unwrap();
            assert_eq!(validate_booking_type(&canonical).unwrap(), canonical);
        }
    }

    #[test]
    fn sanitize_strips_denylisted_patterns() {
        assert_eq!(sanitize_input("Robert; DROP TABLE--"), "Robert DROP TABLE");
        assert!(!sanitize_input("<script>alert('x')</script>").contains("<script"));
        assert!(!sanitize_input("JavaScript:evil()").to_lowercase().contains("javascript:"));
        assert!(!sanitize_input("<img onerror=boom>").contains("onerror="));
        assert_eq!(sanitize_input("  plain text  "), "plain text");
    }

    #[test]
    fn sanitize_escapes_html_entities() {
        assert_eq!(sanitize_input("a < b > c"), "a &lt b &gt c");
    }

    #[test]
    fn find_email_scans_free_text() {
        assert_eq!(
            find_email("check my appointments for Ada@Example.com please"),
            Some("ada@example.com".to_string())
        );
        assert_eq!(find_email("no address here"), None);
    }
}
