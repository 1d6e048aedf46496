use serde::{Deserialize, Serialize};

use crate::domain::booking::AppointmentType;
use crate::domain::slots::BookingField;

/// States of the booking conversation. Exactly one is active per session.
/// `Completed` is a transient marker between a successful save and the reset
/// to `Idle`; it never survives across turns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingState {
    #[default]
    Idle,
    Collecting,
    Confirming,
    Editing,
    Completed,
}

/// Affirmative replies while confirming. Matched by case-insensitive
/// equality after trimming.
pub const CONFIRM_WORDS: &[&str] =
    &["yes", "y", "confirm", "confirmed", "correct", "ok", "okay", "yep", "sure"];

pub const CANCEL_WORDS: &[&str] = &["cancel", "nevermind", "never mind", "abort", "stop"];

pub const EDIT_WORDS: &[&str] = &["no", "n", "edit", "change", "modify", "wrong"];

/// Keyword scan used from the confirmation state: "change the date" jumps
/// straight into editing the date without the numbered menu round-trip.
/// Earlier fields win on overlapping keywords.
const FIELD_KEYWORDS: &[(BookingField, &[&str])] = &[
    (BookingField::Name, &["name"]),
    (BookingField::Email, &["email", "mail"]),
    (BookingField::Phone, &["phone", "number", "mobile", "cell"]),
    (BookingField::BookingType, &["type", "appointment", "service"]),
    (BookingField::Date, &["date", "day"]),
    (BookingField::Time, &["time", "hour"]),
];

/// Selection table for the edit menu, keyed by both the menu digits and
/// natural keywords, matched by substring containment in listed order.
const FIELD_SELECTIONS: &[(&str, BookingField)] = &[
    ("1", BookingField::Name),
    ("name", BookingField::Name),
    ("2", BookingField::Email),
    ("email", BookingField::Email),
    ("mail", BookingField::Email),
    ("3", BookingField::Phone),
    ("phone", BookingField::Phone),
    ("number", BookingField::Phone),
    ("mobile", BookingField::Phone),
    ("4", BookingField::BookingType),
    ("type", BookingField::BookingType),
    ("appointment", BookingField::BookingType),
    ("service", BookingField::BookingType),
    ("5", BookingField::Date),
    ("date", BookingField::Date),
    ("day", BookingField::Date),
    ("6", BookingField::Time),
    ("time", BookingField::Time),
    ("hour", BookingField::Time),
];

/// The question asked when collecting this field.
pub fn field_prompt(field: BookingField) -> String {
    match field {
        BookingField::Name => "What is your full name?".to_string(),
        BookingField::Email => "What is your email address?".to_string(),
        BookingField::Phone => "What is your phone number?".to_string(),
        BookingField::BookingType => {
            let mut prompt =
                String::from("What type of appointment would you like to schedule?\n\nAvailable types:");
            for appointment in AppointmentType::ALL {
                prompt.push_str("\n- ");
                prompt.push_str(appointment.label());
            }
            prompt
        }
        BookingField::Date => "What date would you like to schedule your appointment?\n(You can \
                               say 'tomorrow', 'next Monday', or a specific date like 'Jan 25')"
            .to_string(),
        BookingField::Time => "What time would you prefer?\n(You can say '3pm', 'morning', \
                               'afternoon', or a specific time like '14:30')"
            .to_string(),
    }
}

pub fn edit_menu() -> &'static str {
    "Which field would you like to change?\n\n\
     1. Name\n\
     2. Email\n\
     3. Phone\n\
     4. Appointment Type\n\
     5. Date\n\
     6. Time\n\n\
     Just type the field name or number:"
}

/// Scan a confirmation reply for a field mention ("change the date").
pub fn field_from_keywords(response: &str) -> Option<BookingField> {
    FIELD_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| response.contains(keyword)))
        .map(|(field, _)| *field)
}

/// Resolve an edit-menu selection by digit or keyword.
pub fn field_from_selection(input: &str) -> Option<BookingField> {
    FIELD_SELECTIONS.iter().find(|(key, _)| input.contains(key)).map(|(_, field)| *field)
}
