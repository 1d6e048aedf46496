//! Natural-language date and time parsing for appointment scheduling.
//!
//! The accepted grammar is a fixed, enumerable pattern table: relative
//! literals ("tomorrow"), weekday references ("next monday"), a small set of
//! explicit date formats (month-day-year ordering preferred), period words
//! ("afternoon"), am/pm and 24-hour clock forms. Anything outside the table
//! is rejected with a reprompt hint. The booking-window and business-hour
//! rules depend on knowing exactly which inputs were accepted, so the
//! grammar must not grow silently.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use regex::Regex;

use super::{rejected, FieldResult};

/// Appointments may be booked at most this many days ahead.
const MAX_ADVANCE_DAYS: i64 = 365;

/// Business hours: bookable starting at this hour...
const OPENING_HOUR: u32 = 8;
/// ...and strictly before this hour.
const CLOSING_HOUR: u32 = 18;

const TIME_OF_DAY_WORDS: &[&str] =
    &["morning", "afternoon", "evening", "night", "noon", "midday"];

/// Exact-match period words mapped to a representative slot time.
const TIME_PERIODS: &[(&str, &str)] = &[
    ("early morning", "08:00"),
    ("morning", "09:00"),
    ("late morning", "11:00"),
    ("noon", "12:00"),
    ("midday", "12:00"),
    ("afternoon", "14:00"),
    ("late afternoon", "16:00"),
    ("evening", "17:00"),
];

static TRAILING_AT_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+at\s+\d+.*$").expect("trailing at-time pattern"));

static TRAILING_CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d+\s*(am|pm).*$").expect("trailing clock pattern"));

static AM_PM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(?::(\d{2}))?(am|pm)$").expect("am/pm pattern"));

static CLOCK_24H_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(?::(\d{2}))?$").expect("24h clock pattern"));

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})$").expect("iso date pattern"));

static NUMERIC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[-/](\d{1,2})(?:[-/](\d{2,4}))?$").expect("numeric date pattern")
});

/// Parse a natural-language date expression into canonical `YYYY-MM-DD`,
/// relative to the local calendar date.
pub fn parse_natural_date(input: &str) -> FieldResult {
    parse_natural_date_on(Local::now().date_naive(), input)
}

/// Deterministic variant of [`parse_natural_date`] with an explicit "today".
pub fn parse_natural_date_on(today: NaiveDate, input: &str) -> FieldResult {
    if input.trim().is_empty() {
        return rejected("Date is required");
    }

    let mut text = input.trim().to_lowercase();

    // A combined date+time phrase ("tomorrow afternoon", "friday at 3pm")
    // degrades to its date portion.
    for word in TIME_OF_DAY_WORDS {
        text = text.replace(word, "");
        text = text.trim().to_string();
    }
    text = TRAILING_AT_TIME_RE.replace(&text, "").trim().to_string();
    text = TRAILING_CLOCK_RE.replace(&text, "").trim().to_string();

    let result_date = match text.as_str() {
        "today" | "now" | "" => today,
        "tomorrow" => today + Duration::days(1),
        "day after tomorrow" => today + Duration::days(2),
        _ => {
            if let Some(day_name) = text.strip_prefix("next ") {
                match weekday_from_name(day_name.trim(), true) {
                    Some(weekday) => next_occurrence(today, weekday, true),
                    None => match parse_explicit_date(today, &text) {
                        Some(date) => date,
                        None => {
                            return rejected(format!(
                                "Could not understand '{text}'. Please use format YYYY-MM-DD or \
                                 natural language like 'tomorrow', 'next Monday', 'Jan 25'"
                            ));
                        }
                    },
                }
            } else if let Some(day_name) = text.strip_prefix("this ") {
                match weekday_from_name(day_name.trim(), false) {
                    Some(weekday) => next_occurrence(today, weekday, false),
                    None => match parse_explicit_date(today, &text) {
                        Some(date) => date,
                        None => {
                            return rejected(format!(
                                "Could not understand '{text}'. Please use a valid date format."
                            ));
                        }
                    },
                }
            } else {
                match parse_explicit_date(today, &text) {
                    Some(date) => date,
                    None => {
                        return rejected(format!(
                            "Could not understand '{text}'. Please use format YYYY-MM-DD or \
                             natural language like 'tomorrow', 'next Monday'"
                        ));
                    }
                }
            }
        }
    };

    if result_date < today {
        return rejected("Appointment date cannot be in the past. Please choose a future date.");
    }
    if result_date > today + Duration::days(MAX_ADVANCE_DAYS) {
        return rejected("Appointments can only be booked up to 1 year in advance.");
    }

    Ok(result_date.format("%Y-%m-%d").to_string())
}

/// Parse a natural-language time expression into canonical 24-hour `HH:MM`,
/// enforcing business hours.
pub fn parse_natural_time(input: &str) -> FieldResult {
    if input.trim().is_empty() {
        return rejected("Time is required");
    }

    let original = input;
    let text = input.trim().to_lowercase();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    for (period, slot) in TIME_PERIODS {
        if text == *period {
            return Ok((*slot).to_string());
        }
    }

    let normalized = text.replace(' ', "").replace('.', ":");

    if let Some(captures) = AM_PM_RE.captures(&normalized) {
        let hour: u32 = captures[1].parse().unwrap_or(0);
        let minutes = captures.get(2).map_or("00", |m| m.as_str());
        let period = &captures[3];

        let hour = match (period, hour) {
            ("pm", 12) => 12,
            ("pm", h) => h + 12,
            ("am", 12) => 0,
            (_, h) => h,
        };

        return within_business_hours(hour).map(|()| format!("{hour:02}:{minutes}"));
    }

    if let Some(captures) = CLOCK_24H_RE.captures(&normalized) {
        let hour: u32 = captures[1].parse().unwrap_or(u32::MAX);
        let minutes = captures.get(2).map_or("00", |m| m.as_str());

        if hour <= 23 {
            return within_business_hours(hour).map(|()| format!("{hour:02}:{minutes}"));
        }
    }

    rejected(format!(
        "Could not understand '{original}'. Please use format like '2pm', '14:30', or 'afternoon'"
    ))
}

fn within_business_hours(hour: u32) -> Result<(), super::ValidationError> {
    if hour < OPENING_HOUR {
        return Err(super::ValidationError(
            "Appointments are available from 8:00 AM onwards.".to_string(),
        ));
    }
    if hour >= CLOSING_HOUR {
        return Err(super::ValidationError(
            "Appointments are available until 6:00 PM.".to_string(),
        ));
    }
    Ok(())
}

/// `next` references skip today entirely; `this` references count today as a
/// match (offset zero). Abbreviated day names are accepted only for `next`,
/// matching the documented pattern set.
fn weekday_from_name(name: &str, allow_abbreviations: bool) -> Option<Weekday> {
    let weekday = match name {
        "monday" => Weekday::Mon,
        "tuesday" => Weekday::Tue,
        "wednesday" => Weekday::Wed,
        "thursday" => Weekday::Thu,
        "friday" => Weekday::Fri,
        "saturday" => Weekday::Sat,
        "sunday" => Weekday::Sun,
        "mon" | "tue" | "wed" | "thu" | "fri" | "sat" | "sun" if allow_abbreviations => {
            match name {
                "mon" => Weekday::Mon,
                "tue" => Weekday::Tue,
                "wed" => Weekday::Wed,
                "thu" => Weekday::Thu,
                "fri" => Weekday::Fri,
                "sat" => Weekday::Sat,
                _ => Weekday::Sun,
            }
        }
        _ => return None,
    };
    Some(weekday)
}

fn next_occurrence(today: NaiveDate, weekday: Weekday, strictly_after: bool) -> NaiveDate {
    let today_index = today.weekday().num_days_from_monday();
    let target_index = weekday.num_days_from_monday();
    let mut delta = (target_index + 7 - today_index) % 7;
    if delta == 0 && strictly_after {
        delta = 7;
    }
    today + Duration::days(i64::from(delta))
}

/// Explicit date formats, month-day-year ordering preferred: `YYYY-MM-DD`,
/// `M/D[/YYYY]`, `Jan 25`, `January 25 2027`, `25 Jan`. A missing year means
/// the current year; if that lands in the past, the caller's roll-forward
/// rule applies.
fn parse_explicit_date(today: NaiveDate, text: &str) -> Option<NaiveDate> {
    let parsed = parse_date_components(today, text)?;

    // A month/day that already passed this year most likely means next year.
    if parsed < today && parsed.year() == today.year() {
        return parsed.with_year(today.year() + 1).or(Some(parsed));
    }
    Some(parsed)
}

fn parse_date_components(today: NaiveDate, text: &str) -> Option<NaiveDate> {
    if let Some(captures) = ISO_DATE_RE.captures(text) {
        let year: i32 = captures[1].parse().ok()?;
        let month: u32 = captures[2].parse().ok()?;
        let day: u32 = captures[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(captures) = NUMERIC_DATE_RE.captures(text) {
        let month: u32 = captures[1].parse().ok()?;
        let day: u32 = captures[2].parse().ok()?;
        let year = match captures.get(3) {
            Some(raw) => {
                let value: i32 = raw.as_str().parse().ok()?;
                if raw.as_str().len() == 2 { 2000 + value } else { value }
            }
            None => today.year(),
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    // Month-name forms: "jan 25", "january 25, 2027", "25 jan".
    let tokens: Vec<&str> =
        text.split(|ch: char| ch.is_whitespace() || ch == ',').filter(|t| !t.is_empty()).collect();

    match tokens.as_slice() {
        [month_name, day] if month_from_name(month_name).is_some() => {
            let month = month_from_name(month_name)?;
            let day: u32 = day.parse().ok()?;
            NaiveDate::from_ymd_opt(today.year(), month, day)
        }
        [month_name, day, year] if month_from_name(month_name).is_some() => {
            let month = month_from_name(month_name)?;
            let day: u32 = day.parse().ok()?;
            let year: i32 = year.parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        }
        [day, month_name] | [day, month_name, _] if day.chars().all(|ch| ch.is_ascii_digit()) => {
            let month = month_from_name(month_name)?;
            let day: u32 = day.parse().ok()?;
            let year = match tokens.get(2) {
                Some(raw) => raw.parse().ok()?,
                None => today.year(),
            };
            NaiveDate::from_ymd_opt(year, month, day)
        }
        _ => None,
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let month = match name {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration, NaiveDate, Weekday};

    use super::{parse_natural_date_on, parse_natural_time};

    // 2026-08-07 is a Friday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn relative_literals_resolve_against_today() {
        assert_eq!(parse_natural_date_on(today(), "today").unwrap(), "2026-08-07");
        assert_eq!(parse_natural_date_on(today(), "now").unwrap(), "2026-08-07");
        assert_eq!(parse_natural_date_on(today(), "tomorrow").unwrap(), "2026-08-08");
        assert_eq!(parse_natural_date_on(today(), "day after tomorrow").unwrap(), "2026-08-09");
    }

    #[test]
    fn next_weekday_is_strictly_in_the_future() {
        // today is a Friday; "next friday" must jump a full week
        assert_eq!(parse_natural_date_on(today(), "next friday").unwrap(), "2026-08-14");
        assert_eq!(parse_natural_date_on(today(), "next monday").unwrap(), "2026-08-10");
        assert_eq!(parse_natural_date_on(today(), "next mon").unwrap(), "2026-08-10");

        let parsed =
            NaiveDate::parse_from_str(&parse_natural_date_on(today(), "next monday").unwrap(), "%Y-%m-%d")
                .unwrap();
        assert_eq!(parsed.weekday(), Weekday::Mon);
        assert!(parsed > today());
    }

    #[test]
    fn this_weekday_counts_today_as_a_match() {
        assert_eq!(parse_natural_date_on(today(), "this friday").unwrap(), "2026-08-07");
        assert_eq!(parse_natural_date_on(today(), "this sunday").unwrap(), "2026-08-09");
    }

    #[test]
    fn combined_date_time_phrases_degrade_to_the_date() {
        assert_eq!(parse_natural_date_on(today(), "tomorrow afternoon").unwrap(), "2026-08-08");
        assert_eq!(parse_natural_date_on(today(), "tomorrow at 3").unwrap(), "2026-08-08");
        assert_eq!(parse_natural_date_on(today(), "tomorrow 3pm").unwrap(), "2026-08-08");
    }

    #[test]
    fn explicit_formats_parse_month_first() {
        assert_eq!(parse_natural_date_on(today(), "2026-08-20").unwrap(), "2026-08-20");
        assert_eq!(parse_natural_date_on(today(), "8/20").unwrap(), "2026-08-20");
        assert_eq!(parse_natural_date_on(today(), "8/20/2026").unwrap(), "2026-08-20");
        assert_eq!(parse_natural_date_on(today(), "aug 20").unwrap(), "2026-08-20");
        assert_eq!(parse_natural_date_on(today(), "august 20, 2026").unwrap(), "2026-08-20");
        assert_eq!(parse_natural_date_on(today(), "20 aug").unwrap(), "2026-08-20");
    }

    #[test]
    fn same_year_past_dates_roll_forward_one_year() {
        assert_eq!(parse_natural_date_on(today(), "jan 25").unwrap(), "2027-01-25");
        assert_eq!(parse_natural_date_on(today(), "2/14").unwrap(), "2027-02-14");
    }

    #[test]
    fn past_dates_are_rejected() {
        let error = parse_natural_date_on(today(), "2026-08-06").unwrap_err();
        assert!(error.to_string().contains("cannot be in the past"));

        let error = parse_natural_date_on(today(), "2020-01-01").unwrap_err();
        assert!(error.to_string().contains("cannot be in the past"));
    }

    #[test]
    fn dates_beyond_one_year_are_rejected() {
        let just_inside = today() + Duration::days(365);
        assert!(parse_natural_date_on(today(), &just_inside.format("%Y-%m-%d").to_string()).is_ok());

        let error = parse_natural_date_on(today(), "2027-08-09").unwrap_err();
        assert!(error.to_string().contains("up to 1 year in advance"));
    }

    #[test]
    fn unparseable_dates_get_a_format_hint() {
        let error = parse_natural_date_on(today(), "whenever works").unwrap_err();
        assert!(error.to_string().contains("YYYY-MM-DD"));

        let error = parse_natural_date_on(today(), "next whenever").unwrap_err();
        assert!(error.to_string().contains("Could not understand"));
    }

    #[test]
    fn empty_date_is_rejected() {
        assert!(parse_natural_date_on(today(), "").is_err());
        assert!(parse_natural_date_on(today(), "   ").is_err());
    }

    #[test]
    fn am_pm_times_convert_to_24_hour() {
        assert_eq!(parse_natural_time("2pm").unwrap(), "14:00");
        assert_eq!(parse_natural_time("2:30 PM").unwrap(), "14:30");
        assert_eq!(parse_natural_time("2.30pm").unwrap(), "14:30");
        assert_eq!(parse_natural_time("12pm").unwrap(), "12:00");
        assert_eq!(parse_natural_time("9 am").unwrap(), "09:00");
    }

    #[test]
    fn twenty_four_hour_times_pass_through() {
        assert_eq!(parse_natural_time("14:30").unwrap(), "14:30");
        assert_eq!(parse_natural_time("9").unwrap(), "09:00");
        assert_eq!(parse_natural_time("17:59").unwrap(), "17:59");
    }

    #[test]
    fn period_words_map_to_slot_times() {
        assert_eq!(parse_natural_time("morning").unwrap(), "09:00");
        assert_eq!(parse_natural_time("early  morning").unwrap(), "08:00");
        assert_eq!(parse_natural_time("noon").unwrap(), "12:00");
        assert_eq!(parse_natural_time("Afternoon").unwrap(), "14:00");
        assert_eq!(parse_natural_time("late afternoon").unwrap(), "16:00");
        assert_eq!(parse_natural_time("evening").unwrap(), "17:00");
    }

    #[test]
    fn business_hours_are_enforced() {
        let error = parse_natural_time("7am").unwrap_err();
        assert!(error.to_string().contains("from 8:00 AM"));

        let error = parse_natural_time("6:30pm").unwrap_err();
        assert!(error.to_string().contains("until 6:00 PM"));

        let error = parse_natural_time("12am").unwrap_err();
        assert!(error.to_string().contains("from 8:00 AM"));

        assert_eq!(parse_natural_time("8am").unwrap(), "08:00");
        assert!(parse_natural_time("18:00").is_err());
    }

    #[test]
    fn unparseable_times_echo_the_original_input() {
        let error = parse_natural_time("half past whenever").unwrap_err();
        assert!(error.to_string().contains("half past whenever"));
        assert!(parse_natural_time("").is_err());
    }
}
