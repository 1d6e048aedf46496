//! Utterance-level intent classification.
//!
//! Stateless, pattern-based routing. An active booking flow takes absolute
//! priority: once the user is mid-flow, every utterance belongs to the flow
//! regardless of incidental keyword overlap. The pattern sets below are the
//! whole grammar; they are deliberately literal lists rather than scattered
//! inline matches.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Booking,
    BookingEdit,
    General,
    Greeting,
    Lookup,
    Help,
}

const GREETING_PREFIXES: &[&str] =
    &["hi", "hello", "hey", "good morning", "good afternoon", "good evening", "howdy"];

/// Greetings longer than this many words are treated as a real request
/// ("hi, can I book an appointment" is a booking, not a greeting).
const GREETING_MAX_WORDS: usize = 3;

const HELP_PATTERNS: &[&str] =
    &["help", "what can you do", "how to use", "how does this work", "options", "menu"];

const LOOKUP_PATTERNS: &[&str] =
    &["my appointments", "my bookings", "check my", "find my", "lookup", "look up"];

const BOOKING_PATTERNS: &[&str] = &[
    "book",
    "schedule",
    "appointment",
    "reserve",
    "make an appointment",
    "i want to",
    "i need to",
    "can i get",
    "set up",
    "arrange",
    "see a doctor",
    "visit",
    "consultation",
    "checkup",
    "check-up",
];

/// Classify one utterance. `booking_active` reflects whether a booking flow
/// is currently mid-conversation for this session.
pub fn classify(message: &str, booking_active: bool) -> Intent {
    let message = message.trim().to_lowercase();

    if booking_active {
        return Intent::Booking;
    }

    if GREETING_PREFIXES.iter().any(|prefix| message.starts_with(prefix))
        && message.split_whitespace().count() <= GREETING_MAX_WORDS
    {
        return Intent::Greeting;
    }

    if HELP_PATTERNS.iter().any(|pattern| message.contains(pattern)) {
        return Intent::Help;
    }

    if LOOKUP_PATTERNS.iter().any(|pattern| message.contains(pattern)) {
        return Intent::Lookup;
    }

    if BOOKING_PATTERNS.iter().any(|pattern| message.contains(pattern)) {
        return Intent::Booking;
    }

    Intent::General
}
