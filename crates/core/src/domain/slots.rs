use serde::{Deserialize, Serialize};

/// Identifier for one collectable booking field, in canonical collection
/// order. Using a closed enum (rather than string keys) makes the
/// field-to-validator and field-to-prompt mappings exhaustive at compile
/// time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingField {
    Name,
    Email,
    Phone,
    BookingType,
    Date,
    Time,
}

impl BookingField {
    /// Collection order doubles as prompt order: the next prompt is always
    /// the first still-missing field in this sequence.
    pub const ORDER: [BookingField; 6] =
        [Self::Name, Self::Email, Self::Phone, Self::BookingType, Self::Date, Self::Time];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::BookingType => "appointment type",
            Self::Date => "date",
            Self::Time => "time",
        }
    }
}

/// The working record of a booking conversation. Each field is either unset
/// or holds a validator-approved canonical value, never raw user text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSlots {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub booking_type: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

impl BookingSlots {
    pub fn get(&self, field: BookingField) -> Option<&str> {
        match field {
            BookingField::Name => self.name.as_deref(),
            BookingField::Email => self.email.as_deref(),
            BookingField::Phone => self.phone.as_deref(),
            BookingField::BookingType => self.booking_type.as_deref(),
            BookingField::Date => self.date.as_deref(),
            BookingField::Time => self.time.as_deref(),
        }
    }

    pub fn set(&mut self, field: BookingField, value: String) {
        let slot = match field {
            BookingField::Name => &mut self.name,
            BookingField::Email => &mut self.email,
            BookingField::Phone => &mut self.phone,
            BookingField::BookingType => &mut self.booking_type,
            BookingField::Date => &mut self.date,
            BookingField::Time => &mut self.time,
        };
        *slot = Some(value);
    }

    pub fn missing_fields(&self) -> Vec<BookingField> {
        BookingField::ORDER.into_iter().filter(|field| self.get(*field).is_none()).collect()
    }

    pub fn next_missing(&self) -> Option<BookingField> {
        BookingField::ORDER.into_iter().find(|field| self.get(*field).is_none())
    }

    pub fn is_complete(&self) -> bool {
        self.next_missing().is_none()
    }

    /// Human-readable summary of everything collected so far, in collection
    /// order, notes last.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        if let Some(name) = &self.name {
            lines.push(format!("Name: {name}"));
        }
        if let Some(email) = &self.email {
            lines.push(format!("Email: {email}"));
        }
        if let Some(phone) = &self.phone {
            lines.push(format!("Phone: {phone}"));
        }
        if let Some(booking_type) = &self.booking_type {
            lines.push(format!("Appointment Type: {booking_type}"));
        }
        if let Some(date) = &self.date {
            lines.push(format!("Date: {date}"));
        }
        if let Some(time) = &self.time {
            lines.push(format!("Time: {time}"));
        }
        if let Some(notes) = &self.notes {
            lines.push(format!("Notes: {notes}"));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::{BookingField, BookingSlots};

    #[test]
    fn missing_fields_follow_collection_order() {
        let mut slots = BookingSlots::default();
        assert_eq!(slots.missing_fields(), BookingField::ORDER.to_vec());
        assert_eq!(slots.next_missing(), Some(BookingField::Name));

        slots.set(BookingField::Name, "Ada Lovelace".to_string());
        slots.set(BookingField::Phone, "5551234567".to_string());
        assert_eq!(slots.next_missing(), Some(BookingField::Email));
        assert_eq!(
            slots.missing_fields(),
            vec![BookingField::Email, BookingField::BookingType, BookingField::Date,
                BookingField::Time]
        );
    }

    #[test]
    fn complete_slots_summarize_every_field() {
        let slots = BookingSlots {
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            phone: Some("5551234567".to_string()),
            booking_type: Some("Dental Care".to_string()),
            date: Some("2026-09-01".to_string()),
            time: Some("14:00".to_string()),
            notes: None,
        };
        assert!(slots.is_complete());

        let summary = slots.summary();
        for expected in
            ["Ada Lovelace", "ada@example.com", "5551234567", "Dental Care", "2026-09-01", "14:00"]
        {
            assert!(summary.contains(expected), "summary missing {expected}: {summary}");
        }
    }

    #[test]
    fn notes_do_not_count_toward_completeness() {
        let mut slots = BookingSlots { notes: Some("wheelchair access".to_string()), ..Default::default() };
        assert!(!slots.is_complete());
        for field in BookingField::ORDER {
            slots.set(field, "x".to_string());
        }
        assert!(slots.is_complete());
        assert!(slots.summary().contains("Notes: wheelchair access"));
    }
}
