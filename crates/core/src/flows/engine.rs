//! The multi-turn booking flow.
//!
//! Drives ordered slot collection, confirmation, field-level editing, and
//! the final save. Validator rejections keep the flow on the same field;
//! persistence failures roll back to confirmation with slots intact so the
//! user never re-enters data; notification failures only soften the success
//! message.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::booking::{BookingId, NewBooking};
use crate::domain::customer::NewCustomer;
use crate::domain::slots::{BookingField, BookingSlots};
use crate::flows::states::{
    edit_menu, field_from_keywords, field_from_selection, field_prompt, BookingState,
    CANCEL_WORDS, CONFIRM_WORDS, EDIT_WORDS,
};
use crate::notify::{BookingConfirmation, ConfirmationNotifier};
use crate::store::BookingStore;
use crate::validators::{
    datetime::{parse_natural_date, parse_natural_time},
    validate_booking_type, validate_email, validate_name, validate_phone, ValidationError,
};

/// Result of one conversational turn through the flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowTurn {
    pub reply: String,
    /// Set only on the turn that persisted a booking.
    pub completed_booking: Option<BookingId>,
}

impl FlowTurn {
    fn reply(text: impl Into<String>) -> Self {
        Self { reply: text.into(), completed_booking: None }
    }
}

pub struct BookingFlow {
    state: BookingState,
    slots: BookingSlots,
    edit_field: Option<BookingField>,
    last_booking_id: Option<BookingId>,
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn ConfirmationNotifier>,
}

impl BookingFlow {
    pub fn new(store: Arc<dyn BookingStore>, notifier: Arc<dyn ConfirmationNotifier>) -> Self {
        Self {
            state: BookingState::Idle,
            slots: BookingSlots::default(),
            edit_field: None,
            last_booking_id: None,
            store,
            notifier,
        }
    }

    pub fn state(&self) -> BookingState {
        self.state
    }

    pub fn slots(&self) -> &BookingSlots {
        &self.slots
    }

    pub fn is_active(&self) -> bool {
        self.state != BookingState::Idle
    }

    pub fn last_booking_id(&self) -> Option<BookingId> {
        self.last_booking_id
    }

    /// Begin a fresh flow: clear slots and prompt for the first field.
    pub fn start(&mut self) -> String {
        self.state = BookingState::Collecting;
        self.slots = BookingSlots::default();
        self.edit_field = None;

        let first_prompt = field_prompt(BookingField::ORDER[0]);
        format!("I'd be happy to help you schedule an appointment!\n\n{first_prompt}")
    }

    /// Process one user turn while the flow is active.
    pub async fn handle_input(&mut self, input: &str) -> FlowTurn {
        let input = input.trim();

        match self.state {
            BookingState::Confirming => self.handle_confirming(input).await,
            BookingState::Editing => self.handle_editing(input),
            BookingState::Collecting => self.handle_collecting(input),
            BookingState::Idle | BookingState::Completed => {
                self.reset();
                FlowTurn::reply("Something went wrong. Let's start over.")
            }
        }
    }

    /// Discard all collected data and return to idle.
    pub fn reset(&mut self) {
        self.state = BookingState::Idle;
        self.slots = BookingSlots::default();
        self.edit_field = None;
    }

    /// One-line progress description for UI display.
    pub fn status_message(&self) -> String {
        match self.state {
            BookingState::Collecting => {
                let total = BookingField::ORDER.len();
                let filled = total - self.slots.missing_fields().len();
                format!("Collecting booking info ({filled}/{total} fields)")
            }
            BookingState::Confirming => "Awaiting confirmation".to_string(),
            BookingState::Editing => "Editing booking details".to_string(),
            BookingState::Completed => "Booking complete".to_string(),
            BookingState::Idle => String::new(),
        }
    }

    fn handle_collecting(&mut self, input: &str) -> FlowTurn {
        let Some(current_field) = self.slots.next_missing() else {
            return FlowTurn::reply(self.show_confirmation());
        };

        match self.validate_and_set(current_field, input) {
            Ok(()) => {
                if self.slots.is_complete() {
                    FlowTurn::reply(self.show_confirmation())
                } else {
                    let next_prompt = self
                        .slots
                        .next_missing()
                        .map(field_prompt)
                        .unwrap_or_else(|| "Please continue.".to_string());
                    FlowTurn::reply(format!("Got it!\n\n{next_prompt}"))
                }
            }
            Err(error) => FlowTurn::reply(format!("{error}\n\nPlease try again:")),
        }
    }

    /// Route the raw value to the validator for this field. The mapping is
    /// exhaustive over `BookingField`, so adding a field without a validator
    /// fails to compile.
    fn validate_and_set(
        &mut self,
        field: BookingField,
        value: &str,
    ) -> Result<(), ValidationError> {
        let canonical = match field {
            BookingField::Name => validate_name(value)?,
            BookingField::Email => validate_email(value)?,
            BookingField::Phone => validate_phone(value)?,
            BookingField::BookingType => validate_booking_type(value)?,
            BookingField::Date => parse_natural_date(value)?,
            BookingField::Time => parse_natural_time(value)?,
        };
        self.slots.set(field, canonical);
        Ok(())
    }

    fn show_confirmation(&mut self) -> String {
        self.state = BookingState::Confirming;

        format!(
            "Please confirm your appointment details:\n\n{}\n\n\
             Is this information correct?\n\
             - Reply \"yes\" or \"confirm\" to book\n\
             - Reply \"no\" or \"edit\" to make changes\n\
             - Reply \"cancel\" to start over",
            self.slots.summary()
        )
    }

    async fn handle_confirming(&mut self, input: &str) -> FlowTurn {
        let response = input.trim().to_lowercase();

        if CONFIRM_WORDS.contains(&response.as_str()) {
            return self.save_booking().await;
        }

        if CANCEL_WORDS.contains(&response.as_str()) {
            self.reset();
            return FlowTurn::reply(
                "Booking cancelled. Let me know if you'd like to schedule an appointment later!",
            );
        }

        if EDIT_WORDS.contains(&response.as_str()) {
            self.state = BookingState::Editing;
            self.edit_field = None;
            return FlowTurn::reply(edit_menu());
        }

        // "change the date" style replies jump straight into editing that
        // field, skipping the menu round-trip.
        if let Some(field) = field_from_keywords(&response) {
            self.edit_field = Some(field);
            self.state = BookingState::Editing;
            return FlowTurn::reply(format!(
                "What would you like to change the {} to?",
                field.label()
            ));
        }

        FlowTurn::reply(
            "I didn't understand that. Please reply 'yes' to confirm, 'edit' to make changes, \
             or 'cancel' to start over.",
        )
    }

    fn handle_editing(&mut self, input: &str) -> FlowTurn {
        if let Some(field) = self.edit_field {
            return match self.validate_and_set(field, input) {
                Ok(()) => {
                    self.edit_field = None;
                    FlowTurn::reply(self.show_confirmation())
                }
                Err(error) => FlowTurn::reply(format!("{error}\n\nPlease try again:")),
            };
        }

        let selection = input.trim().to_lowercase();
        match field_from_selection(&selection) {
            Some(field) => {
                self.edit_field = Some(field);
                let current = self.slots.get(field).unwrap_or("Not set");
                FlowTurn::reply(format!(
                    "Current {}: {current}\n\nWhat would you like to change it to?",
                    field.label()
                ))
            }
            None => FlowTurn::reply(
                "I didn't understand which field you want to edit. Please type the field name \
                 (e.g., 'name', 'email', 'date') or number (1-6):",
            ),
        }
    }

    async fn save_booking(&mut self) -> FlowTurn {
        let (
            Some(name),
            Some(email),
            Some(phone),
            Some(booking_type),
            Some(date),
            Some(time),
        ) = (
            self.slots.name.clone(),
            self.slots.email.clone(),
            self.slots.phone.clone(),
            self.slots.booking_type.clone(),
            self.slots.date.clone(),
            self.slots.time.clone(),
        )
        else {
            // Confirmation is only reachable with complete slots; if we got
            // here anyway, resume collection at the first gap.
            self.state = BookingState::Collecting;
            let prompt = self
                .slots
                .next_missing()
                .map(field_prompt)
                .unwrap_or_else(|| "Please continue.".to_string());
            return FlowTurn::reply(format!("A few details are still missing.\n\n{prompt}"));
        };

        let customer_request =
            NewCustomer { name: name.clone(), email: email.clone(), phone: phone.clone() };

        let (customer, newly_created) =
            match self.store.get_or_create_customer(customer_request).await {
                Ok(found) => found,
                Err(store_error) => return self.persistence_failure(store_error.to_string()),
            };

        let booking_request = NewBooking {
            customer_id: customer.id,
            booking_type: booking_type.clone(),
            date: date.clone(),
            time: time.clone(),
            notes: self.slots.notes.clone(),
        };

        let booking = match self.store.create_booking(booking_request).await {
            Ok(created) => created,
            Err(store_error) => return self.persistence_failure(store_error.to_string()),
        };

        self.last_booking_id = Some(booking.id);
        info!(
            booking_id = booking.id.0,
            customer_id = customer.id.0,
            new_customer = newly_created,
            "booking created"
        );

        let confirmation = BookingConfirmation {
            to_email: email.clone(),
            customer_name: name,
            booking_id: booking.id,
            booking_type,
            date,
            time,
            notes: self.slots.notes.clone(),
        };
        let delivery = self.notifier.send_booking_confirmation(&confirmation).await;

        let mut reply = format!(
            "Appointment booked successfully!\n\nBooking ID: #{}\n\n{}\n\n",
            booking.id.0,
            self.slots.summary()
        );
        if delivery.delivered {
            reply.push_str(&format!("A confirmation email has been sent to {email}."));
        } else {
            warn!(
                booking_id = booking.id.0,
                error = delivery.error.as_deref().unwrap_or("unknown"),
                "confirmation email failed"
            );
            reply.push_str(&format!(
                "Your booking was saved, but we couldn't send the confirmation email. Please \
                 keep your booking ID (#{}) for reference.",
                booking.id.0
            ));
        }
        reply.push_str("\n\nIs there anything else I can help you with?");

        self.state = BookingState::Completed;
        self.reset();

        FlowTurn { reply, completed_booking: Some(booking.id) }
    }

    /// A failed save keeps the flow in confirmation with all slots intact;
    /// the next affirmative reply retries.
    fn persistence_failure(&mut self, message: String) -> FlowTurn {
        error!(error = %message, "saving booking failed");
        self.state = BookingState::Confirming;
        FlowTurn::reply(format!(
            "Sorry, there was a problem saving your booking: {message}\n\n\
             Would you like to try again? (yes/no)"
        ))
    }
}
