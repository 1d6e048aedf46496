//! Notification collaborator interface.
//!
//! Confirmation delivery is best-effort: a failed send must never fail the
//! booking it confirms, so implementations report through
//! [`DeliveryOutcome`] instead of an error type.

use async_trait::async_trait;

use crate::domain::booking::BookingId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingConfirmation {
    pub to_email: String,
    pub customer_name: String,
    pub booking_id: BookingId,
    pub booking_type: String,
    pub date: String,
    pub time: String,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub delivered: bool,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered() -> Self {
        Self { delivered: true, error: None }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self { delivered: false, error: Some(reason.into()) }
    }
}

#[async_trait]
pub trait ConfirmationNotifier: Send + Sync {
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> DeliveryOutcome;
}
