//! Persistence collaborator interface.
//!
//! The booking flow constructs validated creation requests and delegates
//! here; it never touches storage directly. Implementations must report
//! failures with a distinguishable kind rather than silently returning
//! empty data.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::booking::{Booking, NewBooking};
use crate::domain::customer::{Customer, NewCustomer};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend unreachable: {0}")]
    Connectivity(String),
    #[error("storage constraint violated: {0}")]
    Constraint(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Look up a customer by normalized email, creating one if absent.
    /// Existing customers get their name/phone refreshed from the request.
    /// Returns the record and whether it was newly created.
    async fn get_or_create_customer(
        &self,
        customer: NewCustomer,
    ) -> Result<(Customer, bool), StoreError>;

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, StoreError>;

    /// All bookings for the customer with this email, most recent date first.
    /// An unknown email yields an empty list, not an error.
    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, StoreError>;
}
