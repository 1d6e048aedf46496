use async_trait::async_trait;
use thiserror::Error;

use medbook_core::domain::booking::{Booking, BookingId, NewBooking};
use medbook_core::domain::customer::{Customer, CustomerId, NewCustomer};

pub mod booking;
pub mod customer;
pub mod memory;

pub use booking::SqlBookingRepository;
pub use customer::SqlCustomerRepository;
pub use memory::{InMemoryBookingRepository, InMemoryCustomerRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Emails are stored normalized to lowercase; lookups normalize too.
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError>;

    async fn insert(&self, customer: NewCustomer) -> Result<Customer, RepositoryError>;

    /// Refresh name/phone for an existing customer record.
    async fn update_contact(
        &self,
        id: CustomerId,
        name: &str,
        phone: &str,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: NewBooking) -> Result<Booking, RepositoryError>;

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, RepositoryError>;

    /// All bookings for one customer, most recent date first.
    async fn list_for_customer(&self, id: CustomerId) -> Result<Vec<Booking>, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}
