//! [`BookingStore`] adapter over the customer/booking repositories.
//!
//! This is the persistence seam the conversation core sees: get-or-create a
//! customer keyed by email, create a booking, list bookings for lookups.
//! Repository errors are folded into [`StoreError`] kinds so the core can
//! distinguish connectivity trouble from constraint violations.

use async_trait::async_trait;
use tracing::warn;

use medbook_core::domain::booking::{Booking, NewBooking};
use medbook_core::domain::customer::{Customer, NewCustomer};
use medbook_core::store::{BookingStore, StoreError};

use crate::repositories::{
    BookingRepository, CustomerRepository, RepositoryError, SqlBookingRepository,
    SqlCustomerRepository,
};
use crate::DbPool;

pub struct RepositoryBookingStore<C, B> {
    customers: C,
    bookings: B,
}

/// The production store backed by SQLite.
pub type SqlBookingStore = RepositoryBookingStore<SqlCustomerRepository, SqlBookingRepository>;

impl SqlBookingStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            customers: SqlCustomerRepository::new(pool.clone()),
            bookings: SqlBookingRepository::new(pool),
        }
    }
}

impl<C, B> RepositoryBookingStore<C, B>
where
    C: CustomerRepository,
    B: BookingRepository,
{
    pub fn from_repositories(customers: C, bookings: B) -> Self {
        Self { customers, bookings }
    }
}

#[async_trait]
impl<C, B> BookingStore for RepositoryBookingStore<C, B>
where
    C: CustomerRepository,
    B: BookingRepository,
{
    async fn get_or_create_customer(
        &self,
        customer: NewCustomer,
    ) -> Result<(Customer, bool), StoreError> {
        let email = customer.email.to_lowercase();

        if let Some(existing) = self.customers.find_by_email(&email).await.map_err(store_error)? {
            // Refresh contact details; a failed refresh must not block the
            // booking, the stale values are still usable.
            if let Err(error) =
                self.customers.update_contact(existing.id, &customer.name, &customer.phone).await
            {
                warn!(customer_id = existing.id.0, error = %error, "customer contact refresh failed");
            }
            let refreshed = Customer {
                name: customer.name,
                phone: customer.phone,
                ..existing
            };
            return Ok((refreshed, false));
        }

        match self.customers.insert(customer.clone()).await {
            Ok(created) => Ok((created, true)),
            Err(insert_error) => {
                // Lost a create race: another writer inserted this email
                // between our lookup and insert. Fetch theirs.
                if let Ok(Some(existing)) = self.customers.find_by_email(&email).await {
                    return Ok((existing, false));
                }
                Err(store_error(insert_error))
            }
        }
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        self.bookings.insert(booking).await.map_err(store_error)
    }

    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, StoreError> {
        let Some(customer) = self.customers.find_by_email(email).await.map_err(store_error)?
        else {
            return Ok(Vec::new());
        };

        self.bookings.list_for_customer(customer.id).await.map_err(store_error)
    }
}

fn store_error(error: RepositoryError) -> StoreError {
    match error {
        RepositoryError::Database(sqlx_error) => match &sqlx_error {
            sqlx::Error::Database(db_error) => {
                use sqlx::error::ErrorKind;
                match db_error.kind() {
                    ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation => StoreError::Constraint(db_error.to_string()),
                    _ => StoreError::Backend(sqlx_error.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Connectivity(sqlx_error.to_string())
            }
            _ => StoreError::Backend(sqlx_error.to_string()),
        },
        RepositoryError::Decode(message) => StoreError::Backend(message),
    }
}

#[cfg(test)]
mod tests {
    use medbook_core::domain::booking::NewBooking;
    use medbook_core::domain::customer::NewCustomer;
    use medbook_core::store::BookingStore;

    use crate::repositories::{InMemoryBookingRepository, InMemoryCustomerRepository};

    use super::RepositoryBookingStore;

    fn memory_store(
    ) -> RepositoryBookingStore<InMemoryCustomerRepository, InMemoryBookingRepository> {
        RepositoryBookingStore::from_repositories(
            InMemoryCustomerRepository::default(),
            InMemoryBookingRepository::default(),
        )
    }

    fn ada() -> NewCustomer {
        NewCustomer {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "5551234567".to_string(),
        }
    }

    #[tokio::test]
    async fn get_or_create_returns_new_then_existing() {
        let store = memory_store();

        let (created, is_new) = store.get_or_create_customer(ada()).await.expect("create");
        assert!(is_new);

        let (found, is_new) = store
            .get_or_create_customer(NewCustomer {
                name: "Ada King".to_string(),
                email: "ADA@example.com".to_string(),
                phone: "5559999999".to_string(),
            })
            .await
            .expect("find");
        assert!(!is_new);
        assert_eq!(found.id, created.id);
        // contact details refreshed from the latest request
        assert_eq!(found.name, "Ada King");
        assert_eq!(found.phone, "5559999999");
    }

    #[tokio::test]
    async fn bookings_round_trip_by_email() {
        let store = memory_store();
        let (customer, _) = store.get_or_create_customer(ada()).await.expect("create");

        store
            .create_booking(NewBooking {
                customer_id: customer.id,
                booking_type: "Dental Care".to_string(),
                date: "2026-09-01".to_string(),
                time: "14:00".to_string(),
                notes: None,
            })
            .await
            .expect("first booking");
        store
            .create_booking(NewBooking {
                customer_id: customer.id,
                booking_type: "Lab Tests".to_string(),
                date: "2026-09-15".to_string(),
                time: "09:00".to_string(),
                notes: Some("fasting required".to_string()),
            })
            .await
            .expect("second booking");

        let bookings = store.bookings_by_email("ada@example.com").await.expect("list");
        assert_eq!(bookings.len(), 2);
        // most recent date first
        assert_eq!(bookings[0].date, "2026-09-15");
        assert_eq!(bookings[1].booking_type, "Dental Care");
    }

    #[tokio::test]
    async fn unknown_email_lists_nothing() {
        let store = memory_store();
        let bookings = store.bookings_by_email("nobody@example.com").await.expect("list");
        assert!(bookings.is_empty());
    }
}
