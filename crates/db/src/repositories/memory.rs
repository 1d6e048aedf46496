//! In-memory repository implementations for tests and offline tooling.

use std::sync::Mutex;

use medbook_core::domain::booking::{Booking, BookingId, BookingStatus, NewBooking};
use medbook_core::domain::customer::{Customer, CustomerId, NewCustomer};

use super::{BookingRepository, CustomerRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: Mutex<Vec<Customer>>,
    next_id: Mutex<i64>,
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        let email = email.to_lowercase();
        Ok(self
            .customers
            .lock()
            .expect("customer lock")
            .iter()
            .find(|customer| customer.email == email)
            .cloned())
    }

    async fn insert(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let email = customer.email.to_lowercase();
        let mut customers = self.customers.lock().expect("customer lock");
        if customers.iter().any(|existing| existing.email == email) {
            return Err(RepositoryError::Decode(format!(
                "UNIQUE constraint failed: customers.email ({email})"
            )));
        }

        let mut next_id = self.next_id.lock().expect("id lock");
        *next_id += 1;
        let record = Customer {
            id: CustomerId(*next_id),
            name: customer.name,
            email,
            phone: customer.phone,
            created_at: None,
        };
        customers.push(record.clone());
        Ok(record)
    }

    async fn update_contact(
        &self,
        id: CustomerId,
        name: &str,
        phone: &str,
    ) -> Result<(), RepositoryError> {
        let mut customers = self.customers.lock().expect("customer lock");
        if let Some(customer) = customers.iter_mut().find(|customer| customer.id == id) {
            customer.name = name.to_string();
            customer.phone = phone.to_string();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: Mutex<Vec<Booking>>,
    next_id: Mutex<i64>,
}

#[async_trait::async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, booking: NewBooking) -> Result<Booking, RepositoryError> {
        let mut next_id = self.next_id.lock().expect("id lock");
        *next_id += 1;
        let record = Booking {
            id: BookingId(*next_id),
            customer_id: booking.customer_id,
            booking_type: booking.booking_type,
            date: booking.date,
            time: booking.time,
            status: BookingStatus::Confirmed,
            notes: booking.notes,
            created_at: None,
        };
        self.bookings.lock().expect("booking lock").push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        Ok(self
            .bookings
            .lock()
            .expect("booking lock")
            .iter()
            .find(|booking| booking.id == id)
            .cloned())
    }

    async fn list_for_customer(&self, id: CustomerId) -> Result<Vec<Booking>, RepositoryError> {
        let mut matching: Vec<Booking> = self
            .bookings
            .lock()
            .expect("booking lock")
            .iter()
            .filter(|booking| booking.customer_id == id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| (&b.date, &b.time).cmp(&(&a.date, &a.time)));
        Ok(matching)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(self.bookings.lock().expect("booking lock").len() as i64)
    }
}
