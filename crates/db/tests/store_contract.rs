//! Contract tests for the SQLite-backed booking store: schema via the real
//! migrations, get-or-create semantics, booking round-trips.

use medbook_core::domain::booking::{BookingStatus, NewBooking};
use medbook_core::domain::customer::NewCustomer;
use medbook_core::store::{BookingStore, StoreError};

use medbook_db::repositories::{BookingRepository, SqlBookingRepository};
use medbook_db::{connect_with_settings, migrations, DbPool, SqlBookingStore};

async fn prepared_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    pool
}

fn ada() -> NewCustomer {
    NewCustomer {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "5551234567".to_string(),
    }
}

fn dental(customer_id: medbook_core::domain::customer::CustomerId) -> NewBooking {
    NewBooking {
        customer_id,
        booking_type: "Dental Care".to_string(),
        date: "2026-09-01".to_string(),
        time: "14:00".to_string(),
        notes: None,
    }
}

#[tokio::test]
async fn customer_is_created_once_and_reused() {
    let pool = prepared_pool().await;
    let store = SqlBookingStore::new(pool);

    let (created, is_new) = store.get_or_create_customer(ada()).await.expect("create");
    assert!(is_new);
    assert_eq!(created.email, "ada@example.com");

    let (found, is_new) = store
        .get_or_create_customer(NewCustomer {
            name: "Ada King".to_string(),
            email: "Ada@Example.COM".to_string(),
            phone: "5550000000".to_string(),
        })
        .await
        .expect("reuse");
    assert!(!is_new);
    assert_eq!(found.id, created.id);
    assert_eq!(found.name, "Ada King");
    assert_eq!(found.phone, "5550000000");
}

#[tokio::test]
async fn created_booking_is_confirmed_and_listable_by_email() {
    let pool = prepared_pool().await;
    let store = SqlBookingStore::new(pool.clone());

    let (customer, _) = store.get_or_create_customer(ada()).await.expect("create customer");
    let booking = store.create_booking(dental(customer.id)).await.expect("create booking");

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.customer_id, customer.id);
    assert!(booking.id.0 > 0);

    let listed = store.bookings_by_email("ADA@example.com").await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, booking.id);
    assert_eq!(listed[0].booking_type, "Dental Care");

    let repo = SqlBookingRepository::new(pool);
    assert_eq!(repo.count().await.expect("count"), 1);
    let fetched = repo.find_by_id(booking.id).await.expect("fetch").expect("present");
    assert_eq!(fetched.date, "2026-09-01");
    assert_eq!(fetched.time, "14:00");
}

#[tokio::test]
async fn bookings_list_most_recent_date_first() {
    let pool = prepared_pool().await;
    let store = SqlBookingStore::new(pool);

    let (customer, _) = store.get_or_create_customer(ada()).await.expect("create customer");
    for (date, time) in [("2026-09-01", "14:00"), ("2026-10-01", "09:00"), ("2026-09-15", "11:30")]
    {
        store
            .create_booking(NewBooking {
                customer_id: customer.id,
                booking_type: "General Checkup".to_string(),
                date: date.to_string(),
                time: time.to_string(),
                notes: None,
            })
            .await
            .expect("create booking");
    }

    let listed = store.bookings_by_email("ada@example.com").await.expect("list");
    let dates: Vec<&str> = listed.iter().map(|booking| booking.date.as_str()).collect();
    assert_eq!(dates, vec!["2026-10-01", "2026-09-15", "2026-09-01"]);
}

#[tokio::test]
async fn booking_for_missing_customer_is_a_constraint_error() {
    let pool = prepared_pool().await;
    let store = SqlBookingStore::new(pool);

    let error = store
        .create_booking(dental(medbook_core::domain::customer::CustomerId(999)))
        .await
        .expect_err("foreign key must be enforced");
    assert!(matches!(error, StoreError::Constraint(_)), "unexpected error kind: {error:?}");
}

#[tokio::test]
async fn unknown_email_yields_empty_list_not_error() {
    let pool = prepared_pool().await;
    let store = SqlBookingStore::new(pool);

    let listed = store.bookings_by_email("nobody@example.com").await.expect("list");
    assert!(listed.is_empty());
}
