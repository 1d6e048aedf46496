pub mod config;
pub mod domain;
pub mod flows;
pub mod intent;
pub mod notify;
pub mod store;
pub mod validators;

pub use domain::booking::{
    AppointmentType, Booking, BookingId, BookingStatus, NewBooking, UnknownBookingStatus,
};
pub use domain::customer::{Customer, CustomerId, NewCustomer};
pub use domain::slots::{BookingField, BookingSlots};
pub use flows::{BookingFlow, BookingState, FlowTurn};
pub use intent::Intent;
pub use notify::{BookingConfirmation, ConfirmationNotifier, DeliveryOutcome};
pub use store::{BookingStore, StoreError};
pub use validators::ValidationError;
