pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod store;

pub use connection::{connect, connect_with_settings, ping, DbPool};
pub use store::{RepositoryBookingStore, SqlBookingStore};
