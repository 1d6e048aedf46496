pub mod engine;
pub mod states;

pub use engine::{BookingFlow, FlowTurn};
pub use states::BookingState;
