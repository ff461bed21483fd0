mod audit;
pub mod coordinator;
pub mod effects;
pub mod lifecycle;
pub mod players;

pub use coordinator::{BookingCoordinator, BookingSettings, CreateFlightRequest};
pub use effects::BookingSideEffect;
pub use lifecycle::FlightLifecycle;
