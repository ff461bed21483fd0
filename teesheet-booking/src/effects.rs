use async_trait::async_trait;
use teesheet_core::{BoxError, Flight};

/// Post-commit work hung off a new booking, such as generating charge line
/// items. Runs after the booking is durable; a failure is logged and the
/// booking stands.
#[async_trait]
pub trait BookingSideEffect: Send + Sync {
    fn name(&self) -> &str;

    async fn on_flight_created(&self, flight: &Flight) -> Result<(), BoxError>;
}
