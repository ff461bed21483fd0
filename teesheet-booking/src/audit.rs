use serde::Serialize;
use teesheet_core::events::EventSink;
use teesheet_core::{DomainEvent, FlightEventType};
use tracing::{debug, error};
use uuid::Uuid;

/// Appends a flight event without letting a sink failure reach the caller.
/// The state change it describes has already been committed.
pub(crate) async fn record<P: Serialize>(
    events: &dyn EventSink,
    tenant_id: Uuid,
    flight_id: Uuid,
    event_type: FlightEventType,
    payload: &P,
    actor: Option<&str>,
) {
    let event = match DomainEvent::for_flight(tenant_id, flight_id, event_type, payload, actor) {
        Ok(event) => event,
        Err(e) => {
            error!("Failed to encode {} event for flight {}: {}", event_type.as_str(), flight_id, e);
            return;
        }
    };

    match events.append(event).await {
        Ok(stored) => debug!(
            "Recorded {} for flight {} at #{}",
            event_type.as_str(),
            flight_id,
            stored.sequence
        ),
        Err(e) => error!(
            "Failed to append {} event for flight {}: {}",
            event_type.as_str(),
            flight_id,
            e
        ),
    }
}
