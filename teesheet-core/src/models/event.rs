use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const FLIGHT_AGGREGATE: &str = "FLIGHT";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightEventType {
    Created,
    PlayersUpdated,
    Cancelled,
    CheckedIn,
    StatusChanged,
}

impl FlightEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::PlayersUpdated => "PLAYERS_UPDATED",
            Self::Cancelled => "CANCELLED",
            Self::CheckedIn => "CHECKED_IN",
            Self::StatusChanged => "STATUS_CHANGED",
        }
    }
}

/// Immutable audit record. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub actor: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    pub fn for_flight<P: Serialize>(
        tenant_id: Uuid,
        flight_id: Uuid,
        event_type: FlightEventType,
        payload: &P,
        actor: Option<&str>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            aggregate_type: FLIGHT_AGGREGATE.to_string(),
            aggregate_id: flight_id,
            event_type: event_type.as_str().to_string(),
            payload: serde_json::to_value(payload)?,
            actor: actor.map(str::to_string),
            occurred_at: Utc::now(),
        })
    }
}

/// An event after the sink accepted it, with its position in the log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredEvent {
    pub sequence: i64,
    pub event: DomainEvent,
}
