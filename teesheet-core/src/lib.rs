pub mod cache;
pub mod events;
pub mod lock;
pub mod memory;
pub mod models;
pub mod numbering;
pub mod repository;
pub mod tee_time;

pub use models::{
    Block, BlockType, Course, DayType, DomainEvent, Flight, FlightEventType, FlightStatus,
    Interval, PlayFormat, Player, PlayerIdentity, PlayerInput, PlayerType, SeasonalSchedule,
    SlotKey, StartingHole, StoredEvent, FLIGHT_AGGREGATE,
};
pub use tee_time::TeeTime;

/// Players allowed on one slot-key, across every flight sharing it.
pub const MAX_PLAYERS_PER_SLOT: u8 = 4;

/// Error type returned by the persistence, lock and event adapters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raised by adapters when an insert hits a unique constraint.
#[derive(Debug, thiserror::Error)]
#[error("duplicate key: {0}")]
pub struct DuplicateKey(pub String);

/// Raised by adapters when a flight update finds the row no longer in the
/// status it was read in.
#[derive(Debug, thiserror::Error)]
#[error("flight {0} was changed by another request")]
pub struct StaleWrite(pub uuid::Uuid);

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("tee time is currently being booked")]
    SlotLocked,

    #[error("Not enough room at this tee time: requested {requested}, remaining {remaining}")]
    CapacityExceeded { requested: u8, remaining: u8 },

    #[error("Booking number already issued: {0}")]
    DuplicateBookingNumber(String),

    #[error("Flight {0} was changed concurrently, reload and retry")]
    ConcurrentUpdate(uuid::Uuid),

    #[error("Tee time is blocked{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Blocked { reason: Option<String> },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: FlightStatus, to: FlightStatus },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal service error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::SlotLocked
                | Self::CapacityExceeded { .. }
                | Self::DuplicateBookingNumber(_)
                | Self::ConcurrentUpdate(_)
        )
    }

    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::Blocked { .. } | Self::InvalidTransition { .. } | Self::Validation(_)
        )
    }

    pub fn remaining_capacity(&self) -> Option<u8> {
        match self {
            Self::CapacityExceeded { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
