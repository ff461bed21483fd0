pub mod block;
pub mod course;
pub mod event;
pub mod flight;

pub use block::{Block, BlockType};
pub use course::{Course, DayType, Interval, PlayFormat, SeasonalSchedule};
pub use event::{DomainEvent, FlightEventType, StoredEvent, FLIGHT_AGGREGATE};
pub use flight::{
    CaddyRequest, CartRequest, Flight, FlightStatus, Player, PlayerIdentity, PlayerInput,
    PlayerType, RentalRequest, SlotKey, StartingHole,
};
