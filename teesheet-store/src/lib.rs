pub mod app_config;
mod codec;
pub mod course_repo;
pub mod database;
pub mod event_store;
pub mod flight_repo;
pub mod redis_repo;

pub use app_config::{BookingRules, Config};
pub use course_repo::PgCourseRepository;
pub use database::DbClient;
pub use event_store::{EventForwarder, EventPublisher, ForwardQueue, PgEventSink};
pub use flight_repo::PgFlightRepository;
pub use redis_repo::RedisClient;
