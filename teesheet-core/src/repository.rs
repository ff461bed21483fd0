use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{Block, Course, Flight, FlightStatus, SeasonalSchedule, StartingHole};
use crate::tee_time::TeeTime;
use crate::BoxError;

/// Read-only access to course configuration.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Tenant-scoped: a course owned by another tenant comes back as `None`.
    async fn get_course(
        &self,
        tenant_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Course>, BoxError>;

    /// The active seasonal schedule covering `date`, with its intervals.
    async fn find_active_schedule(
        &self,
        course_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<SeasonalSchedule>, BoxError>;
}

/// Read-only access to blackout windows.
#[async_trait]
pub trait BlockRepository: Send + Sync {
    /// Every recurring block of the course plus the one-off blocks overlapping
    /// `[window_start, window_end)`, in insertion order.
    async fn find_block_candidates(
        &self,
        course_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Block>, BoxError>;
}

/// Flight persistence. Every query is tenant-scoped.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn get_flight(
        &self,
        tenant_id: Uuid,
        flight_id: Uuid,
    ) -> Result<Option<Flight>, BoxError>;

    /// Non-cancelled flights for `[from, to]`, ordered by date, time, then
    /// creation.
    async fn list_active_flights(
        &self,
        tenant_id: Uuid,
        course_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Flight>, BoxError>;

    /// Sum of players held by non-cancelled flights at one slot-key, read
    /// straight from the primary store.
    async fn count_booked_players(
        &self,
        tenant_id: Uuid,
        course_id: Uuid,
        tee_date: NaiveDate,
        tee_time: TeeTime,
        starting_hole: StartingHole,
    ) -> Result<u32, BoxError>;

    /// Atomically claims the next booking sequence number for the tenant and
    /// year. Numbers are never handed out twice, even to callers holding
    /// different slot locks.
    async fn next_booking_sequence(&self, tenant_id: Uuid, year: i32) -> Result<u32, BoxError>;

    /// Inserts the flight and its players in one transaction. A clashing
    /// booking number fails with [`crate::DuplicateKey`].
    async fn insert_flight(&self, flight: &Flight) -> Result<(), BoxError>;

    /// Rewrites the flight row and its player list in one transaction, but
    /// only while the stored status still equals `expected`. Otherwise fails
    /// with [`crate::StaleWrite`] and changes nothing.
    async fn update_flight(&self, flight: &Flight, expected: FlightStatus) -> Result<(), BoxError>;
}
