use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use teesheet_core::events::EventSink;
use teesheet_core::lock::{with_lock, LockService};
use teesheet_core::numbering::format_booking_number;
use teesheet_core::repository::FlightRepository;
use teesheet_core::{
    Course, CoreError, CoreResult, DuplicateKey, Flight, FlightEventType, FlightStatus, Player,
    PlayerInput, StartingHole, TeeTime, MAX_PLAYERS_PER_SLOT,
};
use teesheet_schedule::{BlockRegistry, CourseDirectory};
use teesheet_shared::models::events::FlightCreatedPayload;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit;
use crate::effects::BookingSideEffect;
use crate::players::validate_players;

pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct BookingSettings {
    /// Lease on the slot lock; bounds how long a crashed holder keeps a slot.
    pub lock_ttl: Duration,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self { lock_ttl: DEFAULT_LOCK_TTL }
    }
}

fn default_holes() -> u8 {
    18
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFlightRequest {
    pub course_id: Uuid,
    pub tee_date: NaiveDate,
    pub tee_time: TeeTime,
    #[serde(default)]
    pub starting_hole: StartingHole,
    #[serde(default = "default_holes")]
    pub holes: u8,
    pub players: Vec<PlayerInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The write path for new flights. Capacity and block checks run under the
/// slot lock against fresh reads; nothing here trusts the tee sheet a caller
/// looked at.
pub struct BookingCoordinator {
    locks: Arc<dyn LockService>,
    directory: CourseDirectory,
    blocks: BlockRegistry,
    flights: Arc<dyn FlightRepository>,
    events: Arc<dyn EventSink>,
    side_effects: Vec<Arc<dyn BookingSideEffect>>,
    settings: BookingSettings,
}

impl BookingCoordinator {
    pub fn new(
        locks: Arc<dyn LockService>,
        directory: CourseDirectory,
        blocks: BlockRegistry,
        flights: Arc<dyn FlightRepository>,
        events: Arc<dyn EventSink>,
        settings: BookingSettings,
    ) -> Self {
        Self {
            locks,
            directory,
            blocks,
            flights,
            events,
            side_effects: Vec::new(),
            settings,
        }
    }

    pub fn with_side_effect(mut self, effect: Arc<dyn BookingSideEffect>) -> Self {
        self.side_effects.push(effect);
        self
    }

    pub async fn create_flight(
        &self,
        tenant_id: Uuid,
        request: CreateFlightRequest,
        actor: Option<&str>,
    ) -> CoreResult<Flight> {
        // Everything that can be rejected without the lock is rejected here.
        validate_players(&request.players)?;
        if request.holes != 9 && request.holes != 18 {
            return Err(CoreError::Validation(format!(
                "holes must be 9 or 18, got {}",
                request.holes
            )));
        }

        let day = self
            .directory
            .resolve_day(tenant_id, request.course_id, request.tee_date)
            .await?;
        if !day.course.is_active {
            return Err(CoreError::Validation(format!(
                "course {} is not taking bookings",
                day.course.name
            )));
        }
        if day.plan.slot_at(request.tee_time).is_none() {
            return Err(CoreError::Validation(format!(
                "{} is not a tee time on {}",
                request.tee_time, request.tee_date
            )));
        }

        let key = teesheet_core::SlotKey {
            course_id: request.course_id,
            tee_date: request.tee_date,
            tee_time: request.tee_time,
            starting_hole: request.starting_hole,
        }
        .lock_key();

        let flight = with_lock(
            self.locks.as_ref(),
            &key,
            self.settings.lock_ttl,
            self.commit(tenant_id, &day.course, request, actor),
        )
        .await
        .inspect_err(|e| {
            if matches!(e, CoreError::SlotLocked) {
                warn!("Booking attempt on busy slot {}", key);
            }
        })?;

        self.run_side_effects(&flight).await;
        Ok(flight)
    }

    /// Runs with the slot lock held.
    async fn commit(
        &self,
        tenant_id: Uuid,
        course: &Course,
        request: CreateFlightRequest,
        actor: Option<&str>,
    ) -> CoreResult<Flight> {
        if let Some(block) = self
            .blocks
            .block_at(course.id, request.tee_date, request.tee_time)
            .await?
        {
            warn!(
                "Rejected booking at {} {} on course {}: blocked by {} ({})",
                request.tee_date,
                request.tee_time,
                course.id,
                block.id,
                block.block_type.as_str()
            );
            return Err(CoreError::Blocked { reason: block.reason });
        }

        let existing = self
            .flights
            .count_booked_players(
                tenant_id,
                course.id,
                request.tee_date,
                request.tee_time,
                request.starting_hole,
            )
            .await
            .map_err(CoreError::internal)?;
        let requested = request.players.len() as u8;
        if existing + u32::from(requested) > u32::from(MAX_PLAYERS_PER_SLOT) {
            let remaining = u32::from(MAX_PLAYERS_PER_SLOT).saturating_sub(existing) as u8;
            info!(
                "Capacity exceeded at {} {} on course {}: requested {}, remaining {}",
                request.tee_date, request.tee_time, course.id, requested, remaining
            );
            return Err(CoreError::CapacityExceeded { requested, remaining });
        }

        let year = request.tee_date.year();
        let sequence = self
            .flights
            .next_booking_sequence(tenant_id, year)
            .await
            .map_err(CoreError::internal)?;
        let booking_number = format_booking_number(year, sequence);

        let now = Utc::now();
        let flight = Flight {
            id: Uuid::new_v4(),
            tenant_id,
            course_id: course.id,
            booking_number,
            tee_date: request.tee_date,
            tee_time: request.tee_time,
            starting_hole: request.starting_hole,
            holes: request.holes,
            status: FlightStatus::Confirmed,
            players: request.players.into_iter().map(Player::from_input).collect(),
            notes: request.notes,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            created_by: actor.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.flights.insert_flight(&flight).await {
            if e.downcast_ref::<DuplicateKey>().is_some() {
                warn!("Booking number {} collided", flight.booking_number);
                return Err(CoreError::DuplicateBookingNumber(flight.booking_number));
            }
            return Err(CoreError::internal(e));
        }

        info!(
            "Booked {} ({} players) at {} {} hole {} on course {}",
            flight.booking_number,
            flight.player_count(),
            flight.tee_date,
            flight.tee_time,
            flight.starting_hole.hole_number(),
            course.id
        );

        let payload = FlightCreatedPayload {
            flight_id: flight.id,
            booking_number: flight.booking_number.clone(),
            course_id: flight.course_id,
            tee_date: flight.tee_date,
            tee_time: flight.tee_time.to_string(),
            starting_hole: flight.starting_hole.hole_number(),
            player_count: flight.player_count(),
            created_at: now.timestamp(),
        };
        audit::record(
            self.events.as_ref(),
            tenant_id,
            flight.id,
            FlightEventType::Created,
            &payload,
            actor,
        )
        .await;

        Ok(flight)
    }

    async fn run_side_effects(&self, flight: &Flight) {
        for effect in &self.side_effects {
            if let Err(e) = effect.on_flight_created(flight).await {
                warn!(
                    "Side effect {} failed for {}: {}",
                    effect.name(),
                    flight.booking_number,
                    e
                );
            }
        }
    }
}
