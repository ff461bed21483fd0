use chrono::{DateTime, Utc};
use std::sync::Arc;
use teesheet_core::events::EventSink;
use teesheet_core::lock::{with_lock, LockService};
use teesheet_core::repository::FlightRepository;
use teesheet_core::{
    CoreError, CoreResult, Flight, FlightEventType, FlightStatus, Player, PlayerInput, StaleWrite,
    StoredEvent, FLIGHT_AGGREGATE, MAX_PLAYERS_PER_SLOT,
};
use teesheet_shared::models::events::{
    FlightCancelledPayload, FlightCheckedInPayload, PlayersUpdatedPayload, StatusChangedPayload,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit;
use crate::coordinator::BookingSettings;
use crate::players::validate_players;

fn invalid(from: FlightStatus, to: FlightStatus) -> CoreError {
    CoreError::InvalidTransition { from, to }
}

/// Swaps the player list. Only bookings that have not started may change
/// their party. Returns the previous head count.
pub fn apply_players(flight: &mut Flight, players: Vec<PlayerInput>, now: DateTime<Utc>) -> CoreResult<u8> {
    if !matches!(flight.status, FlightStatus::Pending | FlightStatus::Confirmed) {
        return Err(CoreError::Validation(format!(
            "players cannot change on a {} flight",
            flight.status
        )));
    }
    validate_players(&players)?;

    let previous = flight.player_count();
    flight.players = players.into_iter().map(Player::from_input).collect();
    flight.updated_at = now;
    Ok(previous)
}

/// Marks the flight cancelled. The row stays; its players stop counting
/// against the slot.
pub fn apply_cancel(
    flight: &mut Flight,
    reason: Option<String>,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<FlightStatus> {
    let previous = flight.status;
    if !previous.can_transition_to(FlightStatus::Cancelled) {
        return Err(invalid(previous, FlightStatus::Cancelled));
    }
    flight.status = FlightStatus::Cancelled;
    flight.cancelled_at = Some(now);
    flight.cancelled_by = actor.map(str::to_string);
    flight.cancellation_reason = reason;
    flight.updated_at = now;
    Ok(previous)
}

/// Checks in the whole party at once.
pub fn apply_check_in(flight: &mut Flight, now: DateTime<Utc>) -> CoreResult<u8> {
    if flight.status != FlightStatus::Confirmed {
        return Err(invalid(flight.status, FlightStatus::CheckedIn));
    }
    flight.status = FlightStatus::CheckedIn;
    for player in &mut flight.players {
        player.checked_in = true;
        player.checked_in_at = Some(now);
    }
    flight.updated_at = now;
    Ok(flight.player_count())
}

pub fn apply_transition(flight: &mut Flight, to: FlightStatus, now: DateTime<Utc>) -> CoreResult<FlightStatus> {
    let from = flight.status;
    if !from.can_transition_to(to) {
        return Err(invalid(from, to));
    }
    flight.status = to;
    flight.updated_at = now;
    Ok(from)
}

/// Post-creation changes to a flight, keyed by flight id. Each write is
/// conditional on the status it was read in. Only a party that grows takes
/// the slot lock.
#[derive(Clone)]
pub struct FlightLifecycle {
    flights: Arc<dyn FlightRepository>,
    events: Arc<dyn EventSink>,
    locks: Arc<dyn LockService>,
    settings: BookingSettings,
}

impl FlightLifecycle {
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        events: Arc<dyn EventSink>,
        locks: Arc<dyn LockService>,
        settings: BookingSettings,
    ) -> Self {
        Self { flights, events, locks, settings }
    }

    pub async fn get_flight(&self, tenant_id: Uuid, flight_id: Uuid) -> CoreResult<Flight> {
        self.flights
            .get_flight(tenant_id, flight_id)
            .await
            .map_err(CoreError::internal)?
            .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_id)))
    }

    /// The flight's audit trail, oldest first.
    pub async fn history(&self, tenant_id: Uuid, flight_id: Uuid) -> CoreResult<Vec<StoredEvent>> {
        self.get_flight(tenant_id, flight_id).await?;
        self.events
            .events_for_aggregate(tenant_id, FLIGHT_AGGREGATE, flight_id)
            .await
            .map_err(CoreError::internal)
    }

    pub async fn update_players(
        &self,
        tenant_id: Uuid,
        flight_id: Uuid,
        players: Vec<PlayerInput>,
        actor: Option<&str>,
    ) -> CoreResult<Flight> {
        let mut flight = self.get_flight(tenant_id, flight_id).await?;
        let read_status = flight.status;
        let now = Utc::now();
        let previous_count = apply_players(&mut flight, players, now)?;
        if flight.player_count() > previous_count {
            let key = flight.slot_key().lock_key();
            with_lock(
                self.locks.as_ref(),
                &key,
                self.settings.lock_ttl,
                self.save_grown_party(&flight, read_status),
            )
            .await?;
        } else {
            self.save(&flight, read_status).await?;
        }

        info!(
            "Flight {} now has {} players (was {})",
            flight.booking_number,
            flight.player_count(),
            previous_count
        );
        let payload = PlayersUpdatedPayload {
            flight_id,
            previous_count,
            player_count: flight.player_count(),
            updated_at: now.timestamp(),
        };
        audit::record(self.events.as_ref(), tenant_id, flight_id, FlightEventType::PlayersUpdated, &payload, actor)
            .await;
        Ok(flight)
    }

    pub async fn cancel(
        &self,
        tenant_id: Uuid,
        flight_id: Uuid,
        reason: Option<String>,
        actor: Option<&str>,
    ) -> CoreResult<Flight> {
        let mut flight = self.get_flight(tenant_id, flight_id).await?;
        let now = Utc::now();
        let previous = apply_cancel(&mut flight, reason, actor, now)?;
        self.save(&flight, previous).await?;

        info!("Cancelled flight {} (was {})", flight.booking_number, previous);
        let payload = FlightCancelledPayload {
            flight_id,
            previous_status: previous.as_str().to_string(),
            reason: flight.cancellation_reason.clone(),
            cancelled_at: now.timestamp(),
        };
        audit::record(self.events.as_ref(), tenant_id, flight_id, FlightEventType::Cancelled, &payload, actor).await;
        Ok(flight)
    }

    pub async fn check_in(&self, tenant_id: Uuid, flight_id: Uuid, actor: Option<&str>) -> CoreResult<Flight> {
        let mut flight = self.get_flight(tenant_id, flight_id).await?;
        let now = Utc::now();
        let players_checked_in = apply_check_in(&mut flight, now)?;
        self.save(&flight, FlightStatus::Confirmed).await?;

        info!("Checked in flight {} ({} players)", flight.booking_number, players_checked_in);
        let payload = FlightCheckedInPayload {
            flight_id,
            players_checked_in,
            checked_in_at: now.timestamp(),
        };
        audit::record(self.events.as_ref(), tenant_id, flight_id, FlightEventType::CheckedIn, &payload, actor).await;
        Ok(flight)
    }

    /// CHECKED_IN to IN_PROGRESS.
    pub async fn start_play(&self, tenant_id: Uuid, flight_id: Uuid, actor: Option<&str>) -> CoreResult<Flight> {
        self.transition(tenant_id, flight_id, FlightStatus::InProgress, actor).await
    }

    /// IN_PROGRESS to COMPLETED.
    pub async fn complete(&self, tenant_id: Uuid, flight_id: Uuid, actor: Option<&str>) -> CoreResult<Flight> {
        self.transition(tenant_id, flight_id, FlightStatus::Completed, actor).await
    }

    pub async fn mark_no_show(&self, tenant_id: Uuid, flight_id: Uuid, actor: Option<&str>) -> CoreResult<Flight> {
        self.transition(tenant_id, flight_id, FlightStatus::NoShow, actor).await
    }

    async fn transition(
        &self,
        tenant_id: Uuid,
        flight_id: Uuid,
        to: FlightStatus,
        actor: Option<&str>,
    ) -> CoreResult<Flight> {
        let mut flight = self.get_flight(tenant_id, flight_id).await?;
        let now = Utc::now();
        let from = apply_transition(&mut flight, to, now)?;
        self.save(&flight, from).await?;

        info!("Flight {} moved {} -> {}", flight.booking_number, from, to);
        let payload = StatusChangedPayload {
            flight_id,
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
            changed_at: now.timestamp(),
        };
        audit::record(self.events.as_ref(), tenant_id, flight_id, FlightEventType::StatusChanged, &payload, actor)
            .await;
        Ok(flight)
    }

    /// Runs with the slot lock held. The party's own stored players are
    /// re-read so only the other flights at the slot count against it.
    async fn save_grown_party(&self, flight: &Flight, read_status: FlightStatus) -> CoreResult<()> {
        let stored = self.get_flight(flight.tenant_id, flight.id).await?;
        if stored.status != read_status {
            return Err(CoreError::ConcurrentUpdate(flight.id));
        }

        let booked = self
            .flights
            .count_booked_players(
                flight.tenant_id,
                flight.course_id,
                flight.tee_date,
                flight.tee_time,
                flight.starting_hole,
            )
            .await
            .map_err(CoreError::internal)?;
        let others = booked.saturating_sub(u32::from(stored.player_count()));
        let remaining = u32::from(MAX_PLAYERS_PER_SLOT).saturating_sub(others);
        let requested = flight.player_count();
        if u32::from(requested) > remaining {
            info!(
                "Flight {} cannot grow to {} players: {} left at {} {}",
                flight.booking_number, requested, remaining, flight.tee_date, flight.tee_time
            );
            return Err(CoreError::CapacityExceeded {
                requested,
                remaining: remaining as u8,
            });
        }

        self.save(flight, read_status).await
    }

    async fn save(&self, flight: &Flight, expected: FlightStatus) -> CoreResult<()> {
        self.flights.update_flight(flight, expected).await.map_err(|e| {
            if e.downcast_ref::<StaleWrite>().is_some() {
                warn!("Flight {} changed underneath a {} write", flight.booking_number, flight.status);
                CoreError::ConcurrentUpdate(flight.id)
            } else {
                CoreError::internal(e)
            }
        })
    }
}
