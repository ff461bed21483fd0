use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use teesheet_core::repository::FlightRepository;
use teesheet_core::{
    CoreError, CoreResult, Flight, FlightStatus, PlayerType, StartingHole, TeeTime,
    MAX_PLAYERS_PER_SLOT,
};
use tracing::debug;
use uuid::Uuid;

use crate::blocks::{find_block_for_time, BlockInfo, BlockRegistry};
use crate::directory::CourseDirectory;

/// Longest date range the week view will project in one call.
pub const MAX_RANGE_DAYS: u32 = 31;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotPlayer {
    pub flight_id: Uuid,
    pub position: u8,
    pub player_type: PlayerType,
    pub checked_in: bool,
}

/// One flight's share of a slot, for showing booking groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingGroup {
    pub flight_id: Uuid,
    pub booking_number: String,
    pub status: FlightStatus,
    pub player_count: u8,
    pub notes: Option<String>,
}

/// Every flight sharing a slot-key, merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedBooking {
    pub total_players: u8,
    pub remaining_capacity: u8,
    pub players: Vec<SlotPlayer>,
    pub groups: Vec<BookingGroup>,
}

impl AggregatedBooking {
    fn from_flights(flights: &[&Flight]) -> Self {
        let players: Vec<SlotPlayer> = flights
            .iter()
            .flat_map(|flight| {
                flight.players.iter().map(|p| SlotPlayer {
                    flight_id: flight.id,
                    position: p.position,
                    player_type: p.player_type(),
                    checked_in: p.checked_in,
                })
            })
            .collect();
        let groups = flights
            .iter()
            .map(|flight| BookingGroup {
                flight_id: flight.id,
                booking_number: flight.booking_number.clone(),
                status: flight.status,
                player_count: flight.player_count(),
                notes: flight.notes.clone(),
            })
            .collect();
        let total = players.len().min(u8::MAX as usize) as u8;
        Self {
            total_players: total,
            remaining_capacity: MAX_PLAYERS_PER_SLOT.saturating_sub(total),
            players,
            groups,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeeSheetSlot {
    pub time: TeeTime,
    pub starting_hole: StartingHole,
    pub is_prime_time: bool,
    pub available: bool,
    pub blocked: bool,
    pub block_info: Option<BlockInfo>,
    pub aggregated_booking: Option<AggregatedBooking>,
}

/// A booked player placed on the grid. Columns are filled in booking order,
/// so they need not match the player's position inside their own flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupiedPosition {
    pub flight_id: Uuid,
    pub booking_number: String,
    pub player_position: u8,
    pub player_type: PlayerType,
    pub checked_in: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotOccupancy {
    pub time: TeeTime,
    pub starting_hole: StartingHole,
    pub positions: [Option<OccupiedPosition>; MAX_PLAYERS_PER_SLOT as usize],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOccupancy {
    pub date: NaiveDate,
    pub booked_players: u32,
    pub slots: Vec<SlotOccupancy>,
}

type SlotFlights<'a> = HashMap<(TeeTime, StartingHole), Vec<&'a Flight>>;

fn group_by_slot(flights: &[Flight]) -> SlotFlights<'_> {
    let mut grouped: SlotFlights<'_> = HashMap::new();
    for flight in flights {
        grouped
            .entry((flight.tee_time, flight.starting_hole))
            .or_default()
            .push(flight);
    }
    grouped
}

fn occupancy_for(time: TeeTime, starting_hole: StartingHole, flights: &[&Flight]) -> SlotOccupancy {
    let mut positions: [Option<OccupiedPosition>; MAX_PLAYERS_PER_SLOT as usize] = Default::default();
    let mut columns = positions.iter_mut();

    'flights: for flight in flights {
        let mut players: Vec<_> = flight.players.iter().collect();
        players.sort_by_key(|p| p.position);
        for player in players {
            let Some(cell) = columns.next() else {
                debug!("Slot {} {:?} holds more players than columns", time, starting_hole);
                break 'flights;
            };
            *cell = Some(OccupiedPosition {
                flight_id: flight.id,
                booking_number: flight.booking_number.clone(),
                player_position: player.position,
                player_type: player.player_type(),
                checked_in: player.checked_in,
            });
        }
    }

    SlotOccupancy { time, starting_hole, positions }
}

/// Builds the public tee-sheet views. Takes no locks: what it returns may
/// already be stale by the time a booking is attempted.
#[derive(Clone)]
pub struct AvailabilityProjector {
    directory: CourseDirectory,
    blocks: BlockRegistry,
    flights: Arc<dyn FlightRepository>,
}

impl AvailabilityProjector {
    pub fn new(directory: CourseDirectory, blocks: BlockRegistry, flights: Arc<dyn FlightRepository>) -> Self {
        Self { directory, blocks, flights }
    }

    /// The tee sheet for one date, ordered by time then nine. Back-nine rows
    /// appear when the schedule splits tees or somebody is booked off the 10th.
    pub async fn tee_sheet(&self, tenant_id: Uuid, course_id: Uuid, date: NaiveDate) -> CoreResult<Vec<TeeSheetSlot>> {
        let day = self.directory.resolve_day(tenant_id, course_id, date).await?;
        let blocks = self.blocks.blocks_for_date(course_id, date).await?;
        let flights = self
            .flights
            .list_active_flights(tenant_id, course_id, date, date)
            .await
            .map_err(CoreError::internal)?;
        let by_slot = group_by_slot(&flights);
        let split = day.splits_nines();

        let mut sheet = Vec::new();
        for slot in day.plan.slots() {
            let block = find_block_for_time(&blocks, date, slot.time);

            for hole in [StartingHole::Front, StartingHole::Back] {
                let booked = by_slot.get(&(slot.time, hole));
                if hole == StartingHole::Back && !split && booked.is_none() {
                    continue;
                }

                let aggregated = booked.map(|flights| AggregatedBooking::from_flights(flights));
                let occupied = aggregated.as_ref().map_or(0, |a| a.total_players);

                sheet.push(TeeSheetSlot {
                    time: slot.time,
                    starting_hole: hole,
                    is_prime_time: slot.is_prime_time,
                    available: block.is_none() && occupied < MAX_PLAYERS_PER_SLOT,
                    blocked: block.is_some(),
                    block_info: block.map(BlockInfo::from),
                    aggregated_booking: aggregated,
                });
            }
        }

        debug!(
            "Projected {} tee sheet rows for course {} on {} ({} flights, {} blocks)",
            sheet.len(),
            course_id,
            date,
            flights.len(),
            blocks.len()
        );
        Ok(sheet)
    }

    /// Occupancy grid for `days` consecutive dates from `start`: per day, per
    /// nine, per position column. Only slots with bookings are listed.
    pub async fn week_view_occupancy(
        &self,
        tenant_id: Uuid,
        course_id: Uuid,
        start: NaiveDate,
        days: u32,
    ) -> CoreResult<Vec<DayOccupancy>> {
        if days == 0 || days > MAX_RANGE_DAYS {
            return Err(CoreError::Validation(format!(
                "date range must cover 1 to {} days, got {}",
                MAX_RANGE_DAYS, days
            )));
        }
        // Ownership check only; the grid is built from bookings.
        self.directory.course(tenant_id, course_id).await?;

        let end = start
            .checked_add_days(Days::new(u64::from(days - 1)))
            .ok_or_else(|| CoreError::Validation("date range out of bounds".into()))?;
        let flights = self
            .flights
            .list_active_flights(tenant_id, course_id, start, end)
            .await
            .map_err(CoreError::internal)?;

        let mut by_date: BTreeMap<NaiveDate, Vec<Flight>> = BTreeMap::new();
        for flight in flights {
            by_date.entry(flight.tee_date).or_default().push(flight);
        }

        let mut week = Vec::with_capacity(days as usize);
        for date in start.iter_days().take(days as usize) {
            let flights = by_date.remove(&date).unwrap_or_default();
            let mut keys: Vec<_> = group_by_slot(&flights).into_iter().collect();
            keys.sort_by_key(|(key, _)| *key);

            week.push(DayOccupancy {
                date,
                booked_players: flights.iter().map(|f| f.players.len() as u32).sum(),
                slots: keys
                    .into_iter()
                    .map(|((time, hole), flights)| occupancy_for(time, hole, &flights))
                    .collect(),
            });
        }
        Ok(week)
    }
}
