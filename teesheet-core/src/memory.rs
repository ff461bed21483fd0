//! In-memory implementations of the persistence, lock and event interfaces.
//! Used by the test suites and for running the API without backing services.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::events::EventSink;
use crate::lock::LockService;
use crate::models::{
    Block, Course, DomainEvent, Flight, FlightStatus, SeasonalSchedule, StartingHole, StoredEvent,
};
use crate::numbering::parse_booking_number;
use crate::repository::{BlockRepository, CourseRepository, FlightRepository};
use crate::tee_time::TeeTime;
use crate::{BoxError, DuplicateKey, StaleWrite};

#[derive(Default)]
pub struct InMemoryStore {
    courses: RwLock<HashMap<Uuid, Course>>,
    schedules: RwLock<Vec<SeasonalSchedule>>,
    blocks: RwLock<Vec<Block>>,
    flights: RwLock<Vec<Flight>>,
    sequences: Mutex<HashMap<(Uuid, i32), u32>>,
    course_reads: AtomicUsize,
    schedule_reads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_course(&self, course: Course) {
        self.courses.write().await.insert(course.id, course);
    }

    pub async fn add_schedule(&self, schedule: SeasonalSchedule) {
        self.schedules.write().await.push(schedule);
    }

    pub async fn remove_schedule(&self, schedule_id: Uuid) {
        self.schedules.write().await.retain(|s| s.id != schedule_id);
    }

    pub async fn add_block(&self, block: Block) {
        self.blocks.write().await.push(block);
    }

    /// Number of course reads that reached the store.
    pub fn course_reads(&self) -> usize {
        self.course_reads.load(Ordering::SeqCst)
    }

    /// Number of schedule reads that reached the store.
    pub fn schedule_reads(&self) -> usize {
        self.schedule_reads.load(Ordering::SeqCst)
    }

    pub async fn all_flights(&self) -> Vec<Flight> {
        self.flights.read().await.clone()
    }
}

/// Highest `TT-<year>-NNNNN` sequence among the tenant's flights.
fn highest_issued(flights: &[Flight], tenant_id: Uuid, year: i32) -> u32 {
    flights
        .iter()
        .filter(|f| f.tenant_id == tenant_id)
        .filter_map(|f| parse_booking_number(&f.booking_number))
        .filter(|(issued_year, _)| *issued_year == year)
        .map(|(_, sequence)| sequence)
        .max()
        .unwrap_or(0)
}

#[async_trait]
impl CourseRepository for InMemoryStore {
    async fn get_course(
        &self,
        tenant_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Course>, BoxError> {
        self.course_reads.fetch_add(1, Ordering::SeqCst);
        let courses = self.courses.read().await;
        Ok(courses
            .get(&course_id)
            .filter(|c| c.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_active_schedule(
        &self,
        course_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<SeasonalSchedule>, BoxError> {
        self.schedule_reads.fetch_add(1, Ordering::SeqCst);
        let schedules = self.schedules.read().await;
        Ok(schedules
            .iter()
            .find(|s| s.course_id == course_id && s.applies_to(date))
            .cloned())
    }
}

#[async_trait]
impl BlockRepository for InMemoryStore {
    async fn find_block_candidates(
        &self,
        course_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Block>, BoxError> {
        let blocks = self.blocks.read().await;
        Ok(blocks
            .iter()
            .filter(|b| b.course_id == course_id)
            .filter(|b| b.overlaps(window_start, window_end))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FlightRepository for InMemoryStore {
    async fn get_flight(
        &self,
        tenant_id: Uuid,
        flight_id: Uuid,
    ) -> Result<Option<Flight>, BoxError> {
        let flights = self.flights.read().await;
        Ok(flights
            .iter()
            .find(|f| f.id == flight_id && f.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_active_flights(
        &self,
        tenant_id: Uuid,
        course_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Flight>, BoxError> {
        let flights = self.flights.read().await;
        let mut found: Vec<Flight> = flights
            .iter()
            .filter(|f| f.tenant_id == tenant_id && f.course_id == course_id)
            .filter(|f| f.tee_date >= from && f.tee_date <= to)
            .filter(|f| f.status.holds_capacity())
            .cloned()
            .collect();
        found.sort_by_key(|f| (f.tee_date, f.tee_time, f.created_at));
        Ok(found)
    }

    async fn count_booked_players(
        &self,
        tenant_id: Uuid,
        course_id: Uuid,
        tee_date: NaiveDate,
        tee_time: TeeTime,
        starting_hole: StartingHole,
    ) -> Result<u32, BoxError> {
        let flights = self.flights.read().await;
        Ok(flights
            .iter()
            .filter(|f| f.tenant_id == tenant_id && f.course_id == course_id)
            .filter(|f| f.tee_date == tee_date && f.tee_time == tee_time)
            .filter(|f| f.starting_hole == starting_hole && f.status.holds_capacity())
            .map(|f| f.players.len() as u32)
            .sum())
    }

    async fn next_booking_sequence(&self, tenant_id: Uuid, year: i32) -> Result<u32, BoxError> {
        let mut sequences = self.sequences.lock().await;
        let next = match sequences.get(&(tenant_id, year)) {
            Some(last) => last + 1,
            None => {
                let flights = self.flights.read().await;
                highest_issued(&flights, tenant_id, year) + 1
            }
        };
        sequences.insert((tenant_id, year), next);
        Ok(next)
    }

    async fn insert_flight(&self, flight: &Flight) -> Result<(), BoxError> {
        let mut flights = self.flights.write().await;
        if flights
            .iter()
            .any(|f| f.tenant_id == flight.tenant_id && f.booking_number == flight.booking_number)
        {
            return Err(Box::new(DuplicateKey(flight.booking_number.clone())));
        }
        flights.push(flight.clone());
        Ok(())
    }

    async fn update_flight(&self, flight: &Flight, expected: FlightStatus) -> Result<(), BoxError> {
        let mut flights = self.flights.write().await;
        let existing = flights
            .iter_mut()
            .find(|f| f.id == flight.id && f.tenant_id == flight.tenant_id)
            .ok_or_else(|| format!("flight {} does not exist", flight.id))?;
        if existing.status != expected {
            return Err(Box::new(StaleWrite(flight.id)));
        }
        *existing = flight.clone();
        Ok(())
    }
}

struct LockLease {
    owner: String,
    expires_at: Instant,
}

/// Process-local lock table. Expired leases are dropped on every acquire and
/// by the optional reaper task.
#[derive(Default)]
pub struct InMemoryLockService {
    leases: Mutex<HashMap<String, LockLease>>,
}

impl InMemoryLockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut leases = self.leases.lock().await;
        let before = leases.len();
        leases.retain(|_, lease| lease.expires_at > now);
        before - leases.len()
    }

    pub async fn is_held(&self, key: &str) -> bool {
        let leases = self.leases.lock().await;
        leases
            .get(key)
            .is_some_and(|lease| lease.expires_at > Instant::now())
    }

    pub fn spawn_reaper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let purged = self.purge_expired().await;
                if purged > 0 {
                    debug!("Reaped {} expired slot locks", purged);
                }
            }
        })
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn acquire(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, BoxError> {
        let now = Instant::now();
        let mut leases = self.leases.lock().await;
        leases.retain(|_, lease| lease.expires_at > now);

        if leases.contains_key(key) {
            return Ok(false);
        }
        leases.insert(
            key.to_string(),
            LockLease {
                owner: owner.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn release(&self, key: &str, owner: &str) -> Result<(), BoxError> {
        let mut leases = self.leases.lock().await;
        if leases.get(key).is_some_and(|lease| lease.owner == owner) {
            leases.remove(key);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEventSink {
    events: RwLock<Vec<StoredEvent>>,
    reject_appends: AtomicBool,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose appends all fail, for exercising best-effort paths.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.reject_appends.store(true, Ordering::SeqCst);
        sink
    }

    pub async fn all(&self) -> Vec<StoredEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn append(&self, event: DomainEvent) -> Result<StoredEvent, BoxError> {
        if self.reject_appends.load(Ordering::SeqCst) {
            return Err("event sink unavailable".into());
        }
        let mut events = self.events.write().await;
        let stored = StoredEvent {
            sequence: events.len() as i64 + 1,
            event,
        };
        events.push(stored.clone());
        Ok(stored)
    }

    async fn events_for_aggregate(
        &self,
        tenant_id: Uuid,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Vec<StoredEvent>, BoxError> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|s| s.event.tenant_id == tenant_id)
            .filter(|s| s.event.aggregate_type == aggregate_type && s.event.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }
}
