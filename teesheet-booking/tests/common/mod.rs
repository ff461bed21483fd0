#![allow(dead_code)]

use chrono::NaiveDate;
use std::sync::Arc;
use teesheet_booking::{BookingCoordinator, BookingSettings, CreateFlightRequest, FlightLifecycle};
use teesheet_core::memory::{InMemoryEventSink, InMemoryLockService, InMemoryStore};
use teesheet_core::models::{CaddyRequest, CartRequest, RentalRequest};
use teesheet_core::{Course, PlayerIdentity, PlayerInput, StartingHole, TeeTime};
use teesheet_schedule::{BlockRegistry, CourseDirectory, InMemoryCache};
use uuid::Uuid;

pub struct Harness {
    pub tenant: Uuid,
    pub course: Course,
    pub store: Arc<InMemoryStore>,
    pub locks: Arc<InMemoryLockService>,
    pub events: Arc<InMemoryEventSink>,
    pub coordinator: BookingCoordinator,
    pub lifecycle: FlightLifecycle,
}

pub fn t(s: &str) -> TeeTime {
    s.parse().unwrap()
}

pub fn tee_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 12).unwrap()
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_events(InMemoryEventSink::new()).await
    }

    pub async fn with_events(events: InMemoryEventSink) -> Self {
        let tenant = Uuid::new_v4();
        let course = Course {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            name: "Old Course".into(),
            first_tee_time: t("06:00"),
            last_tee_time: t("14:00"),
            tee_interval_minutes: 10,
            is_active: true,
        };
        let store = Arc::new(InMemoryStore::new());
        store.add_course(course.clone()).await;

        let locks = Arc::new(InMemoryLockService::new());
        let events = Arc::new(events);
        let directory = CourseDirectory::new(store.clone(), Arc::new(InMemoryCache::new()));
        let coordinator = BookingCoordinator::new(
            locks.clone(),
            directory,
            BlockRegistry::new(store.clone()),
            store.clone(),
            events.clone(),
            BookingSettings::default(),
        );
        let lifecycle =
            FlightLifecycle::new(store.clone(), events.clone(), locks.clone(), BookingSettings::default());

        Self { tenant, course, store, locks, events, coordinator, lifecycle }
    }

    pub fn request(&self, time: &str, players: u8) -> CreateFlightRequest {
        CreateFlightRequest {
            course_id: self.course.id,
            tee_date: tee_date(),
            tee_time: t(time),
            starting_hole: StartingHole::Front,
            holes: 18,
            players: (1..=players).map(member).collect(),
            notes: None,
        }
    }
}

pub fn member(position: u8) -> PlayerInput {
    PlayerInput {
        position,
        identity: PlayerIdentity::Member { member_id: Uuid::new_v4() },
        cart_request: CartRequest::default(),
        caddy_request: CaddyRequest::default(),
        rental_request: RentalRequest::default(),
    }
}
