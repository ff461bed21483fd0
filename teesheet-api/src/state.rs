use std::sync::Arc;
use teesheet_booking::{BookingCoordinator, BookingSettings, FlightLifecycle};
use teesheet_core::cache::CacheService;
use teesheet_core::events::EventSink;
use teesheet_core::lock::LockService;
use teesheet_core::repository::{BlockRepository, CourseRepository, FlightRepository};
use teesheet_schedule::{AvailabilityProjector, BlockRegistry, CourseDirectory};

/// Backends the services are built from.
pub struct Backends {
    pub courses: Arc<dyn CourseRepository>,
    pub blocks: Arc<dyn BlockRepository>,
    pub flights: Arc<dyn FlightRepository>,
    pub locks: Arc<dyn LockService>,
    pub events: Arc<dyn EventSink>,
    pub cache: Arc<dyn CacheService>,
}

#[derive(Clone)]
pub struct AppState {
    pub directory: CourseDirectory,
    pub projector: AvailabilityProjector,
    pub bookings: Arc<BookingCoordinator>,
    pub lifecycle: FlightLifecycle,
}

impl AppState {
    pub fn new(backends: Backends, settings: BookingSettings) -> Self {
        let directory = CourseDirectory::new(backends.courses, backends.cache);
        let blocks = BlockRegistry::new(backends.blocks);
        let projector = AvailabilityProjector::new(directory.clone(), blocks.clone(), backends.flights.clone());
        let bookings = BookingCoordinator::new(
            backends.locks.clone(),
            directory.clone(),
            blocks,
            backends.flights.clone(),
            backends.events.clone(),
            settings,
        );
        let lifecycle = FlightLifecycle::new(backends.flights, backends.events, backends.locks, settings);

        Self {
            directory,
            projector,
            bookings: Arc::new(bookings),
            lifecycle,
        }
    }
}
