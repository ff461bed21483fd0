pub mod availability;
pub mod blocks;
pub mod cache;
pub mod directory;
pub mod slots;

pub use availability::{AggregatedBooking, AvailabilityProjector, DayOccupancy, TeeSheetSlot};
pub use blocks::{BlockInfo, BlockRegistry};
pub use cache::InMemoryCache;
pub use directory::{CourseDirectory, ResolvedDay};
pub use slots::{generate_slots, GeneratedSlot, SlotPlan, Spacing};
