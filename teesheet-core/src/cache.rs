use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Course, SeasonalSchedule};

/// A cached lookup result. Misses are cached too.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry<T> {
    Found(T),
    /// Nothing exists. For courses this records which tenant looked, so the
    /// entry never answers for somebody else.
    Missing { tenant_id: Option<Uuid> },
}

/// Process-lifetime memo for the tee-sheet read path. Entries only go away
/// through the explicit invalidation calls.
#[async_trait]
pub trait CacheService: Send + Sync {
    async fn get_course(&self, course_id: Uuid) -> Option<CacheEntry<Course>>;

    async fn put_course(&self, course_id: Uuid, entry: CacheEntry<Course>);

    async fn get_schedule(
        &self,
        course_id: Uuid,
        date: NaiveDate,
    ) -> Option<CacheEntry<SeasonalSchedule>>;

    async fn put_schedule(
        &self,
        course_id: Uuid,
        date: NaiveDate,
        entry: CacheEntry<SeasonalSchedule>,
    );

    /// Drops the course record and every schedule entry for it.
    async fn invalidate_course(&self, course_id: Uuid);

    async fn invalidate_schedules(&self, course_id: Uuid);
}
