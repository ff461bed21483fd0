use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use teesheet_core::cache::{CacheEntry, CacheService};
use teesheet_core::{Course, SeasonalSchedule};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local course/schedule cache. Lives as long as the process; only
/// the invalidation calls remove entries.
#[derive(Default)]
pub struct InMemoryCache {
    courses: RwLock<HashMap<Uuid, CacheEntry<Course>>>,
    schedules: RwLock<HashMap<(Uuid, NaiveDate), CacheEntry<SeasonalSchedule>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheService for InMemoryCache {
    async fn get_course(&self, course_id: Uuid) -> Option<CacheEntry<Course>> {
        self.courses.read().await.get(&course_id).cloned()
    }

    async fn put_course(&self, course_id: Uuid, entry: CacheEntry<Course>) {
        self.courses.write().await.insert(course_id, entry);
    }

    async fn get_schedule(
        &self,
        course_id: Uuid,
        date: NaiveDate,
    ) -> Option<CacheEntry<SeasonalSchedule>> {
        self.schedules.read().await.get(&(course_id, date)).cloned()
    }

    async fn put_schedule(
        &self,
        course_id: Uuid,
        date: NaiveDate,
        entry: CacheEntry<SeasonalSchedule>,
    ) {
        self.schedules.write().await.insert((course_id, date), entry);
    }

    async fn invalidate_course(&self, course_id: Uuid) {
        self.courses.write().await.remove(&course_id);
        self.invalidate_schedules(course_id).await;
    }

    async fn invalidate_schedules(&self, course_id: Uuid) {
        self.schedules
            .write()
            .await
            .retain(|(cached_course, _), _| *cached_course != course_id);
    }
}
