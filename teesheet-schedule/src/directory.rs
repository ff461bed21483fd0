use chrono::NaiveDate;
use std::sync::Arc;
use teesheet_core::cache::{CacheEntry, CacheService};
use teesheet_core::repository::CourseRepository;
use teesheet_core::{Course, CoreError, CoreResult, DayType, SeasonalSchedule};
use tracing::debug;
use uuid::Uuid;

use crate::slots::{SlotPlan, Spacing};

/// Course configuration for one date: the course, the schedule in force (if
/// any) and the slot plan they produce.
#[derive(Debug, Clone)]
pub struct ResolvedDay {
    pub course: Course,
    pub schedule: Option<SeasonalSchedule>,
    pub plan: SlotPlan,
}

impl ResolvedDay {
    /// Whether the sheet runs the 1st and 10th as separate pools.
    pub fn splits_nines(&self) -> bool {
        self.schedule
            .as_ref()
            .is_some_and(|s| s.play_format.splits_nines())
    }
}

/// The schedule's hours if one applies, else the course defaults. Intervals
/// only take over when the schedule actually has some.
pub fn plan_for(course: &Course, schedule: Option<&SeasonalSchedule>, date: NaiveDate) -> SlotPlan {
    match schedule {
        Some(schedule) if !schedule.intervals.is_empty() => SlotPlan {
            first: schedule.first_tee_time,
            last: schedule.last_tee_time,
            spacing: Spacing::Table {
                intervals: schedule.intervals.clone(),
                day_type: DayType::for_date(date),
            },
        },
        Some(schedule) => SlotPlan {
            first: schedule.first_tee_time,
            last: schedule.last_tee_time,
            spacing: Spacing::Fixed(course.tee_interval_minutes),
        },
        None => SlotPlan {
            first: course.first_tee_time,
            last: course.last_tee_time,
            spacing: Spacing::Fixed(course.tee_interval_minutes),
        },
    }
}

/// Cached, tenant-checked view over course configuration.
#[derive(Clone)]
pub struct CourseDirectory {
    courses: Arc<dyn CourseRepository>,
    cache: Arc<dyn CacheService>,
}

impl CourseDirectory {
    pub fn new(courses: Arc<dyn CourseRepository>, cache: Arc<dyn CacheService>) -> Self {
        Self { courses, cache }
    }

    pub async fn course(&self, tenant_id: Uuid, course_id: Uuid) -> CoreResult<Course> {
        let cached = self.cache.get_course(course_id).await;
        match &cached {
            Some(CacheEntry::Found(course)) if course.tenant_id == tenant_id => {
                return Ok(course.clone());
            }
            Some(CacheEntry::Missing { tenant_id: Some(missed_for) }) if *missed_for == tenant_id => {
                return Err(course_not_found(course_id));
            }
            Some(_) => debug!("Cached entry for course {} is not for this tenant, reloading", course_id),
            None => {}
        }

        let loaded = self
            .courses
            .get_course(tenant_id, course_id)
            .await
            .map_err(CoreError::internal)?;

        match loaded {
            Some(course) => {
                self.cache
                    .put_course(course_id, CacheEntry::Found(course.clone()))
                    .await;
                Ok(course)
            }
            None => {
                // Never overwrite another tenant's entry with our miss.
                if cached.is_none() {
                    self.cache
                        .put_course(course_id, CacheEntry::Missing { tenant_id: Some(tenant_id) })
                        .await;
                }
                Err(course_not_found(course_id))
            }
        }
    }

    /// The active schedule covering `date`. Callers resolve the course first,
    /// which is where tenant ownership is checked.
    pub async fn active_schedule(&self, course_id: Uuid, date: NaiveDate) -> CoreResult<Option<SeasonalSchedule>> {
        match self.cache.get_schedule(course_id, date).await {
            Some(CacheEntry::Found(schedule)) => return Ok(Some(schedule)),
            Some(CacheEntry::Missing { .. }) => return Ok(None),
            None => {}
        }

        let loaded = self
            .courses
            .find_active_schedule(course_id, date)
            .await
            .map_err(CoreError::internal)?;

        let entry = match &loaded {
            Some(schedule) => CacheEntry::Found(schedule.clone()),
            None => CacheEntry::Missing { tenant_id: None },
        };
        self.cache.put_schedule(course_id, date, entry).await;
        Ok(loaded)
    }

    pub async fn resolve_day(&self, tenant_id: Uuid, course_id: Uuid, date: NaiveDate) -> CoreResult<ResolvedDay> {
        let course = self.course(tenant_id, course_id).await?;
        let schedule = self.active_schedule(course_id, date).await?;
        let plan = plan_for(&course, schedule.as_ref(), date);
        Ok(ResolvedDay { course, schedule, plan })
    }

    /// Called by the admin layer after changing a course.
    pub async fn invalidate_course(&self, course_id: Uuid) {
        self.cache.invalidate_course(course_id).await;
    }

    /// Called by the admin layer after creating, updating or deleting a
    /// seasonal schedule.
    pub async fn invalidate_schedules(&self, course_id: Uuid) {
        self.cache.invalidate_schedules(course_id).await;
    }
}

fn course_not_found(course_id: Uuid) -> CoreError {
    CoreError::NotFound(format!("course {}", course_id))
}
