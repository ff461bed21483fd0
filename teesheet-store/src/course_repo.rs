use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use teesheet_core::repository::{BlockRepository, CourseRepository};
use teesheet_core::{Block, BoxError, Course, Interval, SeasonalSchedule, TeeTime};
use uuid::Uuid;

use crate::codec::{enum_from_text, narrow};

pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    first_tee_time: NaiveTime,
    last_tee_time: NaiveTime,
    tee_interval_minutes: i32,
    is_active: bool,
}

impl TryFrom<CourseRow> for Course {
    type Error = BoxError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Course {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            first_tee_time: TeeTime::from_naive_time(row.first_tee_time),
            last_tee_time: TeeTime::from_naive_time(row.last_tee_time),
            tee_interval_minutes: narrow("tee_interval_minutes", row.tee_interval_minutes)?,
            is_active: row.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    course_id: Uuid,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    first_tee_time: NaiveTime,
    last_tee_time: NaiveTime,
    play_format: String,
    pace_of_play_minutes: Option<i32>,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct IntervalRow {
    id: Uuid,
    day_type: String,
    time_start: NaiveTime,
    time_end: NaiveTime,
    interval_minutes: i32,
    is_prime_time: bool,
}

impl TryFrom<IntervalRow> for Interval {
    type Error = BoxError;

    fn try_from(row: IntervalRow) -> Result<Self, Self::Error> {
        Ok(Interval {
            id: row.id,
            day_type: row.day_type.parse()?,
            time_start: TeeTime::from_naive_time(row.time_start),
            time_end: TeeTime::from_naive_time(row.time_end),
            interval_minutes: narrow("interval_minutes", row.interval_minutes)?,
            is_prime_time: row.is_prime_time,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BlockRow {
    id: Uuid,
    course_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    is_recurring: bool,
    recurring_pattern: Option<String>,
    block_type: String,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BlockRow> for Block {
    type Error = BoxError;

    fn try_from(row: BlockRow) -> Result<Self, Self::Error> {
        Ok(Block {
            id: row.id,
            course_id: row.course_id,
            start_time: row.start_time,
            end_time: row.end_time,
            is_recurring: row.is_recurring,
            recurring_pattern: row.recurring_pattern,
            block_type: row.block_type.parse()?,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl CourseRepository for PgCourseRepository {
    async fn get_course(&self, tenant_id: Uuid, course_id: Uuid) -> Result<Option<Course>, BoxError> {
        let row: Option<CourseRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, name, first_tee_time, last_tee_time, tee_interval_minutes, is_active
            FROM courses
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(course_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Course::try_from).transpose()
    }

    async fn find_active_schedule(
        &self,
        course_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<SeasonalSchedule>, BoxError> {
        let row: Option<ScheduleRow> = sqlx::query_as(
            r#"
            SELECT id, course_id, name, start_date, end_date, first_tee_time, last_tee_time,
                   play_format, pace_of_play_minutes, is_active
            FROM seasonal_schedules
            WHERE course_id = $1 AND is_active AND start_date <= $2 AND end_date >= $2
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(course_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let intervals: Vec<IntervalRow> = sqlx::query_as(
            r#"
            SELECT id, day_type, time_start, time_end, interval_minutes, is_prime_time
            FROM schedule_intervals
            WHERE schedule_id = $1
            ORDER BY sort_order, time_start
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SeasonalSchedule {
            id: row.id,
            course_id: row.course_id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            first_tee_time: TeeTime::from_naive_time(row.first_tee_time),
            last_tee_time: TeeTime::from_naive_time(row.last_tee_time),
            play_format: enum_from_text(&row.play_format)?,
            pace_of_play_minutes: row
                .pace_of_play_minutes
                .map(|m| narrow("pace_of_play_minutes", m))
                .transpose()?,
            is_active: row.is_active,
            intervals: intervals
                .into_iter()
                .map(Interval::try_from)
                .collect::<Result<_, _>>()?,
        }))
    }
}

#[async_trait]
impl BlockRepository for PgCourseRepository {
    async fn find_block_candidates(
        &self,
        course_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Block>, BoxError> {
        let rows: Vec<BlockRow> = sqlx::query_as(
            r#"
            SELECT id, course_id, start_time, end_time, is_recurring, recurring_pattern,
                   block_type, reason, created_at
            FROM blocks
            WHERE course_id = $1
              AND (is_recurring OR (start_time < $3 AND end_time > $2))
            ORDER BY seq
            "#,
        )
        .bind(course_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Block::try_from).collect()
    }
}
