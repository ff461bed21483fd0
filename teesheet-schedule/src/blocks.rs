use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::Serialize;
use std::sync::Arc;
use teesheet_core::models::block::utc_day_bounds;
use teesheet_core::repository::BlockRepository;
use teesheet_core::{Block, BlockType, CoreError, CoreResult, TeeTime};
use uuid::Uuid;

/// Parsed form of a recurring block's pattern string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrencePattern {
    Daily,
    Weekly(Vec<Weekday>),
    Monthly(Vec<u32>),
    /// Anything else. Never matches.
    Unsupported(String),
}

impl RecurrencePattern {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (kind, days) = raw.split_once(':').unwrap_or((raw, ""));
        let days = days.split(',').map(str::trim).filter(|d| !d.is_empty());

        match kind.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly(days.filter_map(weekday_from_code).collect()),
            "MONTHLY" => Self::Monthly(days.filter_map(|d| d.parse().ok()).collect()),
            _ => Self::Unsupported(raw.to_string()),
        }
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekly(days) => days.contains(&date.weekday()),
            Self::Monthly(days) => days.contains(&date.day()),
            Self::Unsupported(_) => false,
        }
    }
}

fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code.to_ascii_uppercase().as_str() {
        "SUN" => Some(Weekday::Sun),
        "MON" => Some(Weekday::Mon),
        "TUE" => Some(Weekday::Tue),
        "WED" => Some(Weekday::Wed),
        "THU" => Some(Weekday::Thu),
        "FRI" => Some(Weekday::Fri),
        "SAT" => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn matches_recurring_pattern(date: NaiveDate, pattern: &str) -> bool {
    RecurrencePattern::parse(pattern).matches(date)
}

const MINUTES_PER_DAY: u16 = 24 * 60;

fn minutes_of_day(time: chrono::NaiveTime) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}

fn block_applies(block: &Block, date: NaiveDate, time: TeeTime) -> bool {
    if block.is_recurring {
        let pattern = block.recurring_pattern.as_deref().unwrap_or_default();
        if !matches_recurring_pattern(date, pattern) {
            return false;
        }
        let start = minutes_of_day(block.start_time.time());
        let mut end = minutes_of_day(block.end_time.time());
        // An end at or before the start runs to midnight.
        if end <= start {
            end = MINUTES_PER_DAY;
        }
        start <= time.minutes() && time.minutes() < end
    } else {
        let instant = date.and_time(time.to_naive_time()).and_utc();
        block.start_time <= instant && instant < block.end_time
    }
}

/// First block, in registry order, covering `time` on `date`.
pub fn find_block_for_time<'a>(blocks: &'a [Block], date: NaiveDate, time: TeeTime) -> Option<&'a Block> {
    blocks.iter().find(|block| block_applies(block, date, time))
}

/// What the tee sheet shows about a blocking window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockInfo {
    pub block_id: Uuid,
    pub block_type: BlockType,
    pub reason: Option<String>,
}

impl From<&Block> for BlockInfo {
    fn from(block: &Block) -> Self {
        Self {
            block_id: block.id,
            block_type: block.block_type,
            reason: block.reason.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BlockRegistry {
    repo: Arc<dyn BlockRepository>,
}

impl BlockRegistry {
    pub fn new(repo: Arc<dyn BlockRepository>) -> Self {
        Self { repo }
    }

    /// One-off blocks overlapping the UTC day plus every recurring block.
    pub async fn blocks_for_date(&self, course_id: Uuid, date: NaiveDate) -> CoreResult<Vec<Block>> {
        let (day_start, day_end) = utc_day_bounds(date);
        self.repo
            .find_block_candidates(course_id, day_start, day_end)
            .await
            .map_err(CoreError::internal)
    }

    pub async fn block_at(&self, course_id: Uuid, date: NaiveDate, time: TeeTime) -> CoreResult<Option<Block>> {
        let blocks = self.blocks_for_date(course_id, date).await?;
        Ok(find_block_for_time(&blocks, date, time).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Days, TimeZone, Utc};
    use teesheet_core::memory::InMemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn t(s: &str) -> TeeTime {
        s.parse().unwrap()
    }

    fn block(course_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>, pattern: Option<&str>, reason: &str) -> Block {
        Block {
            id: Uuid::new_v4(),
            course_id,
            start_time: start,
            end_time: end,
            is_recurring: pattern.is_some(),
            recurring_pattern: pattern.map(str::to_string),
            block_type: BlockType::Maintenance,
            reason: Some(reason.to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_weekly_pattern_matches_only_listed_days() {
        for year in [2023, 2024, 2028] {
            let mut day = date(year, 1, 1);
            while day.year() == year {
                let expected = matches!(day.weekday(), Weekday::Mon | Weekday::Wed);
                assert_eq!(matches_recurring_pattern(day, "WEEKLY:MON,WED"), expected, "{day}");
                day = day.checked_add_days(Days::new(1)).unwrap();
            }
        }
        // Leap day 2024-02-29 was a Thursday.
        assert!(matches_recurring_pattern(date(2024, 2, 29), "WEEKLY:THU"));
    }

    #[test]
    fn test_daily_and_monthly_patterns() {
        assert!(matches_recurring_pattern(date(2026, 3, 9), "DAILY"));
        assert!(matches_recurring_pattern(date(2026, 3, 15), "MONTHLY:1,15"));
        assert!(!matches_recurring_pattern(date(2026, 3, 16), "MONTHLY:1,15"));
        assert!(matches_recurring_pattern(date(2026, 3, 16), "weekly: mon , tue"));
    }

    #[test]
    fn test_unknown_pattern_fails_closed() {
        assert!(!matches_recurring_pattern(date(2026, 3, 9), "YEARLY:03-09"));
        assert!(!matches_recurring_pattern(date(2026, 3, 9), ""));
        assert!(!matches_recurring_pattern(date(2026, 3, 9), "WEEKLY:FUNDAY"));
    }

    #[test]
    fn test_recurring_block_uses_time_of_day_only() {
        let course = Uuid::new_v4();
        // Stored on some old date; only 06:00-08:00 matters.
        let mondays = block(
            course,
            Utc.with_ymd_and_hms(2020, 1, 1, 6, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 8, 0, 0).unwrap(),
            Some("WEEKLY:MON"),
            "Men's league",
        );
        let blocks = vec![mondays];
        let monday = date(2026, 10, 19);
        assert!(find_block_for_time(&blocks, monday, t("06:00")).is_some());
        assert!(find_block_for_time(&blocks, monday, t("07:59")).is_some());
        assert!(find_block_for_time(&blocks, monday, t("08:00")).is_none());
        assert!(find_block_for_time(&blocks, date(2026, 10, 20), t("07:00")).is_none());
    }

    #[test]
    fn test_recurring_block_ending_at_midnight_covers_the_evening() {
        let course = Uuid::new_v4();
        let twilight = block(
            course,
            Utc.with_ymd_and_hms(2020, 1, 1, 18, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
            Some("DAILY"),
            "Twilight league",
        );
        let blocks = vec![twilight];
        let day = date(2026, 7, 1);
        assert!(find_block_for_time(&blocks, day, t("17:50")).is_none());
        assert!(find_block_for_time(&blocks, day, t("18:00")).is_some());
        assert!(find_block_for_time(&blocks, day, t("23:59")).is_some());
        assert!(find_block_for_time(&blocks, day, t("06:00")).is_none());
    }

    #[test]
    fn test_one_off_block_compares_instants() {
        let course = Uuid::new_v4();
        let blocks = vec![block(
            course,
            Utc.with_ymd_and_hms(2026, 10, 19, 22, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap(),
            None,
            "Overnight irrigation",
        )];
        assert!(find_block_for_time(&blocks, date(2026, 10, 19), t("21:59")).is_none());
        assert!(find_block_for_time(&blocks, date(2026, 10, 19), t("22:00")).is_some());
        assert!(find_block_for_time(&blocks, date(2026, 10, 20), t("08:50")).is_some());
        assert!(find_block_for_time(&blocks, date(2026, 10, 20), t("09:00")).is_none());
    }

    #[test]
    fn test_first_match_wins_in_registry_order() {
        let course = Uuid::new_v4();
        let day = date(2026, 6, 1);
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 7, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let blocks = vec![
            block(course, start, end, None, "Club championship"),
            block(course, start, end, Some("DAILY"), "Range maintenance"),
        ];
        let hit = find_block_for_time(&blocks, day, t("09:00")).unwrap();
        assert_eq!(hit.reason.as_deref(), Some("Club championship"));
    }

    #[tokio::test]
    async fn test_registry_returns_day_candidates() {
        let store = Arc::new(InMemoryStore::new());
        let course = Uuid::new_v4();
        let day = date(2026, 6, 1);

        store.add_block(block(
            course,
            Utc.with_ymd_and_hms(2026, 6, 1, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap(),
            None,
            "Shotgun start",
        )).await;
        store.add_block(block(
            course,
            Utc.with_ymd_and_hms(2026, 6, 2, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 6, 2, 9, 0, 0).unwrap(),
            None,
            "Next day",
        )).await;
        store.add_block(block(
            course,
            Utc.with_ymd_and_hms(2019, 1, 1, 15, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2019, 1, 1, 16, 0, 0).unwrap(),
            Some("MONTHLY:1"),
            "Junior clinic",
        )).await;
        store.add_block(block(
            Uuid::new_v4(),
            Utc.with_ymd_and_hms(2026, 6, 1, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap(),
            None,
            "Other course",
        )).await;

        let registry = BlockRegistry::new(store);
        let blocks = registry.blocks_for_date(course, day).await.unwrap();
        let reasons: Vec<_> = blocks.iter().filter_map(|b| b.reason.as_deref()).collect();
        assert_eq!(reasons, vec!["Shotgun start", "Junior clinic"]);

        let hit = registry.block_at(course, day, t("15:30")).await.unwrap();
        assert_eq!(hit.and_then(|b| b.reason), Some("Junior clinic".to_string()));
        assert!(registry.block_at(course, day, t("12:00")).await.unwrap().is_none());
    }
}
