use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Maintenance,
    Tournament,
    Event,
    Weather,
    Other,
}

impl BlockType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maintenance => "MAINTENANCE",
            Self::Tournament => "TOURNAMENT",
            Self::Event => "EVENT",
            Self::Weather => "WEATHER",
            Self::Other => "OTHER",
        }
    }
}

impl std::str::FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MAINTENANCE" => Ok(Self::Maintenance),
            "TOURNAMENT" => Ok(Self::Tournament),
            "EVENT" => Ok(Self::Event),
            "WEATHER" => Ok(Self::Weather),
            "OTHER" => Ok(Self::Other),
            other => Err(format!("unknown block type: {other}")),
        }
    }
}

/// Admin-defined blackout window.
///
/// One-off blocks compare `[start_time, end_time)` as absolute instants.
/// Recurring blocks only use the time-of-day of those two instants and pick
/// their days through `recurring_pattern` (`DAILY`, `WEEKLY:MON,WED`,
/// `MONTHLY:1,15`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub id: Uuid,
    pub course_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurring_pattern: Option<String>,
    pub block_type: BlockType,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Block {
    /// Whether a one-off block touches any part of `[start, end)`.
    /// Recurring blocks always report true; their day filter is the pattern.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if self.is_recurring {
            return true;
        }
        self.start_time < end && self.end_time > start
    }
}

/// `[00:00 of date, 00:00 of the next day)` in UTC.
pub fn utc_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    let end = next.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn one_off(start: DateTime<Utc>, end: DateTime<Utc>) -> Block {
        Block {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            start_time: start,
            end_time: end,
            is_recurring: false,
            recurring_pattern: None,
            block_type: BlockType::Maintenance,
            reason: Some("Greens aeration".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_one_off_overlap_with_day() {
        let (day_start, day_end) = utc_day_bounds(NaiveDate::from_ymd_opt(2026, 5, 4).unwrap());

        let inside = one_off(
            Utc.with_ymd_and_hms(2026, 5, 4, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap(),
        );
        assert!(inside.overlaps(day_start, day_end));

        let spanning = one_off(
            Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 5, 10, 0, 0, 0).unwrap(),
        );
        assert!(spanning.overlaps(day_start, day_end));

        // Ends exactly at midnight that starts the day: half-open, no overlap.
        let before = one_off(
            Utc.with_ymd_and_hms(2026, 5, 3, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 5, 4, 0, 0, 0).unwrap(),
        );
        assert!(!before.overlaps(day_start, day_end));
    }
}
