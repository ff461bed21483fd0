use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tee_time::TeeTime;

/// A bookable course and its fallback tee-sheet hours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub first_tee_time: TeeTime,
    pub last_tee_time: TeeTime,
    pub tee_interval_minutes: u16,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayFormat {
    /// Everyone tees off the 1st.
    Standard,
    /// Split tees: the 1st and the 10th run as separate sheets.
    Crossover,
    Shotgun,
}

impl PlayFormat {
    pub fn splits_nines(self) -> bool {
        matches!(self, Self::Crossover | Self::Shotgun)
    }
}

/// Dated override of the course defaults, e.g. "Summer 2026".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonalSchedule {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub first_tee_time: TeeTime,
    pub last_tee_time: TeeTime,
    pub play_format: PlayFormat,
    pub pace_of_play_minutes: Option<u16>,
    pub is_active: bool,
    pub intervals: Vec<Interval>,
}

impl SeasonalSchedule {
    pub fn applies_to(&self, date: NaiveDate) -> bool {
        self.is_active && self.start_date <= date && date <= self.end_date
    }
}

/// Holiday is carried for storage compatibility only; nothing resolves a
/// date to it yet, see [`DayType::for_date`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayType {
    Weekday,
    Weekend,
    Holiday,
}

impl DayType {
    /// Saturday and Sunday are weekend, everything else weekday.
    // TODO: resolve Holiday once courses can publish a holiday calendar.
    pub fn for_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekday => "WEEKDAY",
            Self::Weekend => "WEEKEND",
            Self::Holiday => "HOLIDAY",
        }
    }
}

impl std::str::FromStr for DayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WEEKDAY" => Ok(Self::Weekday),
            "WEEKEND" => Ok(Self::Weekend),
            "HOLIDAY" => Ok(Self::Holiday),
            other => Err(format!("unknown day type: {other}")),
        }
    }
}

/// Step size for one day-type over the window `[time_start, time_end)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interval {
    pub id: Uuid,
    pub day_type: DayType,
    pub time_start: TeeTime,
    pub time_end: TeeTime,
    pub interval_minutes: u16,
    pub is_prime_time: bool,
}

impl Interval {
    pub fn contains(&self, time: TeeTime) -> bool {
        self.time_start <= time && time < self.time_end
    }
}
