use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A time of day at minute resolution, written `HH:MM` on the wire and in
/// storage. Ordering follows the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeeTime(u16);

impl TeeTime {
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Advance by `step` minutes, `None` once the day rolls over.
    pub fn checked_add(self, step: u16) -> Option<Self> {
        self.0.checked_add(step).and_then(Self::from_minutes)
    }

    pub fn to_naive_time(self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_num_seconds_from_midnight_opt(u32::from(self.0) * 60, 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }

    pub fn from_naive_time(time: chrono::NaiveTime) -> Self {
        use chrono::Timelike;
        Self((time.hour() * 60 + time.minute()) as u16)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tee time '{0}', expected HH:MM")]
pub struct ParseTeeTimeError(pub String);

impl FromStr for TeeTime {
    type Err = ParseTeeTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTeeTimeError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(err());
        }
        let hour: u16 = h.parse().map_err(|_| err())?;
        let minute: u16 = m.parse().map_err(|_| err())?;
        Self::from_hm(hour, minute).ok_or_else(err)
    }
}

impl TryFrom<String> for TeeTime {
    type Error = ParseTeeTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TeeTime> for String {
    fn from(value: TeeTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TeeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}
