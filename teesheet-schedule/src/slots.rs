use serde::Serialize;
use teesheet_core::{DayType, Interval, TeeTime};

/// Step used when an interval table has nothing for the day type, or when a
/// configured step is zero.
pub const DEFAULT_STEP_MINUTES: u16 = 8;

/// How far apart consecutive tee times are.
#[derive(Debug, Clone, PartialEq)]
pub enum Spacing {
    /// Same step all day, never prime time.
    Fixed(u16),
    /// Per-window steps taken from a schedule's interval table.
    Table {
        intervals: Vec<Interval>,
        day_type: DayType,
    },
}

impl Spacing {
    /// `(step, is_prime_time)` for a slot starting at `time`.
    fn step_at(&self, time: TeeTime) -> (u16, bool) {
        let (step, prime) = match self {
            Spacing::Fixed(step) => (*step, false),
            Spacing::Table { intervals, day_type } => {
                let mut of_day = intervals.iter().filter(|i| i.day_type == *day_type);
                let first = of_day.clone().next();
                match of_day.find(|i| i.contains(time)).or(first) {
                    Some(interval) => (interval.interval_minutes, interval.is_prime_time),
                    None => (DEFAULT_STEP_MINUTES, false),
                }
            }
        };
        let step = if step == 0 { DEFAULT_STEP_MINUTES } else { step };
        (step, prime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeneratedSlot {
    pub time: TeeTime,
    pub is_prime_time: bool,
}

/// First and last tee time (both inclusive) plus the spacing between them.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPlan {
    pub first: TeeTime,
    pub last: TeeTime,
    pub spacing: Spacing,
}

impl SlotPlan {
    pub fn slots(&self) -> Slots<'_> {
        Slots {
            plan: self,
            next: Some(self.first),
        }
    }

    pub fn generate(&self) -> Vec<GeneratedSlot> {
        self.slots().collect()
    }

    /// The generated slot at exactly `time`, if the grid has one.
    pub fn slot_at(&self, time: TeeTime) -> Option<GeneratedSlot> {
        self.slots()
            .take_while(|slot| slot.time <= time)
            .find(|slot| slot.time == time)
    }
}

/// Walks a [`SlotPlan`] from first to last tee time.
#[derive(Debug, Clone)]
pub struct Slots<'a> {
    plan: &'a SlotPlan,
    next: Option<TeeTime>,
}

impl Iterator for Slots<'_> {
    type Item = GeneratedSlot;

    fn next(&mut self) -> Option<Self::Item> {
        let time = self.next.filter(|t| *t <= self.plan.last)?;
        let (step, is_prime_time) = self.plan.spacing.step_at(time);
        self.next = time.checked_add(step);
        Some(GeneratedSlot { time, is_prime_time })
    }
}

pub fn generate_slots(first: TeeTime, last: TeeTime, spacing: Spacing) -> Vec<GeneratedSlot> {
    SlotPlan { first, last, spacing }.generate()
}
