//! Time-of-day interval arithmetic.
//!
//! Intervals are half-open `[start, end)` ranges inside a single day,
//! measured in whole minutes. `24:00` is accepted as an end bound so that
//! a block may run until midnight.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A time of day in minutes since midnight (`0..=1440`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Midnight at the start of the day.
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    /// Midnight at the end of the day (`24:00`).
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(MINUTES_PER_DAY);

    /// Build from hours and minutes. Returns `None` past `24:00`.
    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if minutes > 59 {
            return None;
        }
        Self::from_minutes(hours.checked_mul(60)?.checked_add(minutes)?)
    }

    /// Build from minutes since midnight. Returns `None` past `24:00`.
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes <= MINUTES_PER_DAY).then_some(Self(minutes))
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Move earlier by `minutes`, stopping at midnight.
    pub fn saturating_sub_minutes(self, minutes: u16) -> Self {
        Self(self.0.saturating_sub(minutes))
    }

    /// Move later by `minutes`, stopping at `24:00`.
    pub fn saturating_add_minutes(self, minutes: u16) -> Self {
        Self(self.0.saturating_add(minutes).min(MINUTES_PER_DAY))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchedulingError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hours: u16 = h.parse().map_err(|_| invalid())?;
        let minutes: u16 = m.parse().map_err(|_| invalid())?;
        Self::from_hm(hours, minutes).ok_or_else(invalid)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = SchedulingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// A half-open interval `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    /// Create a range, returning `None` unless `start < end`.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// The whole day, `00:00-24:00`.
    pub fn whole_day() -> Self {
        Self {
            start: TimeOfDay::MIDNIGHT,
            end: TimeOfDay::END_OF_DAY,
        }
    }

    /// Whether `start < end`.
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    /// Length in minutes (zero for malformed ranges).
    pub fn duration_minutes(&self) -> u32 {
        u32::from(self.end.minutes().saturating_sub(self.start.minutes()))
    }

    /// Check if this range shares any time with `other`
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The shared part of two ranges, if any.
    pub fn intersect(&self, other: &TimeRange) -> Option<TimeRange> {
        TimeRange::new(self.start.max(other.start), self.end.min(other.end))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Remove every cut from `base`.
///
/// Returns the uncovered fragments of `base` in start order. Cuts may be
/// unsorted and may overlap each other.
pub fn subtract(base: TimeRange, cuts: &[TimeRange]) -> Vec<TimeRange> {
    let mut relevant: Vec<TimeRange> = cuts
        .iter()
        .filter_map(|cut| cut.intersect(&base))
        .collect();
    relevant.sort();

    let mut fragments = Vec::new();
    let mut cursor = base.start;

    for cut in merge(&relevant) {
        if cut.start > cursor {
            fragments.push(TimeRange {
                start: cursor,
                end: cut.start,
            });
        }
        if cut.end > cursor {
            cursor = cut.end;
        }
    }

    if cursor < base.end {
        fragments.push(TimeRange {
            start: cursor,
            end: base.end,
        });
    }

    fragments
}

/// Sort by start and collapse overlapping or touching ranges.
pub fn merge(ranges: &[TimeRange]) -> Vec<TimeRange> {
    let mut sorted: Vec<TimeRange> = ranges.to_vec();
    sorted.sort();

    let mut merged: Vec<TimeRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                if range.end > last.end {
                    last.end = range.end;
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Intersect `range` with `bounds`.
pub fn clip(range: TimeRange, bounds: TimeRange) -> Option<TimeRange> {
    range.intersect(&bounds)
}

/// Sum of the lengths of `ranges`, in minutes.
pub fn total_minutes(ranges: &[TimeRange]) -> u32 {
    ranges.iter().map(TimeRange::duration_minutes).sum()
}
