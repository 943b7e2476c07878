//! Schedule types: periods, weekly blocks, exclusions, academy schedules
//! and the per-day output of the availability engine.

mod options;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;
use crate::interval::{TimeOfDay, TimeRange};

pub use options::SchedulerOptions;

/// Weekday index, 0 = Sunday ... 6 = Saturday.
pub type DayOfWeek = u8;

/// Weekday index of a calendar date (0 = Sunday).
pub fn day_of_week(date: NaiveDate) -> DayOfWeek {
    date.weekday().num_days_from_sunday() as DayOfWeek
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PeriodBounds")]
pub struct Period {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Deserialize)]
struct PeriodBounds {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl TryFrom<PeriodBounds> for Period {
    type Error = SchedulingError;

    fn try_from(bounds: PeriodBounds) -> Result<Self, Self::Error> {
        Period::new(bounds.start_date, bounds.end_date)
    }
}

impl Period {
    /// Create a period. Fails with `InvalidPeriod` if `end_date < start_date`.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, SchedulingError> {
        if end_date < start_date {
            return Err(SchedulingError::InvalidPeriod {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Number of dates in the period, both ends included.
    pub fn days(&self) -> usize {
        (self.end_date - self.start_date).num_days() as usize + 1
    }

    /// Whether `date` falls inside the period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Every date of the period in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.start_date.iter_days().take(self.days())
    }
}

/// A recurring weekly interval nominally available for study.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeeklyBlock {
    pub day_of_week: DayOfWeek,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl WeeklyBlock {
    pub fn new(day_of_week: DayOfWeek, start_time: TimeOfDay, end_time: TimeOfDay) -> Self {
        Self {
            day_of_week,
            start_time,
            end_time,
        }
    }

    /// The block's time range, if well formed.
    pub fn range(&self) -> Option<TimeRange> {
        TimeRange::new(self.start_time, self.end_time)
    }
}

/// A named collection of weekly blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSet {
    pub id: String,
    pub name: String,
    pub blocks: Vec<WeeklyBlock>,
}

impl BlockSet {
    /// An unnamed block set, used for inline blocks.
    pub fn inline(blocks: Vec<WeeklyBlock>) -> Self {
        Self {
            id: "inline".to_string(),
            name: "Inline blocks".to_string(),
            blocks,
        }
    }
}

/// Where the weekly availability template comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockSource {
    /// Blocks supplied by the caller
    Explicit { block_set: BlockSet },
    /// The default template of the engine's block provider
    DefaultTemplate,
}

impl BlockSource {
    pub fn explicit(block_set: BlockSet) -> Self {
        Self::Explicit { block_set }
    }
}

/// Kind of calendar exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionType {
    Vacation,
    Personal,
    DesignatedHoliday,
    Other,
}

impl ExclusionType {
    /// Resolution rank when several exclusions share a date (lower wins).
    pub fn priority(&self) -> u8 {
        match self {
            ExclusionType::Vacation => 0,
            ExclusionType::Personal => 1,
            ExclusionType::DesignatedHoliday => 2,
            ExclusionType::Other => 3,
        }
    }

    /// The day type a date takes when this exclusion wins.
    pub fn day_type(&self) -> DayType {
        match self {
            ExclusionType::Vacation => DayType::Vacation,
            ExclusionType::Personal | ExclusionType::Other => DayType::Personal,
            ExclusionType::DesignatedHoliday => DayType::DesignatedHoliday,
        }
    }
}

/// A single calendar date overriding normal scheduling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Exclusion {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub exclusion_type: ExclusionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Exclusion {
    pub fn new(date: NaiveDate, exclusion_type: ExclusionType) -> Self {
        Self {
            date,
            exclusion_type,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// A recurring weekly commitment that consumes available time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AcademySchedule {
    pub day_of_week: DayOfWeek,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub label: String,
    /// One-way travel time in minutes; falls back to the scheduler default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_minutes: Option<u16>,
}

impl AcademySchedule {
    pub fn new(
        day_of_week: DayOfWeek,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
        label: impl Into<String>,
    ) -> Self {
        Self {
            day_of_week,
            start_time,
            end_time,
            label: label.into(),
            travel_minutes: None,
        }
    }

    pub fn with_travel_minutes(mut self, minutes: u16) -> Self {
        self.travel_minutes = Some(minutes);
        self
    }

    /// The session's time range, if well formed.
    pub fn range(&self) -> Option<TimeRange> {
        TimeRange::new(self.start_time, self.end_time)
    }
}

/// Classification of one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Vacation,
    Personal,
    DesignatedHoliday,
    Review,
    Study,
    NonStudy,
}

impl DayType {
    pub const ALL: [DayType; 6] = [
        DayType::Study,
        DayType::Review,
        DayType::DesignatedHoliday,
        DayType::Vacation,
        DayType::Personal,
        DayType::NonStudy,
    ];

    /// Whether this day type comes from a calendar exclusion
    pub fn is_exclusion(&self) -> bool {
        matches!(
            self,
            DayType::Vacation | DayType::Personal | DayType::DesignatedHoliday
        )
    }

    /// Whether time slots are built for this day
    pub fn has_slots(&self) -> bool {
        matches!(self, DayType::Study | DayType::Review)
    }

    /// Stable machine name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DayType::Vacation => "vacation",
            DayType::Personal => "personal",
            DayType::DesignatedHoliday => "designated_holiday",
            DayType::Review => "review",
            DayType::Study => "study",
            DayType::NonStudy => "non_study",
        }
    }
}

/// Kind of time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Study,
    SelfStudy,
    Travel,
    Academy,
}

impl SlotType {
    pub const ALL: [SlotType; 4] = [
        SlotType::Study,
        SlotType::SelfStudy,
        SlotType::Travel,
        SlotType::Academy,
    ];

    /// Whether this slot counts towards the day's study hours
    pub fn counts_as_study(&self) -> bool {
        matches!(self, SlotType::Study | SlotType::SelfStudy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotType::Study => "study",
            SlotType::SelfStudy => "self_study",
            SlotType::Travel => "travel",
            SlotType::Academy => "academy",
        }
    }
}

/// A labeled sub-interval of a day's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TimeSlot {
    pub fn new(range: TimeRange, slot_type: SlotType) -> Self {
        Self {
            start_time: range.start,
            end_time: range.end,
            slot_type,
            label: None,
        }
    }

    pub fn labeled(range: TimeRange, slot_type: SlotType, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(range, slot_type)
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn duration_minutes(&self) -> u32 {
        self.range().duration_minutes()
    }
}

/// The computed schedule of one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySchedule {
    pub date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub day_type: DayType,
    pub time_slots: Vec<TimeSlot>,
    pub study_hours: f64,
    pub is_review: bool,
    /// The exclusion that decided this date, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion: Option<Exclusion>,
}

impl DailySchedule {
    /// Total minutes of slots of the given type.
    pub fn minutes_of(&self, slot_type: SlotType) -> u32 {
        self.time_slots
            .iter()
            .filter(|slot| slot.slot_type == slot_type)
            .map(TimeSlot::duration_minutes)
            .sum()
    }
}
