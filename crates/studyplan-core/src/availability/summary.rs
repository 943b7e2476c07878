//! Period-level aggregation of a computed daily schedule.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schedule::{DailySchedule, DayOfWeek, DayType, Period, SlotType};

/// Number of days per exclusion type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionDayCounts {
    pub vacation: usize,
    pub personal: usize,
    pub designated_holiday: usize,
}

impl ExclusionDayCounts {
    pub fn total(&self) -> usize {
        self.vacation + self.personal + self.designated_holiday
    }
}

/// Academy time placed in the schedule under one label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademyGroup {
    pub label: String,
    /// Weekdays on which a session was placed, ascending
    pub days_of_week: Vec<DayOfWeek>,
    /// Number of days with at least one placed session
    pub sessions: usize,
    pub academy_hours: f64,
    pub travel_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademyStatistics {
    pub total_sessions: usize,
    /// Distinct academy labels placed in the period
    pub unique_academies: usize,
    pub total_academy_hours: f64,
    pub total_travel_hours: f64,
    /// Travel minutes per placed session, 0 without sessions
    pub average_travel_minutes: f64,
    /// Per-label groups, ordered by label
    pub groups: Vec<AcademyGroup>,
}

/// Totals over the whole period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub period: Period,
    pub total_days: usize,
    /// Study days, review days not included
    pub total_study_days: usize,
    pub total_review_days: usize,
    pub total_non_study_days: usize,
    pub total_exclusion_days: ExclusionDayCounts,
    pub total_study_hours: f64,
    pub study_day_hours: f64,
    pub review_day_hours: f64,
    pub total_self_study_hours: f64,
    pub academy: AcademyStatistics,
}

#[derive(Default)]
struct GroupAcc {
    days_of_week: BTreeSet<DayOfWeek>,
    sessions: usize,
    academy_minutes: u32,
    travel_minutes: u32,
}

fn hours(minutes: u32) -> f64 {
    f64::from(minutes) / 60.0
}

/// Reduce a daily schedule to its summary.
pub fn summarize(period: Period, days: &[DailySchedule]) -> ScheduleSummary {
    let mut summary = ScheduleSummary {
        period,
        total_days: days.len(),
        total_study_days: 0,
        total_review_days: 0,
        total_non_study_days: 0,
        total_exclusion_days: ExclusionDayCounts::default(),
        total_study_hours: 0.0,
        study_day_hours: 0.0,
        review_day_hours: 0.0,
        total_self_study_hours: 0.0,
        academy: AcademyStatistics::default(),
    };
    let mut groups: BTreeMap<&str, GroupAcc> = BTreeMap::new();

    for day in days {
        match day.day_type {
            DayType::Study => {
                summary.total_study_days += 1;
                summary.study_day_hours += day.study_hours;
            }
            DayType::Review => {
                summary.total_review_days += 1;
                summary.review_day_hours += day.study_hours;
            }
            DayType::NonStudy => summary.total_non_study_days += 1,
            DayType::Vacation => summary.total_exclusion_days.vacation += 1,
            DayType::Personal => summary.total_exclusion_days.personal += 1,
            DayType::DesignatedHoliday => summary.total_exclusion_days.designated_holiday += 1,
        }
        summary.total_study_hours += day.study_hours;

        if day.time_slots.is_empty() {
            summary.total_self_study_hours += day.study_hours;
        } else {
            summary.total_self_study_hours += hours(day.minutes_of(SlotType::SelfStudy));
        }

        let mut seen_today: BTreeSet<&str> = BTreeSet::new();
        for slot in &day.time_slots {
            let Some(label) = slot.label.as_deref() else {
                continue;
            };
            let group = groups.entry(label).or_default();
            match slot.slot_type {
                SlotType::Academy => {
                    group.academy_minutes += slot.duration_minutes();
                    group.days_of_week.insert(day.day_of_week);
                    if seen_today.insert(label) {
                        group.sessions += 1;
                    }
                }
                SlotType::Travel => group.travel_minutes += slot.duration_minutes(),
                SlotType::Study | SlotType::SelfStudy => {}
            }
        }
    }

    let mut travel_minutes = 0u32;
    for (label, acc) in groups {
        travel_minutes += acc.travel_minutes;
        let group = AcademyGroup {
            label: label.to_string(),
            days_of_week: acc.days_of_week.into_iter().collect(),
            sessions: acc.sessions,
            academy_hours: hours(acc.academy_minutes),
            travel_hours: hours(acc.travel_minutes),
        };
        summary.academy.total_sessions += group.sessions;
        summary.academy.total_academy_hours += group.academy_hours;
        summary.academy.total_travel_hours += group.travel_hours;
        summary.academy.groups.push(group);
    }
    summary.academy.unique_academies = summary.academy.groups.len();
    if summary.academy.total_sessions > 0 {
        summary.academy.average_travel_minutes =
            f64::from(travel_minutes) / summary.academy.total_sessions as f64;
    }

    summary
}
