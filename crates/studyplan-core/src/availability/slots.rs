//! Time slot construction for one day.
//!
//! Template intervals are the day's base. Academy sessions claim their
//! overlap with the base first, then travel windows around each session
//! claim what is left of theirs. Whatever remains is study time, with the
//! part inside the self-study window labeled as self-study.

use crate::interval::{subtract, TimeRange};
use crate::schedule::{
    day_of_week, AcademySchedule, DailySchedule, DayType, SchedulerOptions, SlotType, TimeSlot,
};

use super::classify::ClassifiedDay;
use super::template::WeeklyTemplate;

/// Builds the final `DailySchedule` for classified days.
pub struct SlotBuilder<'a> {
    template: &'a WeeklyTemplate,
    options: &'a SchedulerOptions,
}

impl<'a> SlotBuilder<'a> {
    pub fn new(template: &'a WeeklyTemplate, options: &'a SchedulerOptions) -> Self {
        Self { template, options }
    }

    /// Build the schedule of one day.
    pub fn build_day(&self, day: ClassifiedDay, academies: &[&AcademySchedule]) -> DailySchedule {
        let (time_slots, study_hours) = if day.day_type.has_slots() {
            let slots = self.build_slots(self.template.intervals_on(day.date), academies);
            let minutes: u32 = slots
                .iter()
                .filter(|slot| slot.slot_type.counts_as_study())
                .map(TimeSlot::duration_minutes)
                .sum();
            (slots, f64::from(minutes) / 60.0)
        } else {
            (Vec::new(), self.fallback_hours(day.day_type))
        };

        DailySchedule {
            date: day.date,
            day_of_week: day_of_week(day.date),
            is_review: day.day_type == DayType::Review,
            day_type: day.day_type,
            time_slots,
            study_hours,
            exclusion: day.exclusion,
        }
    }

    /// Study hours credited to a day without time slots.
    fn fallback_hours(&self, day_type: DayType) -> f64 {
        match day_type {
            DayType::DesignatedHoliday => self.options.designated_holiday_self_study_hours,
            DayType::NonStudy => self.options.non_study_self_study_hours,
            _ => 0.0,
        }
    }

    fn build_slots(&self, base: &[TimeRange], academies: &[&AcademySchedule]) -> Vec<TimeSlot> {
        let mut slots = Vec::new();
        let mut claimed: Vec<TimeRange> = Vec::new();

        for academy in academies {
            if let Some(session) = academy.range() {
                claim(
                    base,
                    session,
                    SlotType::Academy,
                    &academy.label,
                    &mut claimed,
                    &mut slots,
                );
            }
        }

        for academy in academies {
            let Some(session) = academy.range() else {
                continue;
            };
            let travel = academy
                .travel_minutes
                .unwrap_or(self.options.default_travel_minutes);
            if travel == 0 {
                continue;
            }
            let windows = [
                TimeRange::new(session.start.saturating_sub_minutes(travel), session.start),
                TimeRange::new(session.end, session.end.saturating_add_minutes(travel)),
            ];
            for window in windows.into_iter().flatten() {
                claim(
                    base,
                    window,
                    SlotType::Travel,
                    &academy.label,
                    &mut claimed,
                    &mut slots,
                );
            }
        }

        for range in base {
            for free in subtract(*range, &claimed) {
                match self.options.self_study_window {
                    Some(window) => {
                        if let Some(inside) = free.intersect(&window) {
                            slots.push(TimeSlot::new(inside, SlotType::SelfStudy));
                        }
                        for outside in subtract(free, &[window]) {
                            slots.push(TimeSlot::new(outside, SlotType::Study));
                        }
                    }
                    None => slots.push(TimeSlot::new(free, SlotType::Study)),
                }
            }
        }

        slots.sort_by_key(|slot| (slot.start_time, slot.end_time));
        slots
    }
}

/// Label the unclaimed part of `busy ∩ base` and mark it claimed.
fn claim(
    base: &[TimeRange],
    busy: TimeRange,
    slot_type: SlotType,
    label: &str,
    claimed: &mut Vec<TimeRange>,
    slots: &mut Vec<TimeSlot>,
) {
    for range in base {
        if let Some(overlap) = range.intersect(&busy) {
            for fragment in subtract(overlap, claimed) {
                slots.push(TimeSlot::labeled(fragment, slot_type, label));
            }
            claimed.push(overlap);
        }
    }
}
