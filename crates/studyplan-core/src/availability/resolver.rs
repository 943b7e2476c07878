//! Per-date lookup of exclusions and academy schedules.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::error::{InputSource, SchedulingError};
use crate::schedule::{day_of_week, AcademySchedule, Exclusion, Period};

use super::template::validate_day;

/// Indexes exclusions by date and academy schedules by weekday.
#[derive(Debug, Clone)]
pub struct DayResolver<'a> {
    exclusions: HashMap<NaiveDate, &'a Exclusion>,
    academies: [Vec<&'a AcademySchedule>; 7],
}

impl<'a> DayResolver<'a> {
    /// Build the indexes for one computation.
    ///
    /// Exclusions outside `period` are ignored. When several exclusions share
    /// a date the highest-priority type wins, and equal types fall back to
    /// the smallest reason, so the winner never depends on input order.
    /// Academy schedules are validated and sorted by start time.
    pub fn new(
        period: &Period,
        exclusions: &'a [Exclusion],
        academy_schedules: &'a [AcademySchedule],
    ) -> Result<Self, SchedulingError> {
        let mut by_date: HashMap<NaiveDate, &'a Exclusion> = HashMap::new();
        for exclusion in exclusions.iter().filter(|e| period.contains(e.date)) {
            match by_date.get(&exclusion.date) {
                Some(current) => {
                    warn!(
                        date = %exclusion.date,
                        kept = ?current.exclusion_type,
                        other = ?exclusion.exclusion_type,
                        "duplicate exclusion for date, resolving by priority"
                    );
                    if rank(exclusion) < rank(current) {
                        by_date.insert(exclusion.date, exclusion);
                    }
                }
                None => {
                    by_date.insert(exclusion.date, exclusion);
                }
            }
        }

        let mut academies: [Vec<&'a AcademySchedule>; 7] = Default::default();
        for academy in academy_schedules {
            let day = validate_day(academy.day_of_week, InputSource::Academy)?;
            if academy.range().is_none() {
                return Err(SchedulingError::MalformedInterval {
                    origin: InputSource::Academy,
                    day_of_week: Some(academy.day_of_week),
                    start: academy.start_time,
                    end: academy.end_time,
                });
            }
            academies[day].push(academy);
        }
        for day in academies.iter_mut() {
            day.sort();
        }

        Ok(Self {
            exclusions: by_date,
            academies,
        })
    }

    /// The winning exclusion on `date`, if any.
    pub fn exclusion_on(&self, date: NaiveDate) -> Option<&'a Exclusion> {
        self.exclusions.get(&date).copied()
    }

    /// Academy schedules recurring on `date`'s weekday, by start time.
    pub fn academies_on(&self, date: NaiveDate) -> &[&'a AcademySchedule] {
        &self.academies[usize::from(day_of_week(date))]
    }
}

fn rank(exclusion: &Exclusion) -> (u8, Option<&str>) {
    (exclusion.exclusion_type.priority(), exclusion.reason.as_deref())
}
