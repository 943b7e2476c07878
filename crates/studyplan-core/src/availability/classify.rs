//! Day classification.
//!
//! Each date is classified on its own, first match wins:
//! exclusion type, then `study` when the template covers the weekday,
//! otherwise `non_study`. Review days are assigned afterwards.

use chrono::NaiveDate;

use crate::schedule::{DayType, Exclusion, Period};

use super::resolver::DayResolver;
use super::template::WeeklyTemplate;

/// A date with its day type and the exclusion that decided it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedDay {
    pub date: NaiveDate,
    pub day_type: DayType,
    pub exclusion: Option<Exclusion>,
}

/// Classify a single date.
pub fn classify_day(
    date: NaiveDate,
    template: &WeeklyTemplate,
    resolver: &DayResolver<'_>,
) -> ClassifiedDay {
    if let Some(exclusion) = resolver.exclusion_on(date) {
        return ClassifiedDay {
            date,
            day_type: exclusion.exclusion_type.day_type(),
            exclusion: Some(exclusion.clone()),
        };
    }

    let day_type = if template.intervals_on(date).is_empty() {
        DayType::NonStudy
    } else {
        DayType::Study
    };

    ClassifiedDay {
        date,
        day_type,
        exclusion: None,
    }
}

/// Classify every date of the period, in order.
pub fn classify_period(
    period: &Period,
    template: &WeeklyTemplate,
    resolver: &DayResolver<'_>,
) -> Vec<ClassifiedDay> {
    period
        .dates()
        .map(|date| classify_day(date, template, resolver))
        .collect()
}
