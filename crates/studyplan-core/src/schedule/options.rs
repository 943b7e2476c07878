//! Scheduling knobs that affect the computed schedule.

use serde::{Deserialize, Serialize};

use crate::error::{InputSource, SchedulingError};
use crate::interval::{TimeRange, MINUTES_PER_DAY};

/// Options for one schedule computation.
///
/// Every field has an explicit default, and every field takes part in the
/// cache fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerOptions {
    /// Length of the review cycle in counted study days; 0 disables review days
    #[serde(default = "default_review_cadence")]
    pub review_cadence: u32,
    /// Consecutive review days closing each cycle
    #[serde(default = "default_review_days")]
    pub review_days: u32,
    /// Remaining study time inside this window is labeled self-study
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_study_window: Option<TimeRange>,
    /// Nominal self-study allowance on designated holidays (hours)
    #[serde(default)]
    pub designated_holiday_self_study_hours: f64,
    /// Fallback self-study hours on days without template coverage
    #[serde(default)]
    pub non_study_self_study_hours: f64,
    /// One-way travel time for academy entries that carry none (minutes)
    #[serde(default)]
    pub default_travel_minutes: u16,
}

fn default_review_cadence() -> u32 {
    7
}

fn default_review_days() -> u32 {
    1
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            review_cadence: default_review_cadence(),
            review_days: default_review_days(),
            self_study_window: None,
            designated_holiday_self_study_hours: 0.0,
            non_study_self_study_hours: 0.0,
            default_travel_minutes: 0,
        }
    }
}

impl SchedulerOptions {
    /// Check every option against its allowed range.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        check_hours(
            "designated_holiday_self_study_hours",
            self.designated_holiday_self_study_hours,
        )?;
        check_hours(
            "non_study_self_study_hours",
            self.non_study_self_study_hours,
        )?;

        if self.review_cadence > 0 && self.review_days > self.review_cadence {
            return Err(SchedulingError::InvalidOption {
                name: "review_days".to_string(),
                message: format!(
                    "{} review days do not fit a cycle of {}",
                    self.review_days, self.review_cadence
                ),
            });
        }

        if self.default_travel_minutes > MINUTES_PER_DAY {
            return Err(SchedulingError::InvalidOption {
                name: "default_travel_minutes".to_string(),
                message: format!(
                    "{} exceeds one day ({MINUTES_PER_DAY} minutes)",
                    self.default_travel_minutes
                ),
            });
        }

        if let Some(window) = self.self_study_window {
            if !window.is_well_formed() {
                return Err(SchedulingError::MalformedInterval {
                    origin: InputSource::SelfStudyWindow,
                    day_of_week: None,
                    start: window.start,
                    end: window.end,
                });
            }
        }

        Ok(())
    }
}

fn check_hours(name: &str, hours: f64) -> Result<(), SchedulingError> {
    if hours.is_finite() && (0.0..=24.0).contains(&hours) {
        Ok(())
    } else {
        Err(SchedulingError::InvalidOption {
            name: name.to_string(),
            message: format!("{hours} is not between 0 and 24 hours"),
        })
    }
}
