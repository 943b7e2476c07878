//! Study-schedule availability computation.
//!
//! `compute_schedule_availability` is a pure function of its parameters:
//! the weekly template is expanded over the period, every date is
//! classified, review days are placed, each day is split into labeled time
//! slots and the whole schedule is reduced to a summary.

mod classify;
mod resolver;
mod review;
mod slots;
mod summary;
mod template;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collaborators::{BlockSetStore, DefaultBlockProvider, StandardTemplate};
use crate::error::SchedulingError;
use crate::schedule::{
    AcademySchedule, BlockSet, BlockSource, DailySchedule, Exclusion, Period, SchedulerOptions,
    WeeklyBlock,
};

pub use classify::{classify_day, classify_period, ClassifiedDay};
pub use resolver::DayResolver;
pub use review::assign_review_days;
pub use slots::SlotBuilder;
pub use summary::{summarize, AcademyGroup, AcademyStatistics, ExclusionDayCounts, ScheduleSummary};
pub use template::WeeklyTemplate;

/// Everything that determines a computed schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleParams {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub blocks: BlockSource,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub academy_schedules: Vec<AcademySchedule>,
    #[serde(default)]
    pub options: SchedulerOptions,
}

impl ScheduleParams {
    /// Parameters with no exclusions, academies or custom options.
    pub fn new(period_start: NaiveDate, period_end: NaiveDate, blocks: BlockSource) -> Self {
        Self {
            period_start,
            period_end,
            blocks,
            exclusions: Vec::new(),
            academy_schedules: Vec::new(),
            options: SchedulerOptions::default(),
        }
    }

    pub fn period(&self) -> Result<Period, SchedulingError> {
        Period::new(self.period_start, self.period_end)
    }
}

/// The computed schedule: one entry per date plus period totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAvailabilityResult {
    pub daily_schedule: Vec<DailySchedule>,
    pub summary: ScheduleSummary,
}

/// Request shape used by callers that still pass a block set id, inline
/// blocks and a template-mode flag side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(default)]
    pub block_set_id: Option<String>,
    #[serde(default)]
    pub blocks: Option<Vec<WeeklyBlock>>,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub academy_schedules: Vec<AcademySchedule>,
    #[serde(default)]
    pub scheduler_options: SchedulerOptions,
    #[serde(default)]
    pub is_template_mode: bool,
}

impl ScheduleRequest {
    /// Turn the flat request into parameters.
    ///
    /// Inline blocks win when non-empty, then a block set found in `store`,
    /// then template mode. Anything else is `MissingTemplate`.
    pub fn resolve(self, store: &dyn BlockSetStore) -> Result<ScheduleParams, SchedulingError> {
        let blocks = match (self.blocks, self.block_set_id) {
            (Some(blocks), _) if !blocks.is_empty() => BlockSource::explicit(BlockSet::inline(blocks)),
            (_, Some(id)) => match store.block_set(&id) {
                Some(set) => BlockSource::explicit(set),
                None if self.is_template_mode => BlockSource::DefaultTemplate,
                None => {
                    debug!(block_set_id = %id, "block set not found");
                    return Err(SchedulingError::MissingTemplate);
                }
            },
            _ if self.is_template_mode => BlockSource::DefaultTemplate,
            _ => return Err(SchedulingError::MissingTemplate),
        };

        Ok(ScheduleParams {
            period_start: self.period_start,
            period_end: self.period_end,
            blocks,
            exclusions: self.exclusions,
            academy_schedules: self.academy_schedules,
            options: self.scheduler_options,
        })
    }
}

/// Compute a schedule using the built-in standard template for template mode.
pub fn compute_schedule_availability(
    params: &ScheduleParams,
) -> Result<ScheduleAvailabilityResult, SchedulingError> {
    compute_with_provider(params, &StandardTemplate)
}

/// Compute a schedule with a custom default template provider.
pub fn compute_with_provider(
    params: &ScheduleParams,
    provider: &dyn DefaultBlockProvider,
) -> Result<ScheduleAvailabilityResult, SchedulingError> {
    let period = params.period()?;
    params.options.validate()?;

    let template = WeeklyTemplate::from_source(&params.blocks, provider)?;
    let resolver = DayResolver::new(&period, &params.exclusions, &params.academy_schedules)?;

    let classified = classify_period(&period, &template, &resolver);
    let classified = assign_review_days(
        classified,
        params.options.review_cadence,
        params.options.review_days,
    );

    let builder = SlotBuilder::new(&template, &params.options);
    let daily_schedule: Vec<DailySchedule> = classified
        .into_iter()
        .map(|day| {
            let academies = resolver.academies_on(day.date);
            builder.build_day(day, academies)
        })
        .collect();

    let summary = summarize(period, &daily_schedule);
    debug!(
        start = %period.start_date(),
        end = %period.end_date(),
        days = summary.total_days,
        study_days = summary.total_study_days,
        review_days = summary.total_review_days,
        study_hours = summary.total_study_hours,
        "schedule computed"
    );

    Ok(ScheduleAvailabilityResult {
        daily_schedule,
        summary,
    })
}
