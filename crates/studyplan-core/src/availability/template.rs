//! Weekly template expansion.
//!
//! The template is a day-of-week lookup table built once per computation
//! and shared by every date that falls on the same weekday.

use chrono::NaiveDate;

use crate::collaborators::DefaultBlockProvider;
use crate::error::{InputSource, SchedulingError};
use crate::interval::{merge, TimeRange};
use crate::schedule::{day_of_week, BlockSource, DayOfWeek, WeeklyBlock};

/// Available study intervals per weekday, merged and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyTemplate {
    days: [Vec<TimeRange>; 7],
}

impl WeeklyTemplate {
    /// Resolve a block source into a template.
    pub fn from_source(
        source: &BlockSource,
        provider: &dyn DefaultBlockProvider,
    ) -> Result<Self, SchedulingError> {
        let blocks = match source {
            BlockSource::Explicit { block_set } => block_set.blocks.clone(),
            BlockSource::DefaultTemplate => provider.blocks(),
        };
        if blocks.is_empty() {
            return Err(SchedulingError::MissingTemplate);
        }
        Self::from_blocks(&blocks)
    }

    /// Validate blocks and merge the ones sharing a weekday.
    pub fn from_blocks(blocks: &[WeeklyBlock]) -> Result<Self, SchedulingError> {
        let mut raw: [Vec<TimeRange>; 7] = Default::default();

        for block in blocks {
            let day = validate_day(block.day_of_week, InputSource::Block)?;
            let range = block
                .range()
                .ok_or(SchedulingError::MalformedInterval {
                    origin: InputSource::Block,
                    day_of_week: Some(block.day_of_week),
                    start: block.start_time,
                    end: block.end_time,
                })?;
            raw[day].push(range);
        }

        Ok(Self {
            days: raw.map(|ranges| merge(&ranges)),
        })
    }

    /// Intervals available on a weekday (0 = Sunday). Empty for unknown days.
    pub fn intervals_for(&self, day: DayOfWeek) -> &[TimeRange] {
        self.days
            .get(usize::from(day))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Intervals available on a calendar date.
    pub fn intervals_on(&self, date: NaiveDate) -> &[TimeRange] {
        self.intervals_for(day_of_week(date))
    }

    /// Whether no weekday has any interval
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }
}

/// Check a weekday index and turn it into an array index.
pub(crate) fn validate_day(day: DayOfWeek, origin: InputSource) -> Result<usize, SchedulingError> {
    if day > 6 {
        return Err(SchedulingError::InvalidDayOfWeek { origin, value: day });
    }
    Ok(usize::from(day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::StandardTemplate;
    use crate::schedule::BlockSet;

    fn block(day: u8, start: &str, end: &str) -> WeeklyBlock {
        WeeklyBlock::new(day, start.parse().unwrap(), end.parse().unwrap())
    }

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    #[test]
    fn merges_blocks_per_weekday() {
        let template = WeeklyTemplate::from_blocks(&[
            block(1, "18:00", "20:00"),
            block(1, "19:00", "21:00"),
            block(1, "09:00", "10:00"),
            block(3, "18:00", "20:00"),
        ])
        .unwrap();

        assert_eq!(
            template.intervals_for(1),
            &[range("09:00", "10:00"), range("18:00", "21:00")]
        );
        assert_eq!(template.intervals_for(3), &[range("18:00", "20:00")]);
        assert!(template.intervals_for(0).is_empty());
        assert!(template.intervals_for(9).is_empty());
    }

    #[test]
    fn looks_up_by_date() {
        let template = WeeklyTemplate::from_blocks(&[block(1, "18:00", "20:00")]).unwrap();
        let monday: NaiveDate = "2024-01-08".parse().unwrap();
        let tuesday: NaiveDate = "2024-01-09".parse().unwrap();
        assert_eq!(template.intervals_on(monday).len(), 1);
        assert!(template.intervals_on(tuesday).is_empty());
    }

    #[test]
    fn rejects_malformed_block() {
        let err = WeeklyTemplate::from_blocks(&[block(2, "20:00", "18:00")]).unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::MalformedInterval {
                origin: InputSource::Block,
                day_of_week: Some(2),
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_weekday() {
        let err = WeeklyTemplate::from_blocks(&[block(7, "18:00", "20:00")]).unwrap_err();
        assert_eq!(
            err,
            SchedulingError::InvalidDayOfWeek {
                origin: InputSource::Block,
                value: 7
            }
        );
    }

    #[test]
    fn default_template_uses_provider() {
        let template =
            WeeklyTemplate::from_source(&BlockSource::DefaultTemplate, &StandardTemplate).unwrap();
        assert_eq!(
            template.intervals_for(4),
            &[range("10:00", "12:00"), range("13:00", "19:00")]
        );
    }

    #[test]
    fn empty_explicit_block_set_is_missing_template() {
        let source = BlockSource::explicit(BlockSet::inline(Vec::new()));
        let err = WeeklyTemplate::from_source(&source, &StandardTemplate).unwrap_err();
        assert_eq!(err, SchedulingError::MissingTemplate);
    }
}
