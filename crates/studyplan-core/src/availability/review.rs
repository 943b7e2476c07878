//! Review day placement.

use crate::schedule::DayType;

use super::classify::ClassifiedDay;

/// Promote the last `review_days` study days of every `cadence`-day cycle
/// to review days.
///
/// Single left-to-right pass. Only `study` days advance the cycle; any
/// other day type neither advances nor resets it. With one review day the
/// `K`-th study day is a review day iff `K mod cadence == 0`. A cadence or
/// review count of 0 disables review days.
pub fn assign_review_days(
    days: Vec<ClassifiedDay>,
    cadence: u32,
    review_days: u32,
) -> Vec<ClassifiedDay> {
    if cadence == 0 || review_days == 0 {
        return days;
    }
    let first_review = cadence.saturating_sub(review_days);

    let mut position = 0u32;
    days.into_iter()
        .map(|mut day| {
            if day.day_type == DayType::Study {
                if position >= first_review {
                    day.day_type = DayType::Review;
                }
                position = (position + 1) % cadence;
            }
            day
        })
        .collect()
}
