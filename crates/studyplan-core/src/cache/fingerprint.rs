//! Canonical fingerprint of schedule parameters.
//!
//! Every input that affects the computed schedule is fed into SHA-256 in a
//! fixed order, each value framed as `tag=len:value;`. Collections whose
//! order does not matter to the result are sorted first, so reordering
//! exclusions or academy entries yields the same fingerprint. Exclusions
//! outside the period are skipped. Block set ids and names are not hashed,
//! only the blocks themselves.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::availability::ScheduleParams;
use crate::interval::TimeRange;
use crate::schedule::{AcademySchedule, BlockSource, Exclusion, SchedulerOptions, WeeklyBlock};

/// Bumped whenever the encoding below changes.
const ENCODING_VERSION: &str = "studyplan-fingerprint-v2";

/// SHA-256 digest identifying one set of schedule parameters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint `params`, with `template_tag` standing in for the
    /// default template's blocks.
    pub fn of(params: &ScheduleParams, template_tag: &str) -> Self {
        let mut builder = FingerprintBuilder::new();
        builder.field("version", ENCODING_VERSION);
        builder.field("period_start", params.period_start);
        builder.field("period_end", params.period_end);

        match &params.blocks {
            BlockSource::Explicit { block_set } => {
                let mut blocks: Vec<&WeeklyBlock> = block_set.blocks.iter().collect();
                blocks.sort();
                builder.field("blocks", blocks.len());
                for block in blocks {
                    builder.field("dow", block.day_of_week);
                    builder.field("start", block.start_time);
                    builder.field("end", block.end_time);
                }
            }
            BlockSource::DefaultTemplate => builder.field("template", template_tag),
        }

        let in_period =
            |e: &&Exclusion| params.period_start <= e.date && e.date <= params.period_end;
        let mut exclusions: Vec<&Exclusion> =
            params.exclusions.iter().filter(in_period).collect();
        exclusions.sort();
        builder.field("exclusions", exclusions.len());
        for exclusion in exclusions {
            builder.field("date", exclusion.date);
            builder.field("type", exclusion.exclusion_type.priority());
            builder.optional("reason", exclusion.reason.as_deref());
        }

        let mut academies: Vec<&AcademySchedule> = params.academy_schedules.iter().collect();
        academies.sort();
        builder.field("academies", academies.len());
        for academy in academies {
            builder.field("dow", academy.day_of_week);
            builder.field("start", academy.start_time);
            builder.field("end", academy.end_time);
            builder.field("label", &academy.label);
            builder.optional("travel", academy.travel_minutes);
        }

        builder.options(&params.options);
        builder.finish()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    fn field(&mut self, tag: &str, value: impl fmt::Display) {
        let value = value.to_string();
        self.hasher.update(tag.as_bytes());
        self.hasher.update(format!("={}:", value.len()).as_bytes());
        self.hasher.update(value.as_bytes());
        self.hasher.update(b";");
    }

    fn optional(&mut self, tag: &str, value: Option<impl fmt::Display>) {
        match value {
            Some(value) => self.field(tag, value),
            None => self.field("none", tag),
        }
    }

    fn range(&mut self, tag: &str, range: Option<TimeRange>) {
        self.optional(tag, range.map(|r| r.to_string()));
    }

    fn options(&mut self, options: &SchedulerOptions) {
        self.field("review_cadence", options.review_cadence);
        self.field("review_days", options.review_days);
        self.range("self_study_window", options.self_study_window);
        self.field(
            "designated_holiday_self_study_hours",
            options.designated_holiday_self_study_hours.to_bits(),
        );
        self.field(
            "non_study_self_study_hours",
            options.non_study_self_study_hours.to_bits(),
        );
        self.field("default_travel_minutes", options.default_travel_minutes);
    }

    fn finish(self) -> Fingerprint {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&self.hasher.finalize());
        Fingerprint(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{BlockSet, ExclusionType};

    fn params() -> ScheduleParams {
        let blocks = vec![
            WeeklyBlock::new(1, "18:00".parse().unwrap(), "20:00".parse().unwrap()),
            WeeklyBlock::new(3, "18:00".parse().unwrap(), "20:00".parse().unwrap()),
        ];
        let mut params = ScheduleParams::new(
            "2024-01-01".parse().unwrap(),
            "2024-01-31".parse().unwrap(),
            BlockSource::explicit(BlockSet::inline(blocks)),
        );
        params.exclusions = vec![
            Exclusion::new("2024-01-03".parse().unwrap(), ExclusionType::Vacation),
            Exclusion::new("2024-01-10".parse().unwrap(), ExclusionType::Personal),
        ];
        params.academy_schedules = vec![
            AcademySchedule::new(1, "18:00".parse().unwrap(), "19:00".parse().unwrap(), "math"),
            AcademySchedule::new(3, "19:00".parse().unwrap(), "20:00".parse().unwrap(), "english"),
        ];
        params
    }

    #[test]
    fn order_of_unordered_inputs_does_not_matter() {
        let a = params();
        let mut b = params();
        b.exclusions.reverse();
        b.academy_schedules.reverse();
        if let BlockSource::Explicit { block_set } = &mut b.blocks {
            block_set.blocks.reverse();
            block_set.id = "weekly".to_string();
            block_set.name = "Renamed".to_string();
        }
        assert_eq!(Fingerprint::of(&a, "standard@1"), Fingerprint::of(&b, "standard@1"));
    }

    #[test]
    fn every_option_changes_the_fingerprint() {
        let base = Fingerprint::of(&params(), "standard@1");
        let variants: Vec<Box<dyn Fn(&mut ScheduleParams)>> = vec![
            Box::new(|p| p.period_end = "2024-02-01".parse().unwrap()),
            Box::new(|p| p.options.review_cadence = 3),
            Box::new(|p| p.options.designated_holiday_self_study_hours = 2.0),
            Box::new(|p| p.options.non_study_self_study_hours = 1.0),
            Box::new(|p| p.options.default_travel_minutes = 30),
            Box::new(|p| {
                p.options.self_study_window =
                    TimeRange::new("19:00".parse().unwrap(), "20:00".parse().unwrap())
            }),
            Box::new(|p| p.options.review_days = 2),
            Box::new(|p| p.exclusions[0].reason = Some("trip".to_string())),
            Box::new(|p| p.exclusions[0].exclusion_type = ExclusionType::DesignatedHoliday),
            Box::new(|p| p.exclusions[1].date = "2024-01-11".parse().unwrap()),
            Box::new(|p| {
                if let BlockSource::Explicit { block_set } = &mut p.blocks {
                    block_set.blocks[0].end_time = "21:00".parse().unwrap();
                }
            }),
            Box::new(|p| {
                if let BlockSource::Explicit { block_set } = &mut p.blocks {
                    block_set.blocks[1].day_of_week = 4;
                }
            }),
            Box::new(|p| p.blocks = BlockSource::DefaultTemplate),
            Box::new(|p| p.academy_schedules[0].travel_minutes = Some(0)),
            Box::new(|p| p.academy_schedules[0].label = "science".to_string()),
        ];
        for change in variants {
            let mut changed = params();
            change(&mut changed);
            assert_ne!(Fingerprint::of(&changed, "standard@1"), base);
        }
    }

    #[test]
    fn missing_and_empty_values_differ() {
        let mut missing = params();
        let mut empty = params();
        empty.exclusions[0].reason = Some(String::new());
        assert_ne!(Fingerprint::of(&missing, "standard@1"), Fingerprint::of(&empty, "standard@1"));

        missing.academy_schedules[0].travel_minutes = None;
        empty = missing.clone();
        empty.academy_schedules[0].travel_minutes = Some(0);
        assert_ne!(Fingerprint::of(&missing, "standard@1"), Fingerprint::of(&empty, "standard@1"));
    }

    #[test]
    fn exclusions_outside_the_period_are_ignored() {
        let base = params();
        let mut padded = params();
        padded.exclusions.push(Exclusion::new(
            "2023-12-31".parse().unwrap(),
            ExclusionType::Vacation,
        ));
        padded.exclusions.push(Exclusion::new(
            "2024-02-01".parse().unwrap(),
            ExclusionType::Personal,
        ));
        assert_eq!(Fingerprint::of(&base, "standard@1"), Fingerprint::of(&padded, "standard@1"));

        let mut inside = params();
        inside.exclusions.push(Exclusion::new(
            "2024-01-31".parse().unwrap(),
            ExclusionType::Personal,
        ));
        assert_ne!(Fingerprint::of(&base, "standard@1"), Fingerprint::of(&inside, "standard@1"));
    }

    #[test]
    fn template_tag_only_matters_in_template_mode() {
        let explicit = params();
        assert_eq!(
            Fingerprint::of(&explicit, "standard@1"),
            Fingerprint::of(&explicit, "standard@2")
        );

        let mut template = params();
        template.blocks = BlockSource::DefaultTemplate;
        assert_ne!(
            Fingerprint::of(&template, "standard@1"),
            Fingerprint::of(&template, "standard@2")
        );
    }

    #[test]
    fn displays_as_hex() {
        let fp = Fingerprint::of(&params(), "standard@1");
        let hex = fp.to_string();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(hex.starts_with(&fp.short()));
    }
}
