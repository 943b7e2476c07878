//! Display strings for day and slot types.
//!
//! The engine only deals in `DayType` and `SlotType`; presentation layers
//! pick a `LabelTable` for their locale.

use serde::{Deserialize, Serialize};

use crate::schedule::{DayType, SlotType};

/// Supported display locales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ko" => Ok(Locale::Ko),
            other => Err(format!("unknown locale '{other}', expected 'en' or 'ko'")),
        }
    }
}

/// Mapping from schedule enums to display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelTable {
    vacation: &'static str,
    personal: &'static str,
    designated_holiday: &'static str,
    review: &'static str,
    study: &'static str,
    non_study: &'static str,
    study_slot: &'static str,
    self_study_slot: &'static str,
    travel_slot: &'static str,
    academy_slot: &'static str,
}

impl LabelTable {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self::english(),
            Locale::Ko => Self::korean(),
        }
    }

    pub const fn english() -> Self {
        Self {
            vacation: "Vacation",
            personal: "Personal",
            designated_holiday: "Designated holiday",
            review: "Review",
            study: "Study",
            non_study: "Non-study",
            study_slot: "Study",
            self_study_slot: "Self-study",
            travel_slot: "Travel",
            academy_slot: "Academy",
        }
    }

    pub const fn korean() -> Self {
        Self {
            vacation: "휴가",
            personal: "개인일정",
            designated_holiday: "지정휴일",
            review: "복습일",
            study: "학습일",
            non_study: "비학습일",
            study_slot: "학습시간",
            self_study_slot: "자율학습",
            travel_slot: "이동시간",
            academy_slot: "학원일정",
        }
    }

    pub fn day_type(&self, day_type: DayType) -> &'static str {
        match day_type {
            DayType::Vacation => self.vacation,
            DayType::Personal => self.personal,
            DayType::DesignatedHoliday => self.designated_holiday,
            DayType::Review => self.review,
            DayType::Study => self.study,
            DayType::NonStudy => self.non_study,
        }
    }

    pub fn slot_type(&self, slot_type: SlotType) -> &'static str {
        match slot_type {
            SlotType::Study => self.study_slot,
            SlotType::SelfStudy => self.self_study_slot,
            SlotType::Travel => self.travel_slot,
            SlotType::Academy => self.academy_slot,
        }
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::english()
    }
}
