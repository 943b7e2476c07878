//! Core error types for studyplan-core.
//!
//! This module defines the error hierarchy using thiserror. Scheduling
//! errors are cheap to clone so that a single failed computation can be
//! handed to every caller waiting on the same cache fingerprint.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::interval::TimeOfDay;

/// Where a malformed interval or weekday was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// A weekly availability block
    Block,
    /// A recurring academy schedule
    Academy,
    /// The self-study window from the scheduler options
    SelfStudyWindow,
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputSource::Block => "weekly block",
            InputSource::Academy => "academy schedule",
            InputSource::SelfStudyWindow => "self-study window",
        };
        f.write_str(name)
    }
}

/// Errors produced while computing a schedule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    /// The period ends before it starts
    #[error("Invalid period: end date ({end}) is before start date ({start})")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    /// No block set, inline blocks or default template could be resolved
    #[error("No weekly template available: supply a block set, inline blocks, or enable template mode")]
    MissingTemplate,

    /// An interval with `start >= end`
    #[error("Malformed {origin} interval on day {day_of_week:?}: start ({start}) must be before end ({end})")]
    MalformedInterval {
        origin: InputSource,
        day_of_week: Option<u8>,
        start: TimeOfDay,
        end: TimeOfDay,
    },

    /// A weekday outside 0 (Sunday) ..= 6 (Saturday)
    #[error("Invalid day of week {value} in {origin}: expected 0 (Sunday) through 6 (Saturday)")]
    InvalidDayOfWeek { origin: InputSource, value: u8 },

    /// A time-of-day string that is not `HH:MM` within a day
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    /// A scheduler option outside its allowed range
    #[error("Invalid scheduler option '{name}': {message}")]
    InvalidOption { name: String, message: String },

    /// The computation ended without producing a result
    #[error("Schedule computation aborted before completion")]
    ComputationAborted,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Core error type for studyplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Scheduling errors
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
