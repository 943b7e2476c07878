//! # Studyplan Core Library
//!
//! This library provides the study-schedule availability engine. It is
//! CLI-first: every operation is reachable from the standalone CLI binary,
//! and other front ends are thin layers over the same library.
//!
//! ## Architecture
//!
//! - **Availability**: a pure function from a period, a weekly template,
//!   exclusions, academy schedules and options to a day-by-day schedule
//!   with period totals
//! - **Cache**: fingerprinted results with single-flight computation and an
//!   explicit eviction policy
//! - **Debounce**: collapses bursts of parameter edits into one computation
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`compute_schedule_availability`]: the engine entry point
//! - [`ScheduleCache`]: cache and request coalescer
//! - [`Config`]: application configuration management
//! - [`LabelTable`]: display strings per locale

pub mod availability;
pub mod cache;
pub mod collaborators;
pub mod debounce;
pub mod error;
pub mod interval;
pub mod labels;
pub mod schedule;
pub mod storage;

pub use availability::{
    compute_schedule_availability, compute_with_provider, ScheduleAvailabilityResult,
    ScheduleParams, ScheduleRequest, ScheduleSummary,
};
pub use cache::{AvailabilityEngine, CacheEntry, CachePolicy, CacheStats, Fingerprint, ScheduleCache, ScheduleEngine};
pub use collaborators::{
    BlockSetStore, DefaultBlockProvider, InMemoryBlockSetStore, InMemorySnapshotSink, JsonFileSink,
    SnapshotSink, StandardTemplate,
};
pub use debounce::{spawn_debounced, DebouncedOutcome, Debouncer};
pub use error::{ConfigError, CoreError, SchedulingError};
pub use interval::{TimeOfDay, TimeRange};
pub use labels::{LabelTable, Locale};
pub use schedule::{
    AcademySchedule, BlockSet, BlockSource, DailySchedule, DayType, Exclusion, ExclusionType,
    Period, SchedulerOptions, SlotType, TimeSlot, WeeklyBlock,
};
pub use storage::Config;
