//! External collaborators of the availability engine.
//!
//! The engine only sees these through traits: a store that resolves block
//! set ids, the provider of the default weekly template, and a sink that
//! keeps computed snapshots next to plan records. Snapshots are write-only
//! from the engine's point of view; schedules are always recomputed from
//! their source parameters.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::availability::ScheduleAvailabilityResult;
use crate::error::{CoreError, Result};
use crate::interval::TimeOfDay;
use crate::schedule::{BlockSet, WeeklyBlock};

/// Looks up stored block sets by id.
pub trait BlockSetStore: Send + Sync {
    fn block_set(&self, id: &str) -> Option<BlockSet>;
}

/// Supplies the weekly template used in template mode.
pub trait DefaultBlockProvider: Send + Sync {
    /// Identifier folded into cache fingerprints, e.g. "standard@1".
    /// Must change whenever `blocks()` changes.
    fn template_tag(&self) -> String;

    fn blocks(&self) -> Vec<WeeklyBlock>;
}

/// Stores computed schedules alongside plan records.
pub trait SnapshotSink: Send + Sync {
    fn store(&self, plan_id: &str, snapshot: &ScheduleAvailabilityResult) -> Result<()>;
}

/// Block sets held in memory, keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryBlockSetStore {
    sets: HashMap<String, BlockSet>,
}

impl InMemoryBlockSetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block_set: BlockSet) {
        self.sets.insert(block_set.id.clone(), block_set);
    }

    /// Parse a JSON array of block sets.
    pub fn from_json(json: &str) -> Result<Self> {
        let sets: Vec<BlockSet> = serde_json::from_str(json)?;
        let mut store = Self::new();
        for set in sets {
            store.insert(set);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl BlockSetStore for InMemoryBlockSetStore {
    fn block_set(&self, id: &str) -> Option<BlockSet> {
        self.sets.get(id).cloned()
    }
}

/// Version of the built-in standard template. Bump when its blocks change.
pub const STANDARD_TEMPLATE_VERSION: u32 = 1;

/// The built-in default template: a camp day on every weekday,
/// 10:00-12:00 and 13:00-19:00 with a lunch break in between.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTemplate;

impl DefaultBlockProvider for StandardTemplate {
    fn template_tag(&self) -> String {
        format!("standard@{STANDARD_TEMPLATE_VERSION}")
    }

    fn blocks(&self) -> Vec<WeeklyBlock> {
        let at = |h| TimeOfDay::from_hm(h, 0).unwrap_or(TimeOfDay::MIDNIGHT);
        (0..7u8)
            .flat_map(|day| {
                [
                    WeeklyBlock::new(day, at(10), at(12)),
                    WeeklyBlock::new(day, at(13), at(19)),
                ]
            })
            .collect()
    }
}

/// Keeps snapshots in memory; useful for previews and tests.
#[derive(Debug, Default)]
pub struct InMemorySnapshotSink {
    snapshots: Mutex<HashMap<String, ScheduleAvailabilityResult>>,
}

impl InMemorySnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last snapshot stored for `plan_id`.
    pub fn get(&self, plan_id: &str) -> Option<ScheduleAvailabilityResult> {
        self.snapshots
            .lock()
            .ok()
            .and_then(|map| map.get(plan_id).cloned())
    }
}

impl SnapshotSink for InMemorySnapshotSink {
    fn store(&self, plan_id: &str, snapshot: &ScheduleAvailabilityResult) -> Result<()> {
        let mut map = self
            .snapshots
            .lock()
            .map_err(|_| CoreError::Custom("snapshot store lock poisoned".to_string()))?;
        map.insert(plan_id.to_string(), snapshot.clone());
        Ok(())
    }
}

/// Writes each snapshot as pretty JSON to `<dir>/<plan_id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, plan_id: &str) -> PathBuf {
        self.dir.join(format!("{plan_id}.json"))
    }
}

impl SnapshotSink for JsonFileSink {
    fn store(&self, plan_id: &str, snapshot: &ScheduleAvailabilityResult) -> Result<()> {
        if plan_id.is_empty() || plan_id.contains(['/', '\\']) || plan_id.starts_with('.') {
            return Err(CoreError::Custom(format!("invalid plan id: {plan_id:?}")));
        }
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(self.path_for(plan_id), json)?;
        Ok(())
    }
}
