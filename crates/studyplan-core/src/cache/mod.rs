//! Fingerprinted schedule cache with single-flight computation.
//!
//! Results are keyed by a [`Fingerprint`] of the parameters. A ready entry
//! is handed out as the same `Arc` on every hit. While a fingerprint is
//! being computed, later callers wait on a `watch` channel for the first
//! caller's outcome instead of starting their own computation. The map lock
//! is never held during computation or across an await.

mod fingerprint;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::availability::{compute_with_provider, ScheduleAvailabilityResult, ScheduleParams};
use crate::collaborators::{DefaultBlockProvider, StandardTemplate};
use crate::error::SchedulingError;

pub use fingerprint::Fingerprint;

/// Computes schedules for the cache.
pub trait ScheduleEngine: Send + Sync + 'static {
    /// Tag of the default template, folded into fingerprints.
    fn template_tag(&self) -> String;

    fn compute(&self, params: &ScheduleParams)
        -> Result<ScheduleAvailabilityResult, SchedulingError>;
}

/// The production engine.
#[derive(Clone)]
pub struct AvailabilityEngine {
    provider: Arc<dyn DefaultBlockProvider>,
}

impl AvailabilityEngine {
    pub fn new(provider: Arc<dyn DefaultBlockProvider>) -> Self {
        Self { provider }
    }
}

impl Default for AvailabilityEngine {
    fn default() -> Self {
        Self::new(Arc::new(StandardTemplate))
    }
}

impl ScheduleEngine for AvailabilityEngine {
    fn template_tag(&self) -> String {
        self.provider.template_tag()
    }

    fn compute(
        &self,
        params: &ScheduleParams,
    ) -> Result<ScheduleAvailabilityResult, SchedulingError> {
        compute_with_provider(params, self.provider.as_ref())
    }
}

/// An immutable computed result.
#[derive(Debug)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub result: ScheduleAvailabilityResult,
    pub computed_at: DateTime<Utc>,
}

/// Which ready entries the cache keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CachePolicy {
    /// Keep everything for the lifetime of the cache
    Session,
    /// Keep at most `capacity` entries, evicting the least recently used
    Lru { capacity: usize },
    /// Keep only the most recently computed entry
    Latest,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Lru { capacity: 128 }
    }
}

/// Counters since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Calls that waited on an in-flight computation
    pub coalesced: u64,
}

type Outcome = Result<Arc<CacheEntry>, SchedulingError>;

enum Slot {
    Ready { entry: Arc<CacheEntry>, last_used: u64 },
    Pending(watch::Receiver<Option<Outcome>>),
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<Fingerprint, Slot>,
    tick: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn ready_len(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { .. }))
            .count()
    }
}

struct CacheInner<E> {
    engine: E,
    policy: CachePolicy,
    state: Mutex<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

/// Schedule cache shared between callers; cloning shares the same entries.
pub struct ScheduleCache<E: ScheduleEngine = AvailabilityEngine> {
    inner: Arc<CacheInner<E>>,
}

impl<E: ScheduleEngine> Clone for ScheduleCache<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ScheduleCache<AvailabilityEngine> {
    /// A cache over the production engine with the standard template.
    pub fn standard(policy: CachePolicy) -> Self {
        Self::new(AvailabilityEngine::default(), policy)
    }
}

impl<E: ScheduleEngine> ScheduleCache<E> {
    pub fn new(engine: E, policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                engine,
                policy,
                state: Mutex::new(CacheState::default()),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                coalesced: AtomicU64::new(0),
            }),
        }
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    pub fn policy(&self) -> CachePolicy {
        self.inner.policy
    }

    /// Fingerprint `params` the way this cache keys them.
    pub fn fingerprint(&self, params: &ScheduleParams) -> Fingerprint {
        Fingerprint::of(params, &self.inner.engine.template_tag())
    }

    /// Return the cached result for `params`, computing it if needed.
    ///
    /// Identical parameters computed concurrently run the engine once and
    /// every caller receives the same outcome. Failures are not cached.
    pub async fn compute(&self, params: ScheduleParams) -> Outcome {
        let fingerprint = self.fingerprint(&params);

        let mut rx = {
            let mut guard = self.inner.lock();
            let state = &mut *guard;
            let tick = state.next_tick();
            match state.slots.get_mut(&fingerprint) {
                Some(Slot::Ready { entry, last_used }) => {
                    *last_used = tick;
                    self.inner.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(fingerprint = %fingerprint.short(), "schedule cache hit");
                    return Ok(Arc::clone(entry));
                }
                Some(Slot::Pending(rx)) => {
                    self.inner.coalesced.fetch_add(1, Ordering::Relaxed);
                    debug!(fingerprint = %fingerprint.short(), "joining in-flight computation");
                    rx.clone()
                }
                None => {
                    self.inner.misses.fetch_add(1, Ordering::Relaxed);
                    debug!(fingerprint = %fingerprint.short(), "schedule cache miss");
                    let (tx, rx) = watch::channel(None);
                    state.slots.insert(fingerprint, Slot::Pending(rx.clone()));
                    let inner = Arc::clone(&self.inner);
                    tokio::task::spawn_blocking(move || inner.run(fingerprint, params, tx));
                    rx
                }
            }
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        outcome.unwrap_or(Err(SchedulingError::ComputationAborted))
    }

    /// Drop every ready entry. In-flight computations still complete.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state
            .slots
            .retain(|_, slot| matches!(slot, Slot::Pending(_)));
    }

    /// Number of ready entries.
    pub fn len(&self) -> usize {
        self.inner.lock().ready_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            coalesced: self.inner.coalesced.load(Ordering::Relaxed),
        }
    }
}

impl<E: ScheduleEngine> CacheInner<E> {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs on a blocking worker: compute, store, publish.
    fn run(
        &self,
        fingerprint: Fingerprint,
        params: ScheduleParams,
        tx: watch::Sender<Option<Outcome>>,
    ) {
        let pending = PendingGuard {
            inner: self,
            fingerprint,
            armed: true,
        };

        let outcome = self.engine.compute(&params).map(|result| {
            Arc::new(CacheEntry {
                fingerprint,
                result,
                computed_at: Utc::now(),
            })
        });

        {
            let mut guard = self.lock();
            let state = &mut *guard;
            match &outcome {
                Ok(entry) => {
                    let last_used = state.next_tick();
                    state.slots.insert(
                        fingerprint,
                        Slot::Ready {
                            entry: Arc::clone(entry),
                            last_used,
                        },
                    );
                    self.evict(state, fingerprint);
                }
                Err(err) => {
                    state.slots.remove(&fingerprint);
                    debug!(fingerprint = %fingerprint.short(), error = %err, "schedule computation failed");
                }
            }
        }

        pending.disarm();
        tx.send_replace(Some(outcome));
    }

    fn evict(&self, state: &mut CacheState, keep: Fingerprint) {
        match self.policy {
            CachePolicy::Session => {}
            CachePolicy::Latest => {
                state
                    .slots
                    .retain(|fp, slot| *fp == keep || matches!(slot, Slot::Pending(_)));
            }
            CachePolicy::Lru { capacity } => {
                let capacity = capacity.max(1);
                while state.ready_len() > capacity {
                    let oldest = state
                        .slots
                        .iter()
                        .filter_map(|(fp, slot)| match slot {
                            Slot::Ready { last_used, .. } if *fp != keep => Some((*last_used, *fp)),
                            _ => None,
                        })
                        .min();
                    match oldest {
                        Some((_, fp)) => {
                            debug!(fingerprint = %fp.short(), "evicting schedule");
                            state.slots.remove(&fp);
                        }
                        None => break,
                    }
                }
            }
        }
    }
}

/// Removes the pending slot if the computation unwinds.
struct PendingGuard<'a, E> {
    inner: &'a CacheInner<E>,
    fingerprint: Fingerprint,
    armed: bool,
}

impl<E> PendingGuard<'_, E> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<E> Drop for PendingGuard<'_, E> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if matches!(state.slots.get(&self.fingerprint), Some(Slot::Pending(_))) {
            state.slots.remove(&self.fingerprint);
        }
    }
}
