//! Debounced recomputation for interactive parameter editing.
//!
//! Parameter edits are pushed into a channel. After the first edit the
//! background task waits until no new edit arrives for the quiet period,
//! then computes only the latest parameters through the cache and publishes
//! the outcome. Closing the debouncer flushes a pending edit.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::availability::ScheduleParams;
use crate::cache::{AvailabilityEngine, CacheEntry, ScheduleCache, ScheduleEngine};
use crate::error::SchedulingError;

/// Quiet period used when none is configured.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// One published computation.
#[derive(Debug, Clone)]
pub struct DebouncedOutcome {
    /// Increments with every published outcome, starting at 1
    pub generation: u64,
    /// Number of edits collapsed into this computation
    pub updates: usize,
    pub outcome: Result<Arc<CacheEntry>, SchedulingError>,
}

/// Handle to a running debounce task.
pub struct Debouncer {
    updates: mpsc::UnboundedSender<ScheduleParams>,
    outcomes: watch::Receiver<Option<DebouncedOutcome>>,
    task: JoinHandle<()>,
}

/// Spawn a debounce task computing through `cache`.
pub fn spawn_debounced<E: ScheduleEngine>(cache: ScheduleCache<E>, quiet: Duration) -> Debouncer {
    let (updates, rx) = mpsc::unbounded_channel();
    let (tx, outcomes) = watch::channel(None);
    let task = tokio::spawn(run(cache, quiet, rx, tx));
    Debouncer {
        updates,
        outcomes,
        task,
    }
}

impl Debouncer {
    /// Debouncer over the production engine.
    pub fn standard(cache: ScheduleCache<AvailabilityEngine>, quiet: Duration) -> Self {
        spawn_debounced(cache, quiet)
    }

    /// Queue an edit. Returns false once the task has stopped.
    pub fn submit(&self, params: ScheduleParams) -> bool {
        self.updates.send(params).is_ok()
    }

    /// Receiver of published outcomes; `None` until the first one.
    pub fn subscribe(&self) -> watch::Receiver<Option<DebouncedOutcome>> {
        self.outcomes.clone()
    }

    /// The most recently published outcome.
    pub fn latest(&self) -> Option<DebouncedOutcome> {
        self.outcomes.borrow().clone()
    }

    /// Stop accepting edits, compute any pending one and wait for the task.
    pub async fn close(self) -> Option<DebouncedOutcome> {
        let Debouncer {
            updates,
            outcomes,
            task,
        } = self;
        drop(updates);
        if let Err(err) = task.await {
            debug!(error = %err, "debounce task ended abnormally");
        }
        let latest = outcomes.borrow().clone();
        latest
    }
}

async fn run<E: ScheduleEngine>(
    cache: ScheduleCache<E>,
    quiet: Duration,
    mut rx: mpsc::UnboundedReceiver<ScheduleParams>,
    tx: watch::Sender<Option<DebouncedOutcome>>,
) {
    let mut generation = 0u64;

    while let Some(mut latest) = rx.recv().await {
        let mut updates = 1usize;
        loop {
            match tokio::time::timeout(quiet, rx.recv()).await {
                Ok(Some(next)) => {
                    latest = next;
                    updates += 1;
                }
                // Sender closed: flush what we have
                Ok(None) => break,
                Err(_) => break,
            }
        }

        generation += 1;
        debug!(generation, updates, "debounced recompute");
        let outcome = cache.compute(latest).await;
        tx.send_replace(Some(DebouncedOutcome {
            generation,
            updates,
            outcome,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::ScheduleAvailabilityResult;
    use crate::cache::CachePolicy;
    use crate::schedule::BlockSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl ScheduleEngine for Counting {
        fn template_tag(&self) -> String {
            "test@1".to_string()
        }

        fn compute(
            &self,
            params: &ScheduleParams,
        ) -> Result<ScheduleAvailabilityResult, SchedulingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            AvailabilityEngine::default().compute(params)
        }
    }

    fn params(end: &str) -> ScheduleParams {
        ScheduleParams::new(
            "2024-01-01".parse().unwrap(),
            end.parse().unwrap(),
            BlockSource::DefaultTemplate,
        )
    }

    fn period_days(outcome: &DebouncedOutcome) -> usize {
        outcome
            .outcome
            .as_ref()
            .map(|entry| entry.result.summary.total_days)
            .unwrap_or(0)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_computes_once() {
        let cache = ScheduleCache::new(Counting::default(), CachePolicy::Latest);
        let debouncer = spawn_debounced(cache.clone(), DEFAULT_QUIET_PERIOD);
        let mut outcomes = debouncer.subscribe();

        for end in ["2024-01-05", "2024-01-06", "2024-01-07"] {
            assert!(debouncer.submit(params(end)));
        }

        let outcome = outcomes
            .wait_for(Option::is_some)
            .await
            .unwrap()
            .clone()
            .unwrap();
        assert_eq!(outcome.generation, 1);
        assert_eq!(outcome.updates, 3);
        assert_eq!(period_days(&outcome), 7);
        assert_eq!(cache.engine().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_after_quiet_period_compute_again() {
        let cache = ScheduleCache::new(Counting::default(), CachePolicy::Latest);
        let debouncer = spawn_debounced(cache.clone(), Duration::from_millis(200));
        let mut outcomes = debouncer.subscribe();

        debouncer.submit(params("2024-01-03"));
        outcomes
            .wait_for(|o| o.as_ref().is_some_and(|o| o.generation == 1))
            .await
            .unwrap();

        debouncer.submit(params("2024-01-04"));
        let second = outcomes
            .wait_for(|o| o.as_ref().is_some_and(|o| o.generation == 2))
            .await
            .unwrap()
            .clone()
            .unwrap();
        assert_eq!(second.updates, 1);
        assert_eq!(period_days(&second), 4);
        assert_eq!(cache.engine().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn close_flushes_pending_edit() {
        let cache = ScheduleCache::new(Counting::default(), CachePolicy::Latest);
        let debouncer = spawn_debounced(cache, Duration::from_secs(60));

        debouncer.submit(params("2024-01-10"));
        let last = debouncer.close().await.unwrap();
        assert_eq!(last.generation, 1);
        assert_eq!(period_days(&last), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_are_published() {
        let debouncer = Debouncer::standard(ScheduleCache::standard(CachePolicy::Latest), DEFAULT_QUIET_PERIOD);
        let mut inverted = params("2024-01-10");
        inverted.period_end = "2023-01-01".parse().unwrap();
        debouncer.submit(inverted);

        let last = debouncer.close().await.unwrap();
        assert!(matches!(last.outcome, Err(SchedulingError::InvalidPeriod { .. })));
    }
}
