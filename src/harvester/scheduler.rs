//! Job scheduler: runs a run's jobs under a semaphore and reports completion.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::error::FetchError;
use crate::sink::ResultSink;
use crate::types::{Event, Job};

use super::fetch_task::{FetchTaskContext, fetch_one};
use super::{ImageHarvester, RunState, RunTracker};

/// Settles one job when dropped
///
/// Holds the job's semaphore slot (if it got one) and pushes exactly one
/// `Progress` event on every path out of the job, panics included.
pub(crate) struct CompletionGuard {
    permit: Option<OwnedSemaphorePermit>,
    sink: Arc<ResultSink>,
    tracker: Arc<RunTracker>,
}

impl CompletionGuard {
    pub(crate) fn new(
        permit: Option<OwnedSemaphorePermit>,
        sink: Arc<ResultSink>,
        tracker: Arc<RunTracker>,
    ) -> Self {
        Self {
            permit,
            sink,
            tracker,
        }
    }

    fn has_slot(&self) -> bool {
        self.permit.is_some()
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let total = self.tracker.total;
        let tracker = &self.tracker;
        self.sink.push_with(|| Event::Progress {
            done: tracker.done.fetch_add(1, Ordering::SeqCst) + 1,
            total,
        });
        // Slot is released after the progress event is queued
        self.permit.take();
    }
}

impl ImageHarvester {
    /// Spawn the scheduling task for a run
    ///
    /// The task:
    /// 1. Acquires a slot for each job in order (FIFO admission), racing cancellation
    /// 2. Spawns the job holding its slot and completion guard
    /// 3. Waits for every job to settle
    /// 4. Returns the harvester to idle and pushes `Complete`
    pub(crate) fn spawn_scheduler(
        &self,
        ctx: Arc<FetchTaskContext>,
        jobs: Vec<Job>,
        max_concurrency: usize,
        tracker: Arc<RunTracker>,
    ) -> tokio::task::JoinHandle<()> {
        let run_state = Arc::clone(&self.run_state);

        tokio::spawn(async move {
            run_all(Arc::clone(&ctx), jobs, max_concurrency, Arc::clone(&tracker)).await;

            // Idle before Complete, both under the state lock
            let mut state = run_state.lock().await;
            *state = RunState::Idle;
            ctx.sink.push(Event::Complete);
            drop(state);

            tracing::info!(
                done = tracker.done.load(Ordering::SeqCst),
                total = tracker.total,
                cancelled = ctx.cancel_token.is_cancelled(),
                "Harvest run complete"
            );
        })
    }
}

/// Run every job with at most `max_concurrency` in flight
///
/// Returns once every job has settled.
pub(crate) async fn run_all(
    ctx: Arc<FetchTaskContext>,
    jobs: Vec<Job>,
    max_concurrency: usize,
    tracker: Arc<RunTracker>,
) {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for job in jobs {
        let permit = tokio::select! {
            biased;
            _ = ctx.cancel_token.cancelled() => None,
            permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
        };

        let guard = CompletionGuard::new(permit, Arc::clone(&ctx.sink), Arc::clone(&tracker));
        if !guard.has_slot() {
            tracing::debug!(url = %job.url, "Job cancelled before start");
            drop(guard);
            continue;
        }

        let ctx = Arc::clone(&ctx);
        tasks.spawn(async move {
            let _guard = guard;
            match fetch_one(&ctx, &job).await {
                Ok(id) => tracing::debug!(url = %job.url, image_id = %id, "Job delivered"),
                Err(FetchError::Cancelled) => {
                    tracing::debug!(url = %job.url, "Job cancelled in flight")
                }
                Err(e) => tracing::warn!(url = %job.url, error = %e, "Skipping job"),
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            // Progress was already pushed by the job's guard
            tracing::warn!(error = %e, "Fetch task failed");
        }
    }
}
