//! Run control for a harvest run (start, stop and progress).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;

use crate::config::MAX_CONCURRENCY;
use crate::error::{Error, Result};
use crate::template;
use crate::types::{RunProgress, RunStarted, TemplateSpec};

use super::fetch_task::FetchTaskContext;
use super::{ActiveRun, ImageHarvester, RunState, RunTracker};

impl ImageHarvester {
    /// Start a harvest run
    ///
    /// Expands the template, clears the image cache and any events the previous
    /// run left undrained, then spawns the scheduler. Returns as soon as the run
    /// is scheduled; results arrive as events.
    ///
    /// `concurrency` overrides the configured `max_concurrency` for this run and
    /// is clamped to `1..=MAX_CONCURRENCY`.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRunning`] if a run is in flight (nothing is changed)
    /// - [`Error::Template`] if the template cannot be expanded
    /// - [`Error::ShuttingDown`] after [`shutdown`](Self::shutdown)
    pub async fn start(
        &self,
        spec: TemplateSpec,
        concurrency: Option<usize>,
    ) -> Result<RunStarted> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let mut state = self.run_state.lock().await;
        if matches!(*state, RunState::Running(_)) {
            return Err(Error::AlreadyRunning);
        }

        let jobs = template::expand(&spec)?;
        let job_count = jobs.len();
        let concurrency = concurrency
            .unwrap_or(self.config.fetch.max_concurrency)
            .clamp(1, MAX_CONCURRENCY);

        self.sink.clear_cache();

        // Subscribe-only consumers never drain; the queue holds one run at most
        let stale = self.sink.drain_all().len();
        if stale > 0 {
            tracing::debug!(stale, "Discarding undrained events from the previous run");
        }

        let cancel_token = CancellationToken::new();
        let tracker = Arc::new(RunTracker {
            done: AtomicUsize::new(0),
            total: job_count,
        });
        *state = RunState::Running(ActiveRun {
            cancel_token: cancel_token.clone(),
            tracker: Arc::clone(&tracker),
        });

        let ctx = Arc::new(FetchTaskContext {
            client: self.client.clone(),
            sink: Arc::clone(&self.sink),
            classifier: self.classifier.clone(),
            probe: Arc::clone(&self.probe),
            cancel_token,
        });

        tracing::info!(job_count, concurrency, "Starting harvest run");

        self.spawn_scheduler(ctx, jobs, concurrency, tracker);

        Ok(RunStarted { job_count })
    }

    /// Cancel the active run
    ///
    /// Jobs waiting for a slot settle immediately and in-flight requests are
    /// aborted. The run still ends with exactly one `Complete` event, after
    /// which the harvester is idle again. Returns `false` when no run was active.
    pub async fn stop(&self) -> bool {
        let state = self.run_state.lock().await;
        match &*state {
            RunState::Running(run) => {
                if !run.cancel_token.is_cancelled() {
                    tracing::info!(
                        done = run.tracker.done.load(Ordering::SeqCst),
                        total = run.tracker.total,
                        "Stopping harvest run"
                    );
                    run.cancel_token.cancel();
                }
                true
            }
            RunState::Idle => {
                tracing::debug!("Stop requested with no active run");
                false
            }
        }
    }

    /// Whether a run is in flight
    pub async fn is_running(&self) -> bool {
        matches!(*self.run_state.lock().await, RunState::Running(_))
    }

    /// Progress of the active run, if any
    pub async fn progress(&self) -> Option<RunProgress> {
        match &*self.run_state.lock().await {
            RunState::Running(run) => Some(RunProgress {
                done: run.tracker.done.load(Ordering::SeqCst),
                total: run.tracker.total,
            }),
            RunState::Idle => None,
        }
    }
}
