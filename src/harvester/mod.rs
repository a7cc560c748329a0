//! Harvest orchestration split into focused submodules.
//!
//! The `ImageHarvester` struct and its methods are organized by concern:
//! - [`run`] - Run control (start/stop/progress)
//! - [`scheduler`] - Bounded-concurrency job scheduling
//! - [`fetch_task`] - Single-job fetch, classification and reporting
//! - [`lifecycle`] - Cache export and shutdown coordination

mod fetch_task;
mod lifecycle;
mod run;
mod scheduler;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::TagReader;
use crate::probe::{CodecProbe, ImageProbe};
use crate::provenance::{Classification, ProvenanceClassifier};
use crate::sink::ResultSink;
use crate::types::{Event, ImageId};

/// Counters for the active run, shared by the scheduler and its completion guards
#[derive(Debug)]
pub(crate) struct RunTracker {
    /// Jobs settled so far
    pub(crate) done: AtomicUsize,
    /// Jobs in the run
    pub(crate) total: usize,
}

/// Bookkeeping for a run in flight
#[derive(Debug, Clone)]
pub(crate) struct ActiveRun {
    pub(crate) cancel_token: CancellationToken,
    pub(crate) tracker: Arc<RunTracker>,
}

/// Whether a run is in flight
#[derive(Debug, Clone, Default)]
pub(crate) enum RunState {
    #[default]
    Idle,
    Running(ActiveRun),
}

/// Main harvester instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ImageHarvester {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// HTTP client carrying the configured timeout and user agent
    pub(crate) client: reqwest::Client,
    /// Event queue, broadcast channel and image cache
    pub(crate) sink: Arc<ResultSink>,
    /// Metadata classifier applied to every downloaded body
    pub(crate) classifier: ProvenanceClassifier,
    /// Dimension probe applied to every downloaded body
    pub(crate) probe: Arc<dyn ImageProbe>,
    /// Idle/Running state; transitions happen under this lock
    pub(crate) run_state: Arc<tokio::sync::Mutex<RunState>>,
    /// Flag to indicate whether new runs are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl ImageHarvester {
    /// Create a new ImageHarvester with the default tag reader and image probe
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid settings and [`Error::Network`] if
    /// the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_collaborators(config, ProvenanceClassifier::default(), Arc::new(CodecProbe))
    }

    /// Create a harvester reading metadata through a custom [`TagReader`]
    pub fn with_tag_reader(config: Config, reader: Arc<dyn TagReader>) -> Result<Self> {
        Self::with_collaborators(
            config,
            ProvenanceClassifier::new(reader),
            Arc::new(CodecProbe),
        )
    }

    /// Create a harvester with explicit classifier and probe implementations
    pub fn with_collaborators(
        config: Config,
        classifier: ProvenanceClassifier,
        probe: Arc<dyn ImageProbe>,
    ) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.fetch.request_timeout)
            .user_agent(config.fetch.user_agent.clone())
            .build()?;

        let sink = Arc::new(ResultSink::new(config.fetch.event_buffer));

        Ok(Self {
            config: Arc::new(config),
            client,
            sink,
            classifier,
            probe,
            run_state: Arc::new(tokio::sync::Mutex::new(RunState::Idle)),
            accepting_new: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Subscribe to harvest events
    ///
    /// Every event also stays in the polling queue until drained with
    /// [`poll_events`](Self::poll_events).
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.sink.subscribe()
    }

    /// Drain every event enqueued since the last poll
    pub fn poll_events(&self) -> Vec<Event> {
        self.sink.drain_all()
    }

    /// Bytes of a cached image
    pub fn cached_bytes(&self, id: &ImageId) -> Option<Bytes> {
        self.sink.cached_bytes(id)
    }

    /// Re-run classification on a cached image
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no image is cached under `id`.
    pub fn provenance(&self, id: &ImageId) -> Result<Classification> {
        let bytes = self
            .sink
            .cached_bytes(id)
            .ok_or_else(|| Error::NotFound(format!("image {}", id)))?;
        Ok(self.classifier.classify(&bytes))
    }
}

impl std::fmt::Debug for ImageHarvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHarvester")
            .field("config", &self.config)
            .field("cached_images", &self.sink.cache_len())
            .finish_non_exhaustive()
    }
}
