//! Application state for the API server

use crate::{Config, ImageHarvester};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the harvester instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The main ImageHarvester instance
    pub harvester: Arc<ImageHarvester>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(harvester: Arc<ImageHarvester>, config: Arc<Config>) -> Self {
        Self { harvester, config }
    }
}
