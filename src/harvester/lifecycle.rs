//! Cache export and shutdown coordination.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::error::{Error, Result};

use super::ImageHarvester;

/// Longest `shutdown` waits for a cancelled run to settle
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl ImageHarvester {
    /// Write every cached image to `dir` as `<id>.png`
    ///
    /// Creates `dir` if needed and returns the number of files written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be created or a file
    /// cannot be written.
    pub async fn save_cache(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create directory '{}': {}", dir.display(), e),
            ))
        })?;

        let images = self.sink.cached_images();
        for (id, bytes) in &images {
            let path = dir.join(format!("{}.png", id));
            tokio::fs::write(&path, bytes).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write '{}': {}", path.display(), e),
                ))
            })?;
        }

        tracing::info!(count = images.len(), dir = %dir.display(), "Saved image cache");
        Ok(images.len())
    }

    /// Gracefully shut down the harvester
    ///
    /// 1. Stops accepting new runs
    /// 2. Cancels the active run, if any
    /// 3. Waits (up to 30 seconds) for the run to settle
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);

        if self.stop().await {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_idle()).await {
                Ok(()) => tracing::info!("Active run settled"),
                Err(_) => tracing::warn!("Timeout waiting for active run, proceeding with shutdown"),
            }
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    async fn wait_for_idle(&self) {
        while self.is_running().await {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
