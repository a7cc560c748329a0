//! # image-harvest
//!
//! Template-driven batch image fetcher with NovelAI provenance classification.
//!
//! ## Design Philosophy
//!
//! image-harvest is designed to be:
//! - **Template-driven** - One URL template plus value lists expands into every job
//! - **Bounded** - Runs never exceed their concurrency budget and can be stopped at any time
//! - **Library-first** - No UI, just a crate plus an optional JSON API for a front end
//! - **Event-driven** - Consumers poll or subscribe; per-job failures never abort a run
//!
//! ## Quick Start
//!
//! ```no_run
//! use image_harvest::{Config, Event, ImageHarvester, TemplateSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let harvester = ImageHarvester::new(Config::default())?;
//!
//!     let spec = TemplateSpec {
//!         base_url: "https://example.com/gallery/".to_string(),
//!         template: "{name}_{num}.png".to_string(),
//!         names: vec!["alice".to_string(), "bob".to_string()],
//!         num_start: 1,
//!         num_end: 10,
//!         ..Default::default()
//!     };
//!
//!     let mut events = harvester.subscribe();
//!     let started = harvester.start(spec, Some(4)).await?;
//!     println!("scheduled {} jobs", started.job_count);
//!
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             Event::Image { title, resolution, is_recognized_source, .. } => {
//!                 println!("{title}: {resolution} (NovelAI: {is_recognized_source})");
//!             }
//!             Event::Complete => break,
//!             Event::Progress { .. } => {}
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Harvest orchestration (decomposed into focused submodules)
pub mod harvester;
/// Embedded metadata tag reading
pub mod metadata;
/// Image dimension probing
pub mod probe;
/// NovelAI provenance classification
pub mod provenance;
/// Event queue and image cache
pub mod sink;
/// URL template expansion
pub mod template;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, FetchConfig};
pub use error::{ApiError, Error, ErrorDetail, FetchError, Result, TemplateError, ToHttpStatus};
pub use harvester::ImageHarvester;
pub use metadata::{ContainerTagReader, MetadataTag, TagReader};
pub use probe::{CodecProbe, Dimensions, ImageProbe};
pub use provenance::{Classification, ProvenanceClassifier, ProvenanceRecord};
pub use sink::ResultSink;
pub use template::{MAX_JOBS, expand, parse_list};
pub use types::{Event, ImageId, Job, RunProgress, RunStarted, TemplateSpec};

/// Helper function to run the harvester with graceful signal handling.
///
/// Waits for a termination signal and then calls the harvester's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use image_harvest::{ImageHarvester, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let harvester = ImageHarvester::new(Config::default())?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(harvester).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(harvester: ImageHarvester) -> Result<()> {
    wait_for_signal().await;
    harvester.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
