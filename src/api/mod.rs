//! REST API server module
//!
//! Provides a JSON control surface for a presentation layer: start and stop
//! runs, poll or stream events, fetch cached images and their provenance.

use crate::{Config, ImageHarvester, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Run Control
/// - `POST /api/start` - Expand a template and start a run
/// - `POST /api/stop` - Cancel the active run
/// - `GET /api/updates` - Drain queued events
///
/// ## Images
/// - `GET /image/:id` - Cached image bytes
/// - `GET /api/images/:id/provenance` - Provenance record of a cached image
/// - `POST /api/save` - Write the cache to a directory
///
/// ## System
/// - `GET /api/health` - Health check
/// - `GET /api/events` - Server-sent events stream
pub fn create_router(harvester: Arc<ImageHarvester>, config: Arc<Config>) -> Router {
    let state = AppState::new(harvester, config.clone());

    let router = Router::new()
        // Run control
        .route("/api/start", post(routes::start_run))
        .route("/api/stop", post(routes::stop_run))
        .route("/api/updates", get(routes::get_updates))
        // Images
        .route("/image/:id", get(routes::get_image))
        .route("/api/images/:id/provenance", get(routes::get_provenance))
        .route("/api/save", post(routes::save_cache))
        // System
        .route("/api/health", get(routes::health_check))
        .route("/api/events", get(routes::event_stream))
        .fallback(routes::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// # Arguments
///
/// * `origins` - List of allowed origins (supports "*" for any origin)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        // Allow all origins (default for local development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the server is shut down.
///
/// # Example
///
/// ```no_run
/// use image_harvest::{ImageHarvester, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let harvester = Arc::new(ImageHarvester::new((*config).clone())?);
///
/// // Start API server (blocks until shutdown)
/// image_harvest::api::start_api_server(harvester, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(harvester: Arc<ImageHarvester>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(harvester, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
