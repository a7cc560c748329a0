//! Run handlers: start, stop, poll updates.

use crate::api::AppState;
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use super::{StartRequest, StartResponse};

/// POST /api/start - Expand a template and start a run
///
/// Responds 400 for template errors and 409 while a run is active.
pub async fn start_run(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<impl IntoResponse> {
    let started = state
        .harvester
        .start(request.to_spec(), request.parallel)
        .await?;

    Ok((
        StatusCode::OK,
        Json(StartResponse {
            status: "started".to_string(),
            job_count: started.job_count,
        }),
    ))
}

/// POST /api/stop - Cancel the active run
pub async fn stop_run(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.harvester.stop().await {
        "stopping"
    } else {
        "idle"
    };
    Json(json!({ "status": status }))
}

/// GET /api/updates - Drain queued events
pub async fn get_updates(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.harvester.poll_events())
}
