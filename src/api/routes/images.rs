//! Image handlers: cached bytes, provenance, cache export.

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::ImageId;
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

use super::{ProvenanceEntry, ProvenanceResponse, SaveRequest};

fn parse_id(raw: &str) -> Result<ImageId> {
    raw.parse()
        .map_err(|_| Error::NotFound(format!("image {}", raw)))
}

/// GET /image/:id - Serve cached image bytes
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    let bytes = state
        .harvester
        .cached_bytes(&id)
        .ok_or_else(|| Error::NotFound(format!("image {}", id)))?;

    let content_type = image::guess_format(&bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-store"),
        ],
        bytes,
    ))
}

/// GET /api/images/:id/provenance - Classify a cached image
pub async fn get_provenance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    let classification = state.harvester.provenance(&id)?;

    let entries = classification
        .record
        .as_ref()
        .map(|record| {
            record
                .entries()
                .into_iter()
                .map(|(label, value)| ProvenanceEntry { label, value })
                .collect()
        })
        .unwrap_or_default();

    Ok(Json(ProvenanceResponse {
        id: id.to_string(),
        recognized: classification.recognized,
        record: classification.record,
        entries,
    }))
}

/// POST /api/save - Write the cache to a directory
pub async fn save_cache(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Result<impl IntoResponse> {
    let path = request.path.trim();
    if path.is_empty() {
        return Err(Error::Config {
            message: "save path must not be empty".to_string(),
            key: Some("path".to_string()),
        });
    }

    let count = state.harvester.save_cache(path).await?;
    Ok(Json(json!({ "status": "saved", "count": count, "path": path })))
}
