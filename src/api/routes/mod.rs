//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`run`] - Start, stop and event polling
//! - [`images`] - Cached image bytes, provenance and export
//! - [`system`] - Health and server-sent events

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::template::parse_list;
use crate::types::TemplateSpec;

mod images;
mod run;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use images::*;
pub use run::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /api/start
///
/// `names` and `situations` are comma-separated lists as typed by an operator.
#[derive(Debug, Deserialize, Serialize)]
pub struct StartRequest {
    /// Verbatim URL prefix
    #[serde(default)]
    pub base_url: String,
    /// Template with `{token}` placeholders
    #[serde(default)]
    pub template: String,
    /// Comma-separated values for `{name}`
    #[serde(default)]
    pub names: String,
    /// Comma-separated values for `{situation}`
    #[serde(default)]
    pub situations: String,
    /// First `{num}` value
    #[serde(default)]
    pub start_num: i64,
    /// Last `{num}` value (inclusive)
    #[serde(default)]
    pub end_num: i64,
    /// Concurrency for this run (defaults to the configured value)
    #[serde(default)]
    pub parallel: Option<usize>,
    /// Values for custom placeholders
    #[serde(default)]
    pub custom_tokens: IndexMap<String, String>,
}

impl StartRequest {
    /// Convert into a template spec, splitting the comma lists
    pub fn to_spec(&self) -> TemplateSpec {
        TemplateSpec {
            base_url: self.base_url.trim().to_string(),
            template: self.template.trim().to_string(),
            names: parse_list(&self.names),
            situations: parse_list(&self.situations),
            num_start: self.start_num,
            num_end: self.end_num,
            custom_tokens: self
                .custom_tokens
                .iter()
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect(),
        }
    }
}

/// Response for POST /api/start
#[derive(Debug, Deserialize, Serialize)]
pub struct StartResponse {
    /// Always "started"
    pub status: String,
    /// Number of jobs scheduled
    pub job_count: usize,
}

/// Request body for POST /api/save
#[derive(Debug, Deserialize, Serialize)]
pub struct SaveRequest {
    /// Destination directory
    pub path: String,
}

/// One row of a provenance table
#[derive(Debug, Deserialize, Serialize)]
pub struct ProvenanceEntry {
    /// Row label
    pub label: String,
    /// Row value
    pub value: String,
}

/// Response for GET /api/images/:id/provenance
#[derive(Debug, Deserialize, Serialize)]
pub struct ProvenanceResponse {
    /// Image id
    pub id: String,
    /// Whether a known generator was identified
    pub recognized: bool,
    /// Parsed record, when available
    pub record: Option<crate::provenance::ProvenanceRecord>,
    /// Ordered display rows of the record (empty when there is none)
    pub entries: Vec<ProvenanceEntry>,
}
