//! Error types for image-harvest
//!
//! This module provides the error taxonomy of the library:
//! - [`TemplateError`] - validation failures surfaced synchronously from `start`
//! - [`FetchError`] - per-job failures that are logged and never abort a run
//! - [`Error`] - the crate-wide error, including run conflicts
//! - HTTP status code mapping and structured JSON bodies for the API

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::probe::ProbeError;

/// Result type alias for image-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for image-harvest
///
/// Only [`Error::Template`] and [`Error::AlreadyRunning`] are produced by
/// [`ImageHarvester::start`](crate::ImageHarvester::start). Everything that goes
/// wrong while a run is in flight is reported through the event stream instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrency")
        key: Option<String>,
    },

    /// URL template could not be expanded into jobs
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// A run is already in progress
    #[error("a harvest run is already in progress")]
    AlreadyRunning,

    /// Cached image not found
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new runs
    #[error("shutdown in progress: not accepting new runs")]
    ShuttingDown,
}

/// Template validation errors
///
/// All of these abort a run before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Neither the base URL nor the template contain anything to fetch
    #[error("template is empty")]
    EmptyTemplate,

    /// `{num}` is present but the range is inverted
    #[error("invalid number range: start {start} is greater than end {end}")]
    InvalidRange {
        /// First number of the range
        start: i64,
        /// Last number of the range (inclusive)
        end: i64,
    },

    /// A custom placeholder has no value bound to it
    #[error("token '{{{token}}}' has no value")]
    MissingTokenValue {
        /// Name of the placeholder without braces
        token: String,
    },

    /// Placeholders exist but a required value list was empty
    #[error("no jobs generated: token '{{{token}}}' has an empty value list")]
    NoJobsGenerated {
        /// The special token whose list was empty
        token: String,
    },

    /// The expansion would exceed [`MAX_JOBS`](crate::template::MAX_JOBS)
    #[error("template expands to {count} jobs, more than the limit of {max}")]
    TooManyJobs {
        /// Jobs the template describes (saturated at `u64::MAX`)
        count: u64,
        /// Largest run accepted
        max: usize,
    },
}

/// Per-job failures
///
/// A `FetchError` only ever affects its own job: the scheduler logs it,
/// advances progress, and carries on with the rest of the run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    #[error("HTTP {0}")]
    HttpStatus(u16),

    /// Response is not an image media type
    #[error("not an image (content type: {content_type})")]
    NotAnImage {
        /// The received Content-Type header, or "none"
        content_type: String,
    },

    /// The request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Connection or protocol failure
    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// Body could not be decoded as an image
    #[error("image decode failed: {0}")]
    Decode(#[from] ProbeError),

    /// The run was cancelled while this job was waiting on the network
    #[error("cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(error)
        }
    }
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "already_running",
///     "message": "a harvest run is already in progress"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "invalid_range")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - invalid input
            Error::Config { .. } => 400,
            Error::Template(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 409 Conflict - a run is already active
            Error::AlreadyRunning => 409,

            // 502 Bad Gateway - upstream failures
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,

            // 500 Internal Server Error
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Template(e) => match e {
                TemplateError::EmptyTemplate => "empty_template",
                TemplateError::InvalidRange { .. } => "invalid_range",
                TemplateError::MissingTokenValue { .. } => "missing_token_value",
                TemplateError::NoJobsGenerated { .. } => "no_jobs_generated",
                TemplateError::TooManyJobs { .. } => "too_many_jobs",
            },
            Error::AlreadyRunning => "already_running",
            Error::NotFound(_) => "not_found",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Template(TemplateError::InvalidRange { start, end }) => {
                Some(serde_json::json!({ "start": start, "end": end }))
            }
            Error::Template(TemplateError::MissingTokenValue { token })
            | Error::Template(TemplateError::NoJobsGenerated { token }) => {
                Some(serde_json::json!({ "token": token }))
            }
            Error::Template(TemplateError::TooManyJobs { count, max }) => {
                Some(serde_json::json!({ "count": count, "max": max }))
            }
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
