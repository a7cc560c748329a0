//! Configuration types for image-harvest

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

use crate::error::{Error, Result};

/// Upper bound for the per-run concurrency budget
pub const MAX_CONCURRENCY: usize = 64;

/// Fetch behavior configuration (concurrency, HTTP client settings)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Concurrency used when a run does not specify its own (default: 4)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Ceiling for a single HTTP request, headers and body included (default: 15 seconds)
    ///
    /// Expiry is a per-job skip, not a run-level fault.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Capacity of the push-event broadcast channel (default: 1000)
    ///
    /// Subscribers that fall further behind receive `RecvError::Lagged`.
    /// The polling queue is unaffected by this value.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Main configuration for ImageHarvester
///
/// Fetch settings are flattened, so the serialized form stays a flat object
/// apart from the `api` section.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fetch behavior settings
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// API and external server integration
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Check the configuration for values that would make runs impossible
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_concurrency == 0 || self.fetch.max_concurrency > MAX_CONCURRENCY {
            return Err(Error::Config {
                message: format!(
                    "max_concurrency must be between 1 and {}, got {}",
                    MAX_CONCURRENCY, self.fetch.max_concurrency
                ),
                key: Some("max_concurrency".to_string()),
            });
        }
        if self.fetch.request_timeout.is_zero() {
            return Err(Error::Config {
                message: "request_timeout must be greater than zero".to_string(),
                key: Some("request_timeout".to_string()),
            });
        }
        if self.fetch.event_buffer == 0 {
            return Err(Error::Config {
                message: "event_buffer must be greater than zero".to_string(),
                key: Some("event_buffer".to_string()),
            });
        }
        Ok(())
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:5000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

// Default value functions
fn default_max_concurrency() -> usize {
    4
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_user_agent() -> String {
    format!("image-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_event_buffer() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

/// Serialize a [`Duration`] as whole seconds
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
