//! Core types and events for image-harvest

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Special token expanded from the name list
pub const NAME_TOKEN: &str = "name";
/// Special token expanded from the situation list
pub const SITUATION_TOKEN: &str = "situation";
/// Special token expanded from the numeric range
pub const NUM_TOKEN: &str = "num";

/// Title used for jobs whose URL had no substituted tokens
pub const SINGLE_REQUEST_TITLE: &str = "[single request]";

/// Unique identifier for a cached image
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub uuid::Uuid);

impl ImageId {
    /// Create a fresh random ImageId
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ImageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// One unit of fetch work: a resolved URL and the bindings that produced it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Fully resolved URL
    pub url: String,
    /// Token bindings in substitution order (name, situation, num, then custom tokens)
    pub tokens: IndexMap<String, String>,
}

impl Job {
    /// Display title for this job
    ///
    /// Joins the `name`, `situation` and `num` values (those present) and then
    /// the remaining custom values with `" / "`.
    pub fn title(&self) -> String {
        let special = [NAME_TOKEN, SITUATION_TOKEN, NUM_TOKEN];

        let parts: Vec<&str> = special
            .iter()
            .filter_map(|key| self.tokens.get(*key).map(String::as_str))
            .chain(
                self.tokens
                    .iter()
                    .filter(|(key, _)| !special.contains(&key.as_str()))
                    .map(|(_, value)| value.as_str()),
            )
            .collect();

        if parts.is_empty() {
            SINGLE_REQUEST_TITLE.to_string()
        } else {
            parts.join(" / ")
        }
    }
}

/// Caller-supplied input for template expansion
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// Prefix prepended verbatim to every expanded URL (never encoded)
    #[serde(default)]
    pub base_url: String,
    /// Template containing `{token}` placeholders
    pub template: String,
    /// Values for `{name}`
    #[serde(default)]
    pub names: Vec<String>,
    /// Values for `{situation}`
    #[serde(default)]
    pub situations: Vec<String>,
    /// First value of `{num}` (inclusive)
    #[serde(default)]
    pub num_start: i64,
    /// Last value of `{num}` (inclusive)
    #[serde(default)]
    pub num_end: i64,
    /// Scalar values for every other placeholder
    #[serde(default)]
    pub custom_tokens: IndexMap<String, String>,
}

/// Event emitted during a harvest run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A job settled (delivered, skipped, or cancelled)
    Progress {
        /// Jobs settled so far in this run
        done: usize,
        /// Jobs in this run
        total: usize,
    },

    /// A job produced an image
    Image {
        /// Key for the cached bytes
        id: ImageId,
        /// Display title derived from the job's tokens
        title: String,
        /// Source URL
        url: String,
        /// Probed dimensions as "WxH"
        resolution: String,
        /// Whether embedded metadata identified a known generator
        is_recognized_source: bool,
        /// Token bindings of the job
        tokens: IndexMap<String, String>,
    },

    /// The run ended; emitted exactly once
    Complete,
}

/// Returned by a successful `start`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStarted {
    /// Number of jobs scheduled
    pub job_count: usize,
}

/// Snapshot of the active run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    /// Jobs settled so far
    pub done: usize,
    /// Jobs in the run
    pub total: usize,
}
