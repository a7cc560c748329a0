//! NovelAI provenance classification
//!
//! Decides from embedded metadata whether an image came from NovelAI and, when
//! the generation parameters are embedded, builds a [`ProvenanceRecord`].
//!
//! Classification never fails: unreadable metadata, unknown formats and
//! malformed parameter blobs all degrade to "not recognized" or "recognized
//! without a record".

mod model;
mod raw;
mod record;


use std::sync::Arc;

use crate::metadata::{ContainerTagReader, MetadataTag, TEXTUAL_DATA, TagReader};

pub use model::{KNOWN_MODELS, ModelVariant, model_label};
pub use record::{CharacterPrompt, MAX_CHARACTERS, ProvenanceRecord, RECORD_TITLE, UNKNOWN};

use raw::RawParameters;

const SOFTWARE: &str = "Software";
const COMMENT: &str = "Comment";
const SOURCE: &str = "Source";

/// Outcome of classifying one image
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    /// Metadata identified a known generator
    pub recognized: bool,
    /// Parsed parameters, when recognized and the Comment parsed
    pub record: Option<ProvenanceRecord>,
}

/// Software/Comment/Source values merged from all tags
///
/// The first value seen for a key wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelevantTags {
    /// Generator identifier
    pub software: Option<String>,
    /// Generation parameter JSON
    pub comment: Option<String>,
    /// Model source string
    pub source: Option<String>,
}

/// Map a tag to a canonical `(key, value)` pair if it is one we care about
///
/// `Textual Data` descriptions are split on their first colon.
fn relevant_pair(tag: &MetadataTag) -> Option<(&'static str, &str)> {
    let (key, value) = if tag.name == TEXTUAL_DATA {
        let (key, value) = tag.description.split_once(':')?;
        (key.trim(), value.trim())
    } else {
        (tag.name.as_str(), tag.description.as_str())
    };

    [SOFTWARE, COMMENT, SOURCE]
        .into_iter()
        .find(|canonical| canonical.eq_ignore_ascii_case(key))
        .map(|canonical| (canonical, value))
}

/// Merge the tags that matter for classification
pub fn collect_tags(tags: &[MetadataTag]) -> RelevantTags {
    let mut merged = RelevantTags::default();
    for (key, value) in tags.iter().filter_map(relevant_pair) {
        let slot = match key {
            SOFTWARE => &mut merged.software,
            COMMENT => &mut merged.comment,
            _ => &mut merged.source,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }
    merged
}

fn software_matches(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.contains("novelai") || lower.contains("nai diffusion") || model::has_known_hash(value)
}

fn comment_matches(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.contains("\"request_type\"") && lower.contains("\"signed_hash\"")
}

/// Whether any tag identifies a known generator
///
/// Tags are scanned in order and scanning stops at the first match.
pub fn is_recognized(tags: &[MetadataTag]) -> bool {
    tags.iter()
        .filter_map(relevant_pair)
        .any(|(key, value)| match key {
            SOFTWARE => software_matches(value),
            COMMENT => comment_matches(value),
            _ => false,
        })
}

/// Classify an already-read tag list
pub fn classify_tags(tags: &[MetadataTag]) -> Classification {
    if !is_recognized(tags) {
        return Classification::default();
    }

    let merged = collect_tags(tags);
    let Some(comment) = merged.comment.as_deref() else {
        return Classification {
            recognized: true,
            record: None,
        };
    };

    let record = match RawParameters::parse(comment) {
        Ok(params) => Some(ProvenanceRecord::from_parameters(
            &params,
            merged.software.as_deref(),
            merged.source.as_deref(),
        )),
        Err(e) => {
            tracing::debug!(error = %e, "recognized image has unparseable parameters");
            None
        }
    };

    Classification {
        recognized: true,
        record,
    }
}

/// Classifies image bytes through a [`TagReader`]
#[derive(Clone)]
pub struct ProvenanceClassifier {
    reader: Arc<dyn TagReader>,
}

impl ProvenanceClassifier {
    /// Create a classifier reading tags with `reader`
    pub fn new(reader: Arc<dyn TagReader>) -> Self {
        Self { reader }
    }

    /// Classify encoded image bytes
    pub fn classify(&self, bytes: &[u8]) -> Classification {
        match self.reader.read_tags(bytes) {
            Ok(tags) => classify_tags(&tags),
            Err(e) => {
                tracing::debug!(error = %e, "no readable metadata");
                Classification::default()
            }
        }
    }
}

impl Default for ProvenanceClassifier {
    fn default() -> Self {
        Self::new(Arc::new(ContainerTagReader))
    }
}

impl std::fmt::Debug for ProvenanceClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvenanceClassifier").finish_non_exhaustive()
    }
}
