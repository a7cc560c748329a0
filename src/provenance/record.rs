//! Display-ready provenance record

use serde::{Deserialize, Serialize};

use super::model::model_label;
use super::raw::RawParameters;

/// Placeholder for any field the metadata did not provide
pub const UNKNOWN: &str = "Unknown";

/// Fixed title of recognized images
pub const RECORD_TITLE: &str = "NovelAI generated image";

/// Number of per-character prompt slots
pub const MAX_CHARACTERS: usize = 6;

const TEXT_TO_IMAGE_REQUEST: &str = "PromptGenerateRequest";

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn or_unknown(value: Option<&str>) -> String {
    value.map_or_else(unknown, str::to_string)
}

fn display_or_unknown<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(unknown, |v| v.to_string())
}

/// Prompt pair for one character
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterPrompt {
    /// Positive caption
    pub prompt: String,
    /// Negative caption
    pub undesired: String,
}

impl Default for CharacterPrompt {
    fn default() -> Self {
        Self {
            prompt: unknown(),
            undesired: unknown(),
        }
    }
}

/// Flat, normalized metadata of a recognized image
///
/// Every field holds [`UNKNOWN`] when the source metadata lacks it, so a
/// consumer can always render the complete table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Fixed record title
    pub title: String,
    /// Raw top-level prompt
    pub description: String,
    /// Software tag value
    pub software: String,
    /// Model variant label
    pub source: String,
    /// Request kind ("Text to Image" for prompt generation)
    pub request_type: String,
    /// Base caption of the positive prompt
    pub prompt: String,
    /// Base caption of the negative prompt
    pub undesired_content: String,
    /// Character prompts, slot `i` holding character `i + 1`
    pub characters: [CharacterPrompt; MAX_CHARACTERS],
    /// "WxH" from the generation parameters
    pub resolution: String,
    /// Generation seed
    pub seed: String,
    /// Sampling steps
    pub steps: String,
    /// "sampler (schedule)"
    pub sampler: String,
    /// Guidance scale
    pub prompt_guidance: String,
    /// Guidance rescale (cfg_rescale)
    pub prompt_guidance_rescale: String,
    /// Negative guidance strength (uncond_scale)
    pub undesired_content_strength: String,
}

impl Default for ProvenanceRecord {
    fn default() -> Self {
        Self {
            title: unknown(),
            description: unknown(),
            software: unknown(),
            source: unknown(),
            request_type: unknown(),
            prompt: unknown(),
            undesired_content: unknown(),
            characters: Default::default(),
            resolution: unknown(),
            seed: unknown(),
            steps: unknown(),
            sampler: unknown(),
            prompt_guidance: unknown(),
            prompt_guidance_rescale: unknown(),
            undesired_content_strength: unknown(),
        }
    }
}

impl ProvenanceRecord {
    /// Build a record from parsed parameters and the raw Software/Source tags
    pub(crate) fn from_parameters(
        params: &RawParameters,
        software: Option<&str>,
        source: Option<&str>,
    ) -> Self {
        let prompt = params.prompt.as_deref();

        let characters = std::array::from_fn(|i| CharacterPrompt {
            prompt: or_unknown(params.character_prompt(i)),
            undesired: or_unknown(params.character_negative(i)),
        });

        let resolution = match (params.width, params.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => unknown(),
        };

        let sampler = match (params.sampler.as_deref(), params.noise_schedule.as_deref()) {
            (Some(sampler), Some(schedule)) => format!("{} ({})", sampler, schedule),
            (Some(sampler), None) => sampler.to_string(),
            (None, _) => unknown(),
        };

        let request_type = match params.request_type.as_deref() {
            Some(TEXT_TO_IMAGE_REQUEST) => "Text to Image".to_string(),
            other => or_unknown(other),
        };

        Self {
            title: RECORD_TITLE.to_string(),
            description: or_unknown(prompt),
            software: or_unknown(software),
            source: source
                .or(software)
                .map_or_else(unknown, |value| model_label(value, prompt)),
            request_type,
            prompt: or_unknown(params.base_prompt()),
            undesired_content: or_unknown(params.base_negative()),
            characters,
            resolution,
            seed: display_or_unknown(params.seed),
            steps: display_or_unknown(params.steps),
            sampler,
            prompt_guidance: display_or_unknown(params.scale),
            prompt_guidance_rescale: display_or_unknown(params.cfg_rescale),
            undesired_content_strength: display_or_unknown(params.uncond_scale),
        }
    }

    /// Ordered `(label, value)` rows for display
    ///
    /// Character rows are included only for characters whose prompt is known.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = [
            ("Title", &self.title),
            ("Description", &self.description),
            ("Software", &self.software),
            ("Source", &self.source),
            ("Request Type", &self.request_type),
            ("Prompt", &self.prompt),
            ("Undesired Content", &self.undesired_content),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();

        for (i, character) in self.characters.iter().enumerate() {
            if character.prompt == UNKNOWN {
                continue;
            }
            rows.push((format!("Character {} Prompt", i + 1), character.prompt.clone()));
            rows.push((
                format!("Character {} Undesired Content", i + 1),
                character.undesired.clone(),
            ));
        }

        rows.extend(
            [
                ("Resolution", &self.resolution),
                ("Seed", &self.seed),
                ("Steps", &self.steps),
                ("Sampler", &self.sampler),
                ("Prompt Guidance", &self.prompt_guidance),
                ("Prompt Guidance Rescale", &self.prompt_guidance_rescale),
                ("Undesired Content Strength", &self.undesired_content_strength),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.clone())),
        );

        rows
    }
}
