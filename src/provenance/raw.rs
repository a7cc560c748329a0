//! The generation-parameter blob embedded in the `Comment` tag

use serde::Deserialize;

/// Upstream generation parameters
///
/// Every field is optional and unknown fields are ignored, so blobs from
/// older or newer generator versions still parse.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawParameters {
    pub prompt: Option<String>,
    pub steps: Option<u64>,
    pub height: Option<u64>,
    pub width: Option<u64>,
    pub scale: Option<f64>,
    pub uncond_scale: Option<f64>,
    pub cfg_rescale: Option<f64>,
    pub seed: Option<u64>,
    pub n_samples: Option<u64>,
    pub noise_schedule: Option<String>,
    pub sampler: Option<String>,
    pub request_type: Option<String>,
    pub signed_hash: Option<String>,
    pub v4_prompt: Option<V4Prompt>,
    pub v4_negative_prompt: Option<V4Prompt>,
}

/// `v4_prompt` / `v4_negative_prompt`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct V4Prompt {
    pub caption: Option<Caption>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Caption {
    pub base_caption: Option<String>,
    pub char_captions: Option<Vec<CharCaption>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CharCaption {
    pub char_caption: Option<String>,
}

impl RawParameters {
    /// Parse a `Comment` value
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Base caption of the positive prompt
    pub fn base_prompt(&self) -> Option<&str> {
        base_caption(self.v4_prompt.as_ref())
    }

    /// Base caption of the negative prompt
    pub fn base_negative(&self) -> Option<&str> {
        base_caption(self.v4_negative_prompt.as_ref())
    }

    /// Per-character positive caption at `index`
    pub fn character_prompt(&self, index: usize) -> Option<&str> {
        char_caption(self.v4_prompt.as_ref(), index)
    }

    /// Per-character negative caption at `index`
    pub fn character_negative(&self, index: usize) -> Option<&str> {
        char_caption(self.v4_negative_prompt.as_ref(), index)
    }
}

fn base_caption(prompt: Option<&V4Prompt>) -> Option<&str> {
    prompt?.caption.as_ref()?.base_caption.as_deref()
}

fn char_caption(prompt: Option<&V4Prompt>, index: usize) -> Option<&str> {
    prompt?
        .caption
        .as_ref()?
        .char_captions
        .as_ref()?
        .get(index)?
        .char_caption
        .as_deref()
}
