//! Model variant labels keyed by the trailing hash of the Software/Source tag

/// First prompt segment that marks the furry dataset
const FURRY_MARKER: &str = "fur dataset";

/// One known model variant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelVariant {
    /// Trailing hash token, uppercase
    pub hash: &'static str,
    /// Human-readable variant name
    pub label: &'static str,
    /// Whether the variant has a "+ Furry" flavour
    pub furry_capable: bool,
}

/// All recognized generator model hashes
pub const KNOWN_MODELS: &[ModelVariant] = &[
    ModelVariant {
        hash: "37C2B166",
        label: "NAI Diffusion Furry V3",
        furry_capable: false,
    },
    ModelVariant {
        hash: "7BCCAA2C",
        label: "NAI Diffusion Anime V3",
        furry_capable: false,
    },
    ModelVariant {
        hash: "7ABFFA2A",
        label: "NAI Diffusion V4 Curated",
        furry_capable: true,
    },
    ModelVariant {
        hash: "37442FCA",
        label: "NAI Diffusion V4 Full",
        furry_capable: true,
    },
    ModelVariant {
        hash: "C02D4F98",
        label: "NAI Diffusion V4.5 Curated",
        furry_capable: true,
    },
    ModelVariant {
        hash: "4BDE2A90",
        label: "NAI Diffusion V4.5 Full",
        furry_capable: true,
    },
];

/// Look up a model variant by its hash token (case-insensitive)
pub fn lookup(hash: &str) -> Option<&'static ModelVariant> {
    KNOWN_MODELS
        .iter()
        .find(|m| m.hash.eq_ignore_ascii_case(hash))
}

/// Trailing whitespace-separated token of a Software/Source value
pub fn trailing_token(value: &str) -> Option<&str> {
    value.split_whitespace().next_back()
}

/// Whether the trailing token of `value` is a known model hash
pub fn has_known_hash(value: &str) -> bool {
    trailing_token(value).and_then(lookup).is_some()
}

/// Render the display label for a Software/Source value
///
/// Known hashes produce `"<value> (<label>)"`; anything else is returned as-is.
pub fn model_label(value: &str, prompt: Option<&str>) -> String {
    let Some(variant) = trailing_token(value).and_then(lookup) else {
        return value.to_string();
    };

    let furry = variant.furry_capable && prompt.is_some_and(is_furry_prompt);
    if furry {
        format!("{} ({} + Furry)", value, variant.label)
    } else {
        format!("{} ({})", value, variant.label)
    }
}

fn is_furry_prompt(prompt: &str) -> bool {
    prompt
        .split(',')
        .next()
        .is_some_and(|first| first.trim() == FURRY_MARKER)
}
