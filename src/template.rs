//! URL template expansion
//!
//! A template such as `"{name}_{num}.png"` plus per-token value lists expands into
//! the Cartesian product of jobs, ordered name → situation → num. Custom tokens
//! are bound to a single value each and act as constants.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::TemplateError;
use crate::types::{Job, NAME_TOKEN, NUM_TOKEN, SITUATION_TOKEN, TemplateSpec};

/// Largest number of jobs a single template may expand to
pub const MAX_JOBS: usize = 100_000;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"\{([^}]+)\}").expect("placeholder pattern is valid"))
}

/// Split a comma-separated operator list, trimming entries and dropping empties
///
/// ```
/// assert_eq!(image_harvest::parse_list(" a, b,,c ,"), vec!["a", "b", "c"]);
/// ```
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Distinct placeholder names in order of first appearance
pub fn placeholders(template: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for cap in placeholder_regex().captures_iter(template) {
        let token = &cap[1];
        if !seen.iter().any(|s| s == token) {
            seen.push(token.to_string());
        }
    }
    seen
}

/// Expand a template into the ordered list of jobs it describes
///
/// Errors are returned before any job is produced. A template without
/// placeholders yields exactly one job whose URL is `base_url + template`.
/// Expansions larger than [`MAX_JOBS`] are rejected with
/// [`TemplateError::TooManyJobs`].
pub fn expand(spec: &TemplateSpec) -> Result<Vec<Job>, TemplateError> {
    if spec.base_url.trim().is_empty() && spec.template.trim().is_empty() {
        return Err(TemplateError::EmptyTemplate);
    }

    let tokens = placeholders(&spec.template);
    let wants = |name: &str| tokens.iter().any(|t| t == name);

    // Custom tokens are validated first so a typo never turns into network traffic
    let mut constants: IndexMap<String, String> = IndexMap::new();
    for token in tokens.iter().filter(|t| !is_special(t)) {
        match spec.custom_tokens.get(token.as_str()) {
            Some(value) if !value.trim().is_empty() => {
                constants.insert(token.clone(), value.trim().to_string());
            }
            _ => {
                return Err(TemplateError::MissingTokenValue {
                    token: token.clone(),
                });
            }
        }
    }

    if wants(NUM_TOKEN) && spec.num_start > spec.num_end {
        return Err(TemplateError::InvalidRange {
            start: spec.num_start,
            end: spec.num_end,
        });
    }

    let names = branches(wants(NAME_TOKEN), &spec.names, NAME_TOKEN)?;
    let situations = branches(wants(SITUATION_TOKEN), &spec.situations, SITUATION_TOKEN)?;

    // Sized before anything is allocated for the numeric axis
    let num_count = if wants(NUM_TOKEN) {
        (i128::from(spec.num_end) - i128::from(spec.num_start) + 1) as u128
    } else {
        1
    };
    let count = (names.len() as u128)
        .checked_mul(situations.len() as u128)
        .and_then(|n| n.checked_mul(num_count));
    match count {
        Some(n) if n <= MAX_JOBS as u128 => {}
        _ => {
            return Err(TemplateError::TooManyJobs {
                count: count.map_or(u64::MAX, |n| u64::try_from(n).unwrap_or(u64::MAX)),
                max: MAX_JOBS,
            });
        }
    }

    let nums: Vec<Option<String>> = if wants(NUM_TOKEN) {
        (spec.num_start..=spec.num_end)
            .map(|n| Some(n.to_string()))
            .collect()
    } else {
        vec![None]
    };

    let mut jobs = Vec::with_capacity(names.len() * situations.len() * nums.len());
    for name in &names {
        for situation in &situations {
            for num in &nums {
                let mut bindings = IndexMap::new();
                if let Some(v) = name {
                    bindings.insert(NAME_TOKEN.to_string(), v.clone());
                }
                if let Some(v) = situation {
                    bindings.insert(SITUATION_TOKEN.to_string(), v.clone());
                }
                if let Some(v) = num {
                    bindings.insert(NUM_TOKEN.to_string(), v.clone());
                }
                for (k, v) in &constants {
                    bindings.insert(k.clone(), v.clone());
                }

                let url = format!("{}{}", spec.base_url, substitute(&spec.template, &bindings));
                jobs.push(Job {
                    url,
                    tokens: bindings,
                });
            }
        }
    }

    Ok(jobs)
}

fn is_special(token: &str) -> bool {
    token == NAME_TOKEN || token == SITUATION_TOKEN || token == NUM_TOKEN
}

/// Branch values for a list-valued token; a single null branch when not requested
fn branches(
    requested: bool,
    values: &[String],
    token: &str,
) -> Result<Vec<Option<String>>, TemplateError> {
    if !requested {
        return Ok(vec![None]);
    }
    let list: Vec<Option<String>> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| Some(v.to_string()))
        .collect();
    if list.is_empty() {
        return Err(TemplateError::NoJobsGenerated {
            token: token.to_string(),
        });
    }
    Ok(list)
}

fn substitute(template: &str, bindings: &IndexMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            bindings
                .get(&caps[1])
                .map(|v| urlencoding::encode(v).into_owned())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
