use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{AnalystDraft, CriticRejected, CriticVerdict, CriticVerified};

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("regex for fenced block"));

/// Content of the first fenced code block, or the whole text when there is none
pub fn extract_json_block(text: &str) -> &str {
    match FENCED_BLOCK.captures(text).and_then(|caps| caps.get(1)) {
        Some(block) => block.as_str().trim(),
        None => text.trim(),
    }
}

/// Decode an Analyst response. Unparseable output yields an empty draft.
pub fn decode_analyst(text: &str) -> AnalystDraft {
    match serde_json::from_str::<AnalystDraft>(extract_json_block(text)) {
        Ok(draft) => draft,
        Err(e) => {
            warn!("Analyst response is not valid JSON ({}), using empty draft", e);
            AnalystDraft::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    verified_findings: Vec<Value>,
    #[serde(default)]
    rejected_findings: Vec<Value>,
}

/// Decode a Critic response
///
/// Both lists default to empty when missing or when the response cannot be
/// parsed at all. Each entry is decoded field by field, so a wrong-shaped
/// field falls back to its default instead of dropping the entry. Bare
/// strings are accepted as entries too.
pub fn decode_critic(text: &str) -> CriticVerdict {
    let raw = match serde_json::from_str::<RawVerdict>(extract_json_block(text)) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Critic response is not valid JSON ({}), using empty verdict", e);
            RawVerdict::default()
        }
    };

    CriticVerdict {
        verified_findings: decode_entries(
            raw.verified_findings,
            "verified",
            CriticVerified::from_text,
        ),
        rejected_findings: decode_entries(
            raw.rejected_findings,
            "rejected",
            CriticRejected::from_text,
        ),
    }
}

fn decode_entries<T>(values: Vec<Value>, kind: &str, from_text: fn(String) -> T) -> Vec<T>
where
    T: DeserializeOwned,
{
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(text) => Some(from_text(text)),
            Value::Object(_) => match serde_json::from_value::<T>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping malformed {} finding: {}", kind, e);
                    None
                }
            },
            other => {
                debug!("Skipping {} finding that is not an object: {}", kind, other);
                None
            }
        })
        .collect()
}
