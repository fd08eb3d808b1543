use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{GenerationResult, Section};

// ── Lazy static regexes ──────────────────────────────────────────────────────

// Greedy on purpose: first `{` through the last `}` anywhere in the text.
static JSON_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no content generated")]
    Empty,
    #[error("no JSON found")]
    NoJson,
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("sections array missing")]
    MissingSections,
    #[error("no valid sections")]
    NoValidSections,
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Pulls `{ "sections": [...] }` out of free-form model output.
///
/// The section count is only compared against `image_count` for logging;
/// a mismatch never fails. Entries without string `headline` and `body`
/// are dropped, so the result may be shorter than the image list.
///
/// Unrelated braces in prose around the object widen the greedy match and
/// make the candidate invalid JSON.
pub fn parse_sections(content: &str, image_count: usize) -> Result<GenerationResult, ParseError> {
    if content.is_empty() {
        return Err(ParseError::Empty);
    }

    let candidate = extract_json_candidate(content).ok_or(ParseError::NoJson)?;
    let parsed: Value = serde_json::from_str(candidate)?;

    let entries = parsed
        .get("sections")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingSections)?;

    if entries.len() != image_count {
        tracing::warn!(
            sections = entries.len(),
            images = image_count,
            "section count does not match image count"
        );
    }

    let sections: Vec<Section> = entries.iter().filter_map(section_from_value).collect();
    if sections.is_empty() {
        return Err(ParseError::NoValidSections);
    }

    Ok(GenerationResult { sections })
}

pub fn extract_json_candidate(content: &str) -> Option<&str> {
    JSON_OBJECT_RE.find(content).map(|m| m.as_str())
}

fn section_from_value(value: &Value) -> Option<Section> {
    let headline = value.get("headline")?.as_str()?;
    let body = value.get("body")?.as_str()?;
    Some(Section {
        headline: headline.to_string(),
        body: body.to_string(),
    })
}
