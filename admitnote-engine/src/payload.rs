//! Locating the JSON answer among a candidate's output parts.

use admitnote_core::envelope::{Candidate, OutputPart};

fn looks_like_json_start(text: &str) -> bool {
    let t = text.trim_start();
    t.starts_with('{') || t.starts_with("```json")
}

fn contains_object(text: &str) -> bool {
    text.contains('{') && text.contains('}')
}

/// Picks the payload text, trying in order:
/// 1. the first part that starts like JSON (an object or a json fence),
/// 2. the first part containing both `{` and `}`,
/// 3. the last part with any non-empty text.
pub fn select_payload_text(candidate: &Candidate) -> Option<&str> {
    let texts: Vec<&str> = candidate
        .parts()
        .iter()
        .filter_map(|part| match part {
            OutputPart::Text { text } => Some(text.as_str()),
            OutputPart::Other(_) => None,
        })
        .collect();

    texts
        .iter()
        .copied()
        .find(|t| looks_like_json_start(t))
        .or_else(|| texts.iter().copied().find(|t| contains_object(t)))
        .or_else(|| texts.iter().rev().copied().find(|t| !t.trim().is_empty()))
}
