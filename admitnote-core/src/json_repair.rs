//! Recovery of JSON payloads from language-model text.
//!
//! Model answers are often wrapped in markdown fences or cut off mid-token
//! when the output budget runs out. [`extract_and_repair`] strips the fences
//! and, only if the result does not already parse, closes an unterminated
//! string and any open arrays/objects. Anything more exotic (dangling commas,
//! missing colons) is left alone and is expected to fail the caller's parse.

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Returns a string that should parse as JSON.
///
/// Input that already parses is returned byte-for-byte.
pub fn extract_and_repair(raw: &str) -> String {
    if parses(raw) {
        return raw.to_string();
    }

    let stripped = strip_fences(raw);
    if parses(stripped) {
        return stripped.to_string();
    }

    repair_truncated(stripped)
}

/// Takes the fenced body if there is one; always trims.
pub fn strip_fences(text: &str) -> &str {
    let body = if let Some(start) = text.find(JSON_FENCE) {
        until_fence(&text[start + JSON_FENCE.len()..])
    } else if let Some(start) = text.find(FENCE) {
        until_fence(&text[start + FENCE.len()..])
    } else {
        text
    };
    body.trim()
}

fn until_fence(rest: &str) -> &str {
    match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

fn parses(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text).is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ScanState {
    in_string: bool,
    // Net counts; negative means excess closers, which are left in place.
    open_braces: i64,
    open_brackets: i64,
}

fn scan(text: &str) -> ScanState {
    let mut state = ScanState::default();
    let mut escape_next = false;

    for c in text.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' => escape_next = true,
            '"' => state.in_string = !state.in_string,
            _ if state.in_string => {}
            '{' => state.open_braces += 1,
            '}' => state.open_braces -= 1,
            '[' => state.open_brackets += 1,
            ']' => state.open_brackets -= 1,
            _ => {}
        }
    }

    state
}

fn repair_truncated(text: &str) -> String {
    let mut repaired = text.to_string();

    if scan(&repaired).in_string {
        if let Some(quote) = repaired.rfind('"') {
            let before = repaired[..quote].trim_end();
            if before.ends_with([':', ',', '[']) {
                // The quote opened a value that never closed.
                repaired.truncate(quote);
                repaired.push_str("null");
            } else {
                repaired.truncate(quote + 1);
            }
        }
    }

    let state = scan(&repaired);
    for _ in 0..state.open_brackets.max(0) {
        repaired.push(']');
    }
    for _ in 0..state.open_braces.max(0) {
        repaired.push('}');
    }

    repaired
}
