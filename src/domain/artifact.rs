//! Extraction of an embedded visualization payload from model output.
//!
//! Model responses sometimes carry a structured JSON block inside otherwise
//! free text. This module locates it (fenced block first, then a bare object,
//! then a bare array), validates the shape, and strips the matched span from
//! the prose so the payload is not shown twice. Malformed embedded data
//! degrades to plain text; nothing here returns an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Mandatory discriminator field on object-shaped payloads.
pub const ARTIFACT_DISCRIMINATOR: &str = "visualizationType";

/// Matches a ```json fenced block, non-greedy across lines.
static JSON_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)```").unwrap());

/// Separates an embedded artifact from the displayed text.
///
/// Returns `(cleaned_text, Some(payload))` when a valid block was found and
/// removed, or `(original_text, None)` otherwise. When `artifact_requested`
/// is false the text passes through untouched.
pub fn extract_artifact(text: &str, artifact_requested: bool) -> (String, Option<Value>) {
    if !artifact_requested {
        return (text.to_string(), None);
    }

    // A fenced block, when present, is authoritative: if its contents do not
    // parse or fail shape validation the whole response stays as prose.
    if let Some(caps) = JSON_FENCE_RE.captures(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        let inner = caps.get(1).expect("fence capture present").as_str();
        return match parse_validated(inner) {
            Some(payload) => (strip_span(text, whole.start(), whole.end()), Some(payload)),
            None => (text.to_string(), None),
        };
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some((start, end)) = balanced_span(text, open, close) {
            if let Some(payload) = parse_validated(&text[start..end]) {
                return (strip_span(text, start, end), Some(payload));
            }
        }
    }

    (text.to_string(), None)
}

/// Strips a leading ```json / ``` fence from a structured model response.
///
/// Structured calls ask for bare JSON but models frequently wrap it anyway.
pub fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let without_close = without_open.strip_suffix("```").unwrap_or(without_open);
    without_close.trim().to_string()
}

fn parse_validated(candidate: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(candidate.trim()).ok()?;
    match &value {
        Value::Object(map) => map
            .get(ARTIFACT_DISCRIMINATOR)
            .filter(|v| v.is_string())
            .map(|_| value.clone()),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            Some(value)
        }
        _ => None,
    }
}

/// Finds the first balanced `open`..`close` span, respecting JSON strings.
fn balanced_span(text: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some((start, start + offset + c.len_utf8()));
            }
        }
    }
    None
}

fn strip_span(text: &str, start: usize, end: usize) -> String {
    let mut cleaned = String::with_capacity(text.len() - (end - start));
    cleaned.push_str(text[..start].trim_end());
    let tail = text[end..].trim_start();
    if !cleaned.is_empty() && !tail.is_empty() {
        cleaned.push_str("\n\n");
    }
    cleaned.push_str(tail);
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fenced_response() -> String {
        format!(
            "Here is the dry run you asked for.\n\n```json\n{}\n```\nLet me know if you \
             want the code as well.",
            json!({
                "visualizationType": "array",
                "algorithm": "two_sum",
                "array": [2, 7, 11, 15],
                "steps": [{"highlightedIndices": [0, 1], "message": "Found the pair"}]
            })
        )
    }

    #[test]
    fn extracts_fenced_block_and_strips_it() {
        let (cleaned, artifact) = extract_artifact(&fenced_response(), true);
        let artifact = artifact.unwrap();
        assert_eq!(artifact["visualizationType"], "array");
        assert_eq!(artifact["array"][1], 7);
        assert!(!cleaned.contains("```"));
        assert!(cleaned.contains("Here is the dry run"));
        assert!(cleaned.contains("Let me know"));
    }

    #[test]
    fn fence_round_trip_preserves_structure() {
        let payload = json!({
            "visualizationType": "sorting",
            "algorithm": "bubble_sort",
            "array": [5, 1, 4],
            "steps": [{"compare": [0, 1], "message": "Comparing"}]
        });
        let text = format!("Intro.\n```json\n{payload}\n```\nOutro.");
        let (cleaned, artifact) = extract_artifact(&text, true);
        assert_eq!(artifact.unwrap(), payload);
        assert_eq!(cleaned, "Intro.\n\nOutro.");
    }

    #[test]
    fn malformed_fence_degrades_to_plain_text() {
        let text = "Some prose.\n```json\n{\"visualizationType\": \"array\",\n```\nmore prose";
        let (cleaned, artifact) = extract_artifact(text, true);
        assert!(artifact.is_none());
        assert_eq!(cleaned, text);
    }

    #[test]
    fn missing_discriminator_degrades_to_plain_text() {
        let text = "Result:\n```json\n{\"algorithm\": \"bfs\"}\n```";
        let (cleaned, artifact) = extract_artifact(text, true);
        assert!(artifact.is_none());
        assert_eq!(cleaned, text);
    }

    #[test]
    fn finds_bare_object_with_discriminator() {
        let text = format!(
            "The payload {} covers every step.",
            json!({"visualizationType": "graph", "nodes": []})
        );
        let (cleaned, artifact) = extract_artifact(&text, true);
        assert_eq!(artifact.unwrap()["visualizationType"], "graph");
        assert!(cleaned.contains("The payload"));
        assert!(cleaned.contains("covers every step."));
        assert!(!cleaned.contains("visualizationType"));
    }

    #[test]
    fn finds_bare_array_of_objects() {
        let text = r#"Steps: [{"message": "a"}, {"message": "b"}] done."#;
        let (cleaned, artifact) = extract_artifact(text, true);
        let artifact = artifact.unwrap();
        assert_eq!(artifact.as_array().unwrap().len(), 2);
        assert!(!cleaned.contains('['));
    }

    #[test]
    fn rejects_array_of_non_objects() {
        let text = "Values: [1, 2, 3] here.";
        let (cleaned, artifact) = extract_artifact(text, true);
        assert!(artifact.is_none());
        assert_eq!(cleaned, text);
    }

    #[test]
    fn not_requested_passes_through() {
        let (cleaned, artifact) = extract_artifact(&fenced_response(), false);
        assert!(artifact.is_none());
        assert!(cleaned.contains("```json"));
    }

    #[test]
    fn handles_braces_inside_strings() {
        let text = r#"{"visualizationType": "array", "message": "use {braces} freely"}"#;
        let (_, artifact) = extract_artifact(text, true);
        assert_eq!(artifact.unwrap()["message"], "use {braces} freely");
    }

    mod code_fence {
        use super::*;

        #[test]
        fn strips_json_fence() {
            assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        }

        #[test]
        fn strips_anonymous_fence() {
            assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        }

        #[test]
        fn leaves_bare_json_alone() {
            assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
        }
    }
}
