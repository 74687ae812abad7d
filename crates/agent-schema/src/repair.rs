//! Helpers for recovering JSON from loosely formatted model output.
//!
//! Providers routinely wrap JSON replies in fenced markdown blocks, quote the
//! whole object as a string, or nest fenced code inside string-valued
//! properties. These helpers undo that damage; they are shared by every
//! adapter and by the response-side validator.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

/// Matches a fenced code block, labeled ```json or unlabeled.
static FENCE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("fence pattern compiles")
});

/// Matches a fenced block with any language label, for fences nested inside
/// string-valued properties.
static NESTED_FENCE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"```[a-zA-Z]*\s*([\s\S]*?)\s*```").expect("nested fence pattern compiles")
});

/// Reason recorded in the fallback envelope when a reply cannot be parsed.
pub const PARSING_ERROR_NOTE: &str = "Failed to parse as JSON. Returning raw response.";

/// Extract the contents of the first fenced code block, if any.
pub fn extract_fenced_block(text: &str) -> Option<&str> {
    FENCE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str())
}

/// Parse model output as JSON, trying a fenced block before the raw text.
///
/// A fence whose contents fail to parse falls through to parsing the raw
/// text, so prose around a fence never masks a parseable reply.
pub fn parse_loose(text: &str) -> Result<Value, serde_json::Error> {
    if let Some(inner) = extract_fenced_block(text) {
        if let Ok(value) = serde_json::from_str(inner) {
            return Ok(value);
        }
    }
    serde_json::from_str(text)
}

/// Build the lenient-path fallback envelope, preserving the raw reply.
pub fn fallback_envelope(raw: &str) -> Value {
    json!({
        "rawResponse": raw,
        "parsingError": PARSING_ERROR_NOTE,
    })
}

/// Whether a value is a fallback envelope produced upstream.
///
/// Such values have already failed parsing once and must pass through the
/// response validator unexamined.
pub fn is_fallback_envelope(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key("rawResponse") && map.contains_key("parsingError"))
}

/// Remove an outer JSON-quoted-string wrapper, if present.
///
/// Some providers return the entire object escaped inside one JSON string
/// (`"{\"a\": 1}"`); this recovers the inner text.
pub fn unwrap_quoted(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') {
        if let Ok(inner) = serde_json::from_str::<String>(trimmed) {
            return inner;
        }
    }
    text.to_string()
}

/// Strip fenced blocks found inside string-valued properties, recursively.
///
/// Providers inconsistently wrap code inside JSON string fields; a string
/// property holding ```-fenced content is replaced by the fence's contents.
/// Objects and arrays are walked recursively.
pub fn strip_nested_fences(value: &mut Value) {
    match value {
        Value::String(text) => {
            let inner = NESTED_FENCE
                .captures(text)
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str().to_string());
            if let Some(inner) = inner {
                *text = inner;
            }
        }
        Value::Object(map) => {
            for nested in map.values_mut() {
                strip_nested_fences(nested);
            }
        }
        Value::Array(items) => {
            for nested in items.iter_mut() {
                strip_nested_fences(nested);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_labeled_fence() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nHope that helps!";
        assert_eq!(extract_fenced_block(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn extracts_unlabeled_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_fenced_block(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn fenced_extraction_ignores_surrounding_prose() {
        let bare = "```json\n{\"answer\": 42}\n```";
        let with_prose = "Sure! Here is the JSON you asked for:\n```json\n{\"answer\": 42}\n```\nLet me know if you need anything else.";

        let a = parse_loose(bare).unwrap();
        let b = parse_loose(with_prose).unwrap();
        assert_eq!(a, b);
        assert_eq!(a["answer"], 42);
    }

    #[test]
    fn unparseable_fence_falls_back_to_raw_text() {
        let text = "```json\nnot json at all\n```";
        assert!(parse_loose(text).is_err());

        // The raw text is one valid JSON string even though the fence
        // contents on their own are not valid JSON.
        let text = "\"```oops```\"";
        let value = parse_loose(text).unwrap();
        assert_eq!(value, json!("```oops```"));
    }

    #[test]
    fn parses_bare_json_without_fence() {
        let value = parse_loose("{\"x\": \"y\"}").unwrap();
        assert_eq!(value["x"], "y");
    }

    #[test]
    fn envelope_is_detected() {
        let envelope = fallback_envelope("oops");
        assert!(is_fallback_envelope(&envelope));
        assert_eq!(envelope["rawResponse"], "oops");

        assert!(!is_fallback_envelope(&json!({"rawResponse": "x"})));
        assert!(!is_fallback_envelope(&json!("plain string")));
    }

    #[test]
    fn unwraps_outer_quoted_string() {
        let wrapped = "\"{\\\"a\\\": 1}\"";
        assert_eq!(unwrap_quoted(wrapped), "{\"a\": 1}");

        // Not a quoted wrapper: returned unchanged.
        assert_eq!(unwrap_quoted("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn strips_fences_inside_string_properties() {
        let mut value = json!({
            "code": "```python\nprint('hi')\n```",
            "nested": {
                "snippet": "```\nlet x = 1;\n```"
            },
            "count": 2
        });

        strip_nested_fences(&mut value);

        assert_eq!(value["code"], "print('hi')");
        assert_eq!(value["nested"]["snippet"], "let x = 1;");
        assert_eq!(value["count"], 2);
    }
}
