//! Shaping of tool results and model text into the query response.

use serde_json::{json, Map, Value};

/// Strip code fences and escaped quotes from the model's closing text.
pub fn clean_summary(text: &str) -> String {
    text.replace("```json", "")
        .replace("```", "")
        .replace("\\'", "")
        .replace("\\\"", "")
        .trim()
        .to_string()
}

/// Cut `text` to at most `max` characters, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Combine the last tool result with the model's summary under `"response"`.
///
/// Object results keep their fields; the summary wins a key collision.
/// Other results are nested under `"result"`.
pub fn merge_response(last_result: Option<&Value>, summary: &str) -> Value {
    match last_result {
        Some(Value::Object(fields)) => {
            let mut merged: Map<String, Value> = fields.clone();
            merged.insert("response".to_string(), Value::String(summary.to_string()));
            Value::Object(merged)
        }
        Some(Value::Null) | None => json!({ "response": summary }),
        Some(other) => json!({ "result": other, "response": summary }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_summary() {
        assert_eq!(
            clean_summary("```json\n{\"a\": 1}\n```"),
            "{\"a\": 1}"
        );
        assert_eq!(clean_summary("  It\\'s a \\\"walk-off\\\"  "), "Its a walk-off");
        assert_eq!(clean_summary("plain"), "plain");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("Peña Núñez", 6), "Peña N");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_merge_object_result() {
        let result = json!({ "roster": [{ "person": { "id": 1 } }], "response": "stale" });
        let merged = merge_response(Some(&result), "26 players.");
        assert_eq!(merged["roster"], result["roster"]);
        assert_eq!(merged["response"], "26 players.");
    }

    #[test]
    fn test_merge_non_object_result() {
        let merged = merge_response(Some(&json!([1, 2])), "two");
        assert_eq!(merged, json!({ "result": [1, 2], "response": "two" }));
    }

    #[test]
    fn test_merge_without_result() {
        assert_eq!(merge_response(None, "hi"), json!({ "response": "hi" }));
        assert_eq!(
            merge_response(Some(&Value::Null), "hi"),
            json!({ "response": "hi" })
        );
    }
}
