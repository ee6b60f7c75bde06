//! Recovering the payload from a tool response envelope.

use serde_json::Value;

/// Unwrap `{content: [...]}`.
///
/// - A single text item: its text re-parsed as JSON, or the text itself.
/// - Any other content array (several items, or non-text items): the array.
/// - Anything not shaped like an envelope: returned unchanged.
pub fn extract_value(envelope: &Value) -> Value {
    let Some(content) = envelope.get("content").and_then(Value::as_array) else {
        return envelope.clone();
    };

    if let [item] = content.as_slice() {
        if item.get("type").and_then(Value::as_str) == Some("text") {
            if let Some(text) = item.get("text").and_then(Value::as_str) {
                return serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
            }
        }
    }

    Value::Array(content.clone())
}

/// Whether the envelope carries `isError: true`.
pub fn is_error(envelope: &Value) -> bool {
    envelope.get("isError").and_then(Value::as_bool).unwrap_or(false)
}

/// Concatenated text of every text item, for error reporting.
pub fn text_content(envelope: &Value) -> String {
    envelope
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}
