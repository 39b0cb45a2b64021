//! Light type inference for non-file parts.

use crate::model::FieldValue;

/// Turns the content of a text part into a typed value.
///
/// `true`/`false` become booleans, a JSON array of strings becomes a list,
/// anything else stays as the trimmed text. Never fails.
pub fn coerce_value(content: &[u8]) -> FieldValue {
    let text = String::from_utf8_lossy(content);
    let trimmed = text.trim();

    match trimmed {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ if trimmed.starts_with('[') && trimmed.ends_with(']') => {
            serde_json::from_str::<Vec<String>>(trimmed)
                .map(FieldValue::List)
                .unwrap_or_else(|_| FieldValue::Text(trimmed.to_string()))
        }
        _ => FieldValue::Text(trimmed.to_string()),
    }
}
