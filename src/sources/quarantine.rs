//! Corruption quarantine for decoded vendor bodies
//!
//! A top-level member whose value contains a string with NUL or other
//! control characters is dropped before normalization. Tab, CR and LF are
//! tolerated since vendors legitimately return multi-line text.

use serde_json::Value;

fn is_corrupt_char(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r')
}

/// True if any string anywhere inside `value` carries control characters
pub fn contains_corruption(value: &Value) -> bool {
    match value {
        Value::String(s) => s.chars().any(is_corrupt_char),
        Value::Array(items) => items.iter().any(contains_corruption),
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k.chars().any(is_corrupt_char) || contains_corruption(v)),
        _ => false,
    }
}

/// Copy of `data` with corrupted top-level members removed
///
/// Non-object bodies pass through untouched.
pub fn quarantine(data: &Value) -> Value {
    let Value::Object(map) = data else {
        return data.clone();
    };

    let mut cleaned = serde_json::Map::with_capacity(map.len());
    for (key, value) in map {
        if member_is_corrupt(key, value) {
            log::debug!("🧪 Quarantined corrupted field '{}'", key.escape_debug());
            continue;
        }
        cleaned.insert(key.clone(), value.clone());
    }

    Value::Object(cleaned)
}

fn member_is_corrupt(key: &str, value: &Value) -> bool {
    key.chars().any(is_corrupt_char) || contains_corruption(value)
}
