//! Merge-on-write rules.

use serde_json::Value;

/// Loose truthiness of a stored value.
///
/// `null`, `false`, zero and the empty string are falsy. Arrays and objects
/// are always truthy, even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Combines an incoming value with whatever is already stored.
///
/// A falsy existing value counts as absent. Two arrays concatenate, existing
/// elements first. Two objects merge shallowly with incoming keys winning.
/// Anything else is replaced by `incoming`.
pub fn merge(existing: Option<Value>, incoming: Value) -> Value {
    match (existing.filter(is_truthy), incoming) {
        (Some(Value::Array(mut current)), Value::Array(added)) => {
            current.extend(added);
            Value::Array(current)
        }
        (Some(Value::Object(mut current)), Value::Object(added)) => {
            for (key, value) in added {
                current.insert(key, value);
            }
            Value::Object(current)
        }
        (_, incoming) => incoming,
    }
}
