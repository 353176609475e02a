//! Shape-tolerant inspection of transcript JSON.
//!
//! The agent CLIs nest the author and the text differently and change the
//! layout between releases, so these helpers look in every known place.

use serde_json::Value;

const ASSISTANT_ROLES: &[&str] = &["assistant", "model", "gemini"];

fn is_assistant_str(v: Option<&Value>) -> bool {
    v.and_then(Value::as_str)
        .is_some_and(|s| ASSISTANT_ROLES.contains(&s))
}

/// Returns true if the entry was written by the agent rather than the user.
pub fn is_assistant_entry(entry: &Value) -> bool {
    if is_assistant_str(entry.get("role")) || is_assistant_str(entry.get("type")) {
        return true;
    }
    ["message", "payload"].iter().any(|key| {
        entry.get(*key).is_some_and(|inner| {
            is_assistant_str(inner.get("role"))
                || inner.get("type").and_then(Value::as_str) == Some("agent_message")
        })
    })
}

/// Returns true if any string inside `value` contains `needle`.
pub fn mentions(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.contains(needle),
        Value::Array(items) => items.iter().any(|v| mentions(v, needle)),
        Value::Object(map) => map.values().any(|v| mentions(v, needle)),
        _ => false,
    }
}
