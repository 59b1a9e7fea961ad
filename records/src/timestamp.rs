//! Server-assigned timestamp sentinel.
//!
//! Writers cannot know the store's clock, so they put a sentinel object in
//! the field and the store substitutes its own time on commit. The browser
//! host translates the sentinel into the SDK's native server-timestamp value.

#[cfg(test)]
#[path = "timestamp_test.rs"]
mod timestamp_test;

use serde_json::{Map, Value, json};

const SENTINEL_KEY: &str = ".sv";
const SENTINEL_VALUE: &str = "timestamp";

/// The sentinel value to place in a field that should receive commit time.
#[must_use]
pub fn server_timestamp() -> Value {
    json!({ SENTINEL_KEY: SENTINEL_VALUE })
}

/// Whether `value` is the server-timestamp sentinel.
#[must_use]
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|obj| obj.get(SENTINEL_KEY))
        .and_then(Value::as_str)
        .is_some_and(|v| v == SENTINEL_VALUE)
}

/// Replace every top-level sentinel in `fields` with `now_ms`.
pub fn resolve_server_timestamps(fields: &mut Map<String, Value>, now_ms: i64) {
    for value in fields.values_mut() {
        if is_server_timestamp(value) {
            *value = Value::from(now_ms);
        }
    }
}
