use serde_json::{Map, Value, json};

use super::*;

#[test]
fn sentinel_is_recognised() {
    assert!(is_server_timestamp(&server_timestamp()));
    assert!(!is_server_timestamp(&json!("timestamp")));
    assert!(!is_server_timestamp(&json!({ ".sv": "increment" })));
}

#[test]
fn resolve_replaces_only_sentinels() {
    let mut fields = Map::new();
    fields.insert("updatedAt".to_owned(), server_timestamp());
    fields.insert("email".to_owned(), json!("a@example.com"));
    resolve_server_timestamps(&mut fields, 42);
    assert_eq!(fields.get("updatedAt"), Some(&Value::from(42)));
    assert_eq!(fields.get("email"), Some(&json!("a@example.com")));
}
