use serde_json::json;

use super::*;

#[test]
fn display_image_reads_trimmed_url() {
    let body = json!({ "currentDisplayImage": "  https://cdn.example/a.png ", "name": "Keep" });
    assert_eq!(display_image_from(&body).as_deref(), Some("https://cdn.example/a.png"));
}

#[test]
fn display_image_absent_blank_or_non_string_is_none() {
    assert_eq!(display_image_from(&json!({})), None);
    assert_eq!(display_image_from(&json!({ "currentDisplayImage": "   " })), None);
    assert_eq!(display_image_from(&json!({ "currentDisplayImage": 7 })), None);
    assert_eq!(display_image_from(&json!({ "currentDisplayImage": null })), None);
}
