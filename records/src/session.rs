//! Fields of the session document that the drawing overlay follows.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use serde_json::Value;

/// URL of the picture currently pushed to the Show & Tell display.
pub const CURRENT_DISPLAY_IMAGE: &str = "currentDisplayImage";

/// The reference image URL in a session document body, if one is set.
///
/// An absent, non-string, or blank field all mean "nothing on display".
#[must_use]
pub fn display_image_from(session: &Value) -> Option<String> {
    session
        .get(CURRENT_DISPLAY_IMAGE)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_owned)
}
