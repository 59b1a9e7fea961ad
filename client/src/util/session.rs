//! Session hand-off from the login page.
//!
//! The login and lobby pages store the active session id and the user's
//! role in `localStorage`; the drawing overlay only reads them.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use canvas::identity::Role;

use crate::util::ui_persistence::load_raw;

/// `localStorage` key holding the active session id.
pub const SESSION_KEY: &str = "currentSessionId";

/// `localStorage` key holding the user's role in that session.
pub const ROLE_KEY: &str = "currentUserRole";

/// A usable session id from a stored value.
#[must_use]
pub fn normalize_session_id(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|id| !id.is_empty() && !id.contains('/') && *id != "null" && *id != "undefined")
        .map(str::to_owned)
}

/// The active session id, if the login page left one.
pub fn current_session_id() -> Option<String> {
    normalize_session_id(load_raw(SESSION_KEY).as_deref())
}

/// The user's role; players unless the login page says otherwise.
pub fn current_role() -> Role {
    load_raw(ROLE_KEY).map_or(Role::Player, |raw| Role::parse(&raw))
}
