//! Browser `localStorage` helpers for per-browser overlay settings.
//!
//! SYSTEM CONTEXT
//! ==============
//! The viewport, brush settings, and the session/role hand-off left by the
//! login page all live in `localStorage`. These helpers keep the web-sys
//! glue in one place; outside the browser build they read nothing and write
//! nothing.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Load the raw string stored under `key`.
pub fn load_raw(key: &str) -> Option<String> {
    #[cfg(feature = "csr")]
    {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
        storage.get_item(key).ok().flatten()
    }
    #[cfg(not(feature = "csr"))]
    {
        let _ = key;
        None
    }
}

/// Load a JSON value from `localStorage` for `key`.
///
/// Unparsable values are logged and treated as absent.
pub fn load_json<T: DeserializeOwned>(key: &str) -> Option<T> {
    let raw = load_raw(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("ignoring stored {key}: {err}");
            None
        }
    }
}

/// Save a JSON value to `localStorage` for `key`.
pub fn save_json<T: Serialize>(key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(err) => {
            log::warn!("cannot serialize {key}: {err}");
            return;
        }
    };
    #[cfg(feature = "csr")]
    {
        let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) else {
            return;
        };
        if let Err(err) = storage.set_item(key, &raw) {
            log::warn!("cannot save {key}: {err:?}");
        }
    }
    #[cfg(not(feature = "csr"))]
    {
        let _ = raw;
    }
}
