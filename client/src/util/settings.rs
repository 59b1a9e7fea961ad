//! Persisted overlay settings: viewport and brush.
//!
//! DESIGN
//! ======
//! Stored values come from an older page version or a hand-edited
//! `localStorage`, so every read is sanitised on the way in: a bad colour
//! keeps the default, a bad width falls back to the default width, and a
//! non-finite viewport becomes the identity view.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use canvas::consts::{DEFAULT_INK_COLOR, DEFAULT_INK_WIDTH};
use canvas::stroke::Brush;
use canvas::viewport::ViewportState;
use serde::{Deserialize, Serialize};

use crate::util::ui_persistence::{load_json, save_json};

/// `localStorage` key for the saved viewport.
pub const VIEWPORT_KEY: &str = "drawingViewport";

/// `localStorage` key for the saved brush.
pub const BRUSH_KEY: &str = "drawingBrush";

/// Brush settings as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    pub color: String,
    pub width: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self { color: DEFAULT_INK_COLOR.to_owned(), width: DEFAULT_INK_WIDTH }
    }
}

impl BrushSettings {
    #[must_use]
    pub fn from_brush(brush: &Brush) -> Self {
        Self { color: brush.color().to_hex(), width: brush.width() }
    }

    /// The brush these settings describe, sanitised.
    #[must_use]
    pub fn to_brush(&self) -> Brush {
        let mut brush = Brush::default();
        if !brush.set_color(&self.color) {
            log::debug!("stored ink colour {:?} is invalid; using default", self.color);
        }
        brush.set_width(self.width);
        brush
    }
}

/// The stored viewport, or the identity view.
pub fn load_viewport() -> ViewportState {
    load_json::<ViewportState>(VIEWPORT_KEY).unwrap_or_default().sanitized()
}

pub fn save_viewport(state: ViewportState) {
    save_json(VIEWPORT_KEY, &state);
}

/// The stored brush, or the default red 4px brush.
pub fn load_brush() -> Brush {
    load_json::<BrushSettings>(BRUSH_KEY).unwrap_or_default().to_brush()
}

pub fn save_brush(brush: &Brush) {
    save_json(BRUSH_KEY, &BrushSettings::from_brush(brush));
}
