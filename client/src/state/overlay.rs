//! Presentation state for the drawing overlay chrome.
//!
//! DESIGN
//! ======
//! The engine owns drawing semantics; this struct mirrors the handful of
//! values the toolbar and display area render, so views never borrow the
//! engine. The host refreshes it from the engine after every command.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use canvas::consts::{DEFAULT_INK_COLOR, DEFAULT_INK_WIDTH};
use canvas::engine::EngineCore;
use canvas::input::CURSOR_GRAB;
use canvas::stroke::Tool;

/// Toolbar and display-area state for the overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayState {
    /// Active drawing tool; `None` while drawing mode is off.
    pub tool: Option<Tool>,
    pub color: String,
    pub width: f32,
    pub is_gm: bool,
    /// Reference image currently on display.
    pub display_url: Option<String>,
    pub signed_in: bool,
    pub cursor: &'static str,
    /// `false` when drawings are not shared with other participants.
    pub shared: bool,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            tool: None,
            color: DEFAULT_INK_COLOR.to_owned(),
            width: DEFAULT_INK_WIDTH,
            is_gm: false,
            display_url: None,
            signed_in: false,
            cursor: CURSOR_GRAB,
            shared: true,
        }
    }
}

impl OverlayState {
    /// Copy the engine-owned values into the view state.
    pub fn sync_from(&mut self, core: &EngineCore) {
        let brush = core.brush();
        self.tool = core.tool();
        self.color = brush.color().to_hex();
        self.width = brush.width();
        self.is_gm = core.role().is_gm();
        self.signed_in = core.participant().is_some();
        self.cursor = core.cursor();
    }

    /// Whether `tool` is the active drawing tool.
    pub fn is_active(&self, tool: Tool) -> bool {
        self.tool == Some(tool)
    }

    /// Whether the toolbar should offer drawing at all.
    pub fn can_draw(&self) -> bool {
        self.signed_in && self.display_url.is_some()
    }

    /// Width slider label, e.g. `4px`.
    pub fn width_label(&self) -> String {
        format!("{}px", self.width.round())
    }

    /// Status line shown under the toolbar, if any.
    pub fn status(&self) -> Option<&'static str> {
        if !self.signed_in {
            Some("Sign in to draw")
        } else if self.display_url.is_none() {
            Some("Nothing on display")
        } else if !self.shared {
            Some("Offline: drawings stay on this device")
        } else {
            None
        }
    }
}
