//! Input model: mouse buttons, the viewport gesture state machine, and cursors.
//!
//! Strokes have their own state machine in [`crate::stroke`]; this module
//! covers what the pointer does when drawing mode is off, which is panning.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::viewport::Point;

/// Cursor while drawing mode is on.
pub const CURSOR_DRAW: &str = "crosshair";

/// Cursor while idle with drawing mode off.
pub const CURSOR_GRAB: &str = "grab";

/// Cursor during a pan drag.
pub const CURSOR_GRABBING: &str = "grabbing";

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger touch).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// Viewport gesture tracked between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging the view with drawing mode off.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
}

impl Gesture {
    /// Advance a pan to `screen`, returning the screen-space delta.
    pub fn pan_to(&mut self, screen: Point) -> Option<(f64, f64)> {
        let Self::Panning { last_screen } = self else {
            return None;
        };
        let delta = (screen.x - last_screen.x, screen.y - last_screen.y);
        *last_screen = screen;
        Some(delta)
    }

    #[must_use]
    pub fn is_panning(self) -> bool {
        matches!(self, Self::Panning { .. })
    }
}
