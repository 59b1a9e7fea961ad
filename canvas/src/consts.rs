//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest zoom factor; keeps the transform invertible.
pub const MIN_ZOOM: f64 = 0.01;

/// Largest zoom factor.
pub const MAX_ZOOM: f64 = 6.0;

/// Fractional zoom change per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 0.12;

/// Containers narrower or shorter than this (CSS px) are treated as not yet
/// laid out; zoom-to-fit waits for a real size.
pub const MIN_FIT_CONTAINER_PX: f64 = 5.0;

// ── Brush ───────────────────────────────────────────────────────

/// Ink colour used until the user picks one.
pub const DEFAULT_INK_COLOR: &str = "#ff0000";

/// Ink width in image pixels used until the user picks one.
pub const DEFAULT_INK_WIDTH: f32 = 4.0;

/// Narrowest selectable ink width.
pub const MIN_INK_WIDTH: f32 = 1.0;

/// Widest selectable ink width.
pub const MAX_INK_WIDTH: f32 = 64.0;

/// Eraser width in image pixels, independent of the ink width.
pub const ERASER_WIDTH: f32 = 24.0;

// ── Compositor ──────────────────────────────────────────────────

/// Largest edge, in device pixels, of the drawing surface's backing store.
pub const MAX_BACKING_EDGE_PX: f64 = 8192.0;

/// Largest area, in device pixels, of the drawing surface's backing store
/// (4096 x 4096, the smallest canvas area limit among current browsers).
pub const MAX_BACKING_AREA_PX: f64 = 16_777_216.0;
