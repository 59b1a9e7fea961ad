//! Stroke engine: pointer gestures become line segments on the local layer.
//!
//! A stroke is transient. Pointer-down latches the tool and brush and
//! records the starting point; each pointer-move appends one segment from
//! the previous point; pointer-up (or cancel/blur) returns to idle. Only the
//! resulting raster change is ever persisted, never the path.
//!
//! DESIGN
//! ======
//! The engine draws straight into the participant's [`Layer`] in image
//! space, so zoom and pan never affect stored pixels. Segments are stroked
//! individually with round caps and joins, which keeps consecutive segments
//! visually continuous without retaining the whole path.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use tiny_skia::{BlendMode, Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::color::InkColor;
use crate::consts::{DEFAULT_INK_COLOR, DEFAULT_INK_WIDTH, ERASER_WIDTH, MAX_INK_WIDTH, MIN_INK_WIDTH};
use crate::layer::{LayerStore, PixelRect};
use crate::viewport::{Point, Viewport};

/// How a stroke affects the pixels beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Paint with the brush colour (`source-over`).
    Ink,
    /// Remove coverage (`destination-out`) with a fixed wide tip.
    Erase,
}

impl Tool {
    /// Tip width in image pixels for this tool.
    #[must_use]
    pub fn width(self, brush: &Brush) -> f32 {
        match self {
            Self::Ink => brush.width(),
            Self::Erase => ERASER_WIDTH,
        }
    }

    #[must_use]
    pub fn blend_mode(self) -> BlendMode {
        match self {
            Self::Ink => BlendMode::SourceOver,
            Self::Erase => BlendMode::DestinationOut,
        }
    }
}

/// Ink colour and width chosen in the toolbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    color: InkColor,
    width: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: InkColor::parse(DEFAULT_INK_COLOR).unwrap_or(InkColor::RED),
            width: DEFAULT_INK_WIDTH,
        }
    }
}

impl Brush {
    #[must_use]
    pub fn new(color: InkColor, width: f32) -> Self {
        Self { color, width: clamp_width(width) }
    }

    #[must_use]
    pub fn color(&self) -> InkColor {
        self.color
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Adopt a CSS hex colour. Invalid input keeps the previous colour.
    pub fn set_color(&mut self, raw: &str) -> bool {
        match InkColor::parse(raw) {
            Some(color) => {
                self.color = color;
                true
            }
            None => false,
        }
    }

    /// Adopt a width, clamped to the selectable range.
    pub fn set_width(&mut self, width: f32) {
        self.width = clamp_width(width);
    }

    /// Adopt a width typed into a form field; unparsable input resets to the default.
    pub fn set_width_str(&mut self, raw: &str) {
        self.width = match raw.trim().parse::<f32>() {
            Ok(width) if width.is_finite() => clamp_width(width),
            _ => DEFAULT_INK_WIDTH,
        };
    }
}

fn clamp_width(width: f32) -> f32 {
    if width.is_finite() {
        width.clamp(MIN_INK_WIDTH, MAX_INK_WIDTH)
    } else {
        DEFAULT_INK_WIDTH
    }
}

/// Gesture state of the local stroke.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    Drawing {
        /// Image-space end of the previous segment.
        last: Point,
        /// Latched at pointer-down; tool changes mid-stroke do not apply.
        tool: Tool,
        brush: Brush,
    },
}

/// Drives the local participant's stroke.
#[derive(Debug, Clone, Default)]
pub struct StrokeEngine {
    state: StrokeState,
}

impl StrokeEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> StrokeState {
        self.state
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, StrokeState::Drawing { .. })
    }

    /// The tool latched by the in-progress stroke.
    #[must_use]
    pub fn active_tool(&self) -> Option<Tool> {
        match self.state {
            StrokeState::Drawing { tool, .. } => Some(tool),
            StrokeState::Idle => None,
        }
    }

    /// Begin a stroke at `screen` on `participant`'s layer.
    ///
    /// Allocates the layer on first use. Returns `false` (and stays idle)
    /// when a stroke is already running or no reference image is loaded.
    pub fn pointer_down(
        &mut self,
        viewport: &Viewport,
        layers: &mut LayerStore,
        participant: &str,
        screen: Point,
        tool: Tool,
        brush: Brush,
    ) -> bool {
        if self.is_drawing() || layers.get_or_create(participant).is_none() {
            return false;
        }
        self.state = StrokeState::Drawing { last: viewport.to_image_space(screen), tool, brush };
        true
    }

    /// Extend the stroke to `screen`. Returns whether pixels changed.
    ///
    /// The segment's bounds are recorded as damage on the layer.
    pub fn pointer_move(
        &mut self,
        viewport: &Viewport,
        layers: &mut LayerStore,
        participant: &str,
        screen: Point,
    ) -> bool {
        let StrokeState::Drawing { last, tool, brush } = self.state else {
            return false;
        };
        let next = viewport.to_image_space(screen);
        self.state = StrokeState::Drawing { last: next, tool, brush };
        let Some(layer) = layers.get_or_create(participant) else {
            return false;
        };
        let size = layer.size();
        if !draw_segment(layer.pixmap_mut(), last, next, tool, &brush) {
            return false;
        }
        // Half the tip plus one pixel of anti-aliasing.
        let pad = f64::from(tool.width(&brush)) / 2.0 + 1.0;
        let bounds = PixelRect::covering(
            last.x.min(next.x) - pad,
            last.y.min(next.y) - pad,
            last.x.max(next.x) + pad,
            last.y.max(next.y) + pad,
            size,
        );
        if let Some(rect) = bounds {
            layers.mark_damaged(participant, rect);
        }
        true
    }

    /// End the stroke. Returns `true` exactly once per stroke.
    pub fn finish(&mut self) -> bool {
        let was_drawing = self.is_drawing();
        self.state = StrokeState::Idle;
        was_drawing
    }
}

/// Stroke one segment from `from` to `to` in image space.
///
/// Zero-length and non-finite segments draw nothing.
pub fn draw_segment(pixmap: &mut Pixmap, from: Point, to: Point, tool: Tool, brush: &Brush) -> bool {
    #[allow(clippy::cast_possible_truncation)]
    let (x0, y0, x1, y1) = (from.x as f32, from.y as f32, to.x as f32, to.y as f32);
    if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) || ((x1 - x0).abs() < f32::EPSILON && (y1 - y0).abs() < f32::EPSILON) {
        return false;
    }
    let mut builder = PathBuilder::new();
    builder.move_to(x0, y0);
    builder.line_to(x1, y1);
    let Some(path) = builder.finish() else {
        return false;
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.blend_mode = tool.blend_mode();
    paint.set_color(match tool {
        Tool::Ink => brush.color().to_skia(),
        Tool::Erase => Color::BLACK,
    });
    let stroke = Stroke {
        width: tool.width(brush),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    true
}
