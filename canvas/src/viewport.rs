//! Viewport transform: zoom and pan over the reference image.
//!
//! Screen space is CSS pixels relative to the display area's top-left corner.
//! Image space is the reference image's native pixel grid, the coordinate
//! space every layer is stored in. The mapping is `screen = image * zoom + pan`.
//!
//! The viewport does not know about drawing state. The stroke engine asks it
//! to convert pointer positions, and the compositor and host ask it for the
//! current scale and CSS transforms.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_FIT_CONTAINER_PX, MIN_ZOOM, WHEEL_ZOOM_STEP};

/// A point in either screen or image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Native pixel dimensions of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero (image not loaded).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[must_use]
    pub fn as_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Zoom and pan, as persisted in browser storage.
///
/// `pan_x` / `pan_y` are in CSS pixels. `zoom` is a scale factor (1.0 = native size).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self { zoom: 1.0, pan_x: 0.0, pan_y: 0.0 }
    }
}

impl ViewportState {
    /// Replace non-finite or non-positive values and clamp zoom into range.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let zoom = if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            1.0
        };
        let pan_x = if self.pan_x.is_finite() { self.pan_x } else { 0.0 };
        let pan_y = if self.pan_y.is_finite() { self.pan_y } else { 0.0 };
        Self { zoom, pan_x, pan_y }
    }
}

/// Owner of the zoom/pan transform and the zoom-to-fit marker.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    state: ViewportState,
    /// URL of the reference image the current fit was computed for.
    last_fit_url: Option<String>,
}

impl Viewport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted state.
    #[must_use]
    pub fn restore(state: ViewportState) -> Self {
        Self { state: state.sanitized(), last_fit_url: None }
    }

    #[must_use]
    pub fn state(&self) -> ViewportState {
        self.state
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    /// Zoom by `scale_factor`, keeping the image point under `screen` fixed.
    ///
    /// Returns `false` when the factor is unusable or the clamped zoom does not
    /// change; pan is left untouched in that case.
    pub fn zoom_at(&mut self, screen: Point, scale_factor: f64) -> bool {
        if !scale_factor.is_finite() || scale_factor <= 0.0 {
            return false;
        }
        let old_zoom = self.state.zoom;
        let new_zoom = (old_zoom * scale_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - old_zoom).abs() <= f64::EPSILON * old_zoom {
            return false;
        }
        let ratio = new_zoom / old_zoom;
        self.state.pan_x = screen.x - (screen.x - self.state.pan_x) * ratio;
        self.state.pan_y = screen.y - (screen.y - self.state.pan_y) * ratio;
        self.state.zoom = new_zoom;
        true
    }

    /// Translate the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.state.pan_x += dx;
            self.state.pan_y += dy;
        }
    }

    /// Convert a screen-space point (CSS pixels) to image space.
    #[must_use]
    pub fn to_image_space(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.state.pan_x) / self.state.zoom,
            y: (screen.y - self.state.pan_y) / self.state.zoom,
        }
    }

    /// Convert an image-space point to screen space (CSS pixels).
    #[must_use]
    pub fn to_screen_space(&self, image: Point) -> Point {
        Point {
            x: image.x * self.state.zoom + self.state.pan_x,
            y: image.y * self.state.zoom + self.state.pan_y,
        }
    }

    /// Fit `natural` inside `container`, centred, once per reference image.
    ///
    /// Repeated calls for the same `image_url` are no-ops so layout passes do
    /// not undo a manual pan/zoom. A container that has not been laid out yet
    /// (either edge under [`MIN_FIT_CONTAINER_PX`]) leaves the marker unset so
    /// the fit happens once the container becomes visible.
    pub fn fit_to_container(&mut self, image_url: &str, container: Size, natural: ImageSize) -> bool {
        if self.last_fit_url.as_deref() == Some(image_url) || natural.is_empty() {
            return false;
        }
        if container.width < MIN_FIT_CONTAINER_PX || container.height < MIN_FIT_CONTAINER_PX {
            return false;
        }
        let image = natural.as_size();
        let zoom = (container.width / image.width)
            .min(container.height / image.height)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        self.state = ViewportState {
            zoom,
            pan_x: (container.width - image.width * zoom) / 2.0,
            pan_y: (container.height - image.height * zoom) / 2.0,
        };
        self.last_fit_url = Some(image_url.to_owned());
        true
    }

    /// The image URL the current fit belongs to, if any.
    #[must_use]
    pub fn last_fit_url(&self) -> Option<&str> {
        self.last_fit_url.as_deref()
    }

    /// Forget the fit marker so the next [`Self::fit_to_container`] recomputes.
    pub fn invalidate_fit(&mut self) {
        self.last_fit_url = None;
    }

    /// CSS transform for the reference image (natural-size element).
    #[must_use]
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.state.pan_x, self.state.pan_y, self.state.zoom
        )
    }

    /// CSS transform for the drawing surface.
    ///
    /// The surface's CSS size already tracks `natural * zoom`, so it only
    /// needs the translation to line up with the image.
    #[must_use]
    pub fn surface_css_transform(&self) -> String {
        format!("translate({}px, {}px)", self.state.pan_x, self.state.pan_y)
    }
}

/// Zoom factor for a wheel event: up zooms in, down zooms out.
#[must_use]
pub fn wheel_factor(delta_y: f64) -> f64 {
    if delta_y < 0.0 {
        1.0 + WHEEL_ZOOM_STEP
    } else {
        1.0 - WHEEL_ZOOM_STEP
    }
}
