//! Compositor: merges every layer into the visible drawing surface.
//!
//! The surface's backing store tracks `natural * zoom * device_pixel_ratio`
//! device pixels while its CSS size tracks `natural * zoom`, so ink stays
//! crisp at any zoom level. Layers are painted in ascending participant-id
//! order; two clients holding the same layers produce identical output no
//! matter in which order the layers arrived.
//!
//! DESIGN
//! ======
//! A [`DisplaySurface`] keeps its own mirror of every layer. The engine
//! uploads only the regions a stroke or snapshot touched, then asks the
//! surface to composite: one scaled blit per layer. Per pointer move that is
//! one segment's pixels plus O(layers) blits, never a full-resolution copy.
//!
//! [`repaint`] does the same composite in software into a [`Frame`], for
//! headless checks of what a surface should show.

#[cfg(test)]
#[path = "compositor_test.rs"]
mod compositor_test;

use tiny_skia::{BlendMode, FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::consts::{MAX_BACKING_AREA_PX, MAX_BACKING_EDGE_PX};
use crate::layer::{Damage, Layer, LayerStore};
use crate::viewport::{ImageSize, Size, Viewport};

/// Size and scale of the drawing surface for one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    /// Reference image size; every layer is held at this size.
    pub natural: ImageSize,
    /// Displayed size in CSS pixels.
    pub css_size: Size,
    /// Device pixels per image pixel.
    pub scale: f64,
    /// Backing store size in device pixels.
    pub backing: ImageSize,
}

/// One software-composited drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Backing pixels (premultiplied RGBA), in device pixels.
    pub pixmap: Pixmap,
    pub geometry: SurfaceGeometry,
}

impl Frame {
    #[must_use]
    pub fn backing_size(&self) -> ImageSize {
        ImageSize::new(self.pixmap.width(), self.pixmap.height())
    }
}

/// Anything that can mirror layers and show their composite.
pub trait DisplaySurface {
    type Error;

    /// Copy the `damage` region of `participant`'s layer into the surface's
    /// mirror of it, creating the mirror when needed.
    ///
    /// # Errors
    ///
    /// Returns the surface's own error when the upload fails.
    fn upload_layer(&mut self, participant: &str, layer: &Layer, damage: Damage) -> Result<(), Self::Error>;

    /// Draw the mirrored layers listed in `paint_order`, in that order, at
    /// `geometry`. Mirrors of layers not listed are dropped.
    ///
    /// # Errors
    ///
    /// Returns the surface's own error when drawing fails.
    fn composite(&mut self, paint_order: &[&str], geometry: &SurfaceGeometry) -> Result<(), Self::Error>;

    /// Show nothing and drop every mirror (no reference image loaded).
    ///
    /// # Errors
    ///
    /// Returns the surface's own error when it cannot be cleared.
    fn clear(&mut self) -> Result<(), Self::Error>;
}

/// Surface geometry for `natural` at `zoom` and `dpr`.
///
/// The device scale is reduced so the backing store stays within
/// [`MAX_BACKING_EDGE_PX`] per edge and [`MAX_BACKING_AREA_PX`] in total.
#[must_use]
pub fn surface_geometry(natural: ImageSize, zoom: f64, dpr: f64) -> Option<SurfaceGeometry> {
    if natural.is_empty() || !zoom.is_finite() || zoom <= 0.0 {
        return None;
    }
    let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
    let (width, height) = (f64::from(natural.width), f64::from(natural.height));
    let scale = (zoom * dpr)
        .min(MAX_BACKING_EDGE_PX / width.max(height))
        .min((MAX_BACKING_AREA_PX / (width * height)).sqrt());
    // Floor (with slack for float error) so the caps hold after rounding.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let edge = |px: f64| ((px * scale + 1e-6).floor() as u32).max(1);
    Some(SurfaceGeometry {
        natural,
        css_size: Size::new(width * zoom, height * zoom),
        scale,
        backing: ImageSize::new(edge(width), edge(height)),
    })
}

/// Draw `layers`, in order, into `target` scaled by `scale`.
pub fn paint_layers<'a>(target: &mut Pixmap, layers: impl IntoIterator<Item = &'a Pixmap>, scale: f64) {
    #[allow(clippy::cast_possible_truncation)]
    let transform = Transform::from_scale(scale as f32, scale as f32);
    let paint = PixmapPaint {
        opacity: 1.0,
        blend_mode: BlendMode::SourceOver,
        quality: FilterQuality::Bilinear,
    };
    for layer in layers {
        target.draw_pixmap(0, 0, layer.as_ref(), &paint, transform, None);
    }
}

/// Paint every layer in `layers` into a fresh frame.
///
/// Returns `None` while no reference image size is known.
#[must_use]
pub fn repaint(layers: &LayerStore, viewport: &Viewport, dpr: f64) -> Option<Frame> {
    let geometry = surface_geometry(layers.size()?, viewport.zoom(), dpr)?;
    let mut pixmap = Pixmap::new(geometry.backing.width, geometry.backing.height)?;
    paint_layers(&mut pixmap, layers.sorted().map(|(_, layer)| layer.pixmap()), geometry.scale);
    Some(Frame { pixmap, geometry })
}
