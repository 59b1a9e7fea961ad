//! Browser presentation: mirrors layers into offscreen `<canvas>` elements,
//! composites them onto the visible drawing canvas, and keeps the DOM
//! elements aligned with the viewport.
//!
//! This module is the only place that touches [`web_sys`]. It receives
//! layer pixels and read-only geometry; it never mutates engine state. All
//! fallible DOM calls propagate `JsValue` errors to the host.
//!
//! Each layer has a mirror canvas at the image's native size. Uploads copy
//! only the damaged rectangle with `putImageData`; the composite is one
//! `drawImage` per mirror under a `dpr * zoom` transform, so the browser
//! does the scaling and blending.

use std::collections::BTreeMap;

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, ImageData};

use crate::compositor::{DisplaySurface, SurfaceGeometry};
use crate::layer::{Damage, Layer, PixelRect};
use crate::viewport::{ImageSize, Viewport};

/// An offscreen canvas holding one participant's layer.
struct LayerCanvas {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

/// The visible drawing `<canvas>` plus one mirror per layer.
pub struct CanvasDisplay {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    document: Document,
    layers: BTreeMap<String, LayerCanvas>,
    /// Reused straight-alpha RGBA buffer.
    scratch: Vec<u8>,
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}

fn resize(canvas: &HtmlCanvasElement, size: ImageSize) -> bool {
    if canvas.width() == size.width && canvas.height() == size.height {
        return false;
    }
    canvas.set_width(size.width);
    canvas.set_height(size.height);
    true
}

impl CanvasDisplay {
    /// Bind to `canvas` and its 2D context.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context or no owner document.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = context_2d(&canvas)?;
        let document = canvas
            .owner_document()
            .ok_or_else(|| JsValue::from_str("drawing canvas is not in a document"))?;
        Ok(Self { canvas, ctx, document, layers: BTreeMap::new(), scratch: Vec::new() })
    }

    fn new_layer_canvas(&self, size: ImageSize) -> Result<LayerCanvas, JsValue> {
        let canvas = self.document.create_element("canvas")?.dyn_into::<HtmlCanvasElement>()?;
        resize(&canvas, size);
        let ctx = context_2d(&canvas)?;
        Ok(LayerCanvas { canvas, ctx })
    }
}

impl DisplaySurface for CanvasDisplay {
    type Error = JsValue;

    fn upload_layer(&mut self, participant: &str, layer: &Layer, damage: Damage) -> Result<(), JsValue> {
        let size = layer.size();
        let fresh = match self.layers.get(participant) {
            Some(mirror) => resize(&mirror.canvas, size),
            None => {
                let mirror = self.new_layer_canvas(size)?;
                self.layers.insert(participant.to_owned(), mirror);
                true
            }
        };
        let rect = match damage {
            Damage::Region(rect) if !fresh => rect,
            _ => PixelRect::full(size),
        };
        let Some(mirror) = self.layers.get(participant) else {
            return Ok(());
        };
        // ImageData is straight alpha; layers are premultiplied.
        layer.straight_rgba(rect, &mut self.scratch);
        let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(self.scratch.as_slice()), rect.width, rect.height)?;
        mirror.ctx.put_image_data(&image, f64::from(rect.x), f64::from(rect.y))
    }

    fn composite(&mut self, paint_order: &[&str], geometry: &SurfaceGeometry) -> Result<(), JsValue> {
        self.layers.retain(|id, _| paint_order.contains(&id.as_str()));
        resize(&self.canvas, geometry.backing);
        let style = self.canvas.style();
        style.set_property("width", &format!("{}px", geometry.css_size.width))?;
        style.set_property("height", &format!("{}px", geometry.css_size.height))?;

        self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
        self.ctx
            .clear_rect(0.0, 0.0, f64::from(geometry.backing.width), f64::from(geometry.backing.height));
        self.ctx.set_global_composite_operation("source-over")?;
        self.ctx.set_transform(geometry.scale, 0.0, 0.0, geometry.scale, 0.0, 0.0)?;
        for id in paint_order {
            if let Some(mirror) = self.layers.get(*id) {
                self.ctx.draw_image_with_html_canvas_element(&mirror.canvas, 0.0, 0.0)?;
            }
        }
        self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    fn clear(&mut self) -> Result<(), JsValue> {
        self.layers.clear();
        self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
        self.ctx
            .clear_rect(0.0, 0.0, f64::from(self.canvas.width()), f64::from(self.canvas.height()));
        Ok(())
    }
}

/// Apply the viewport to the reference image and the drawing surface.
///
/// The image is scaled by CSS; the surface is already sized to the zoomed
/// image so it is only translated. Both use a top-left transform origin.
///
/// # Errors
///
/// Returns `Err` if a style property cannot be set.
pub fn apply_viewport(image: &HtmlElement, surface: &HtmlElement, viewport: &Viewport) -> Result<(), JsValue> {
    let image_style = image.style();
    image_style.set_property("transform-origin", "0 0")?;
    image_style.set_property("transform", &viewport.css_transform())?;
    let surface_style = surface.style();
    surface_style.set_property("transform-origin", "0 0")?;
    surface_style.set_property("transform", &viewport.surface_css_transform())
}
