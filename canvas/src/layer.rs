//! Layer model: per-participant raster surfaces and the in-memory store.
//!
//! Every participant who has drawn on the current reference image owns one
//! [`Layer`], a transparent premultiplied-RGBA raster at the image's native
//! resolution. The [`LayerStore`] maps participant ids to layers and enforces
//! that all of them share the reference image's dimensions: changing the
//! dimensions drops every layer.
//!
//! The store is a `BTreeMap` so iteration is in ascending participant-id
//! order. The compositor paints in that order, which makes the composite
//! independent of the order in which layers arrived.
//!
//! The store also records which part of each layer changed since the display
//! last caught up ([`Damage`]), so a stroke segment costs an upload of the
//! segment's bounds rather than of the whole image.

#[cfg(test)]
#[path = "layer_test.rs"]
mod layer_test;

use std::collections::BTreeMap;
use std::fmt;

use tiny_skia::{BlendMode, Color, FilterQuality, Pixmap, PixmapPaint, PremultipliedColorU8, Transform};

use crate::viewport::ImageSize;

/// Authenticated identity of a connected client; the key for layer ownership.
pub type ParticipantId = String;

/// Axis-aligned pixel rectangle inside a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// The whole of a `size` layer.
    #[must_use]
    pub fn full(size: ImageSize) -> Self {
        Self { x: 0, y: 0, width: size.width, height: size.height }
    }

    /// Smallest pixel rectangle covering the given bounds, clipped to
    /// `within`. `None` when nothing of it lies inside.
    #[must_use]
    pub fn covering(left: f64, top: f64, right: f64, bottom: f64, within: ImageSize) -> Option<Self> {
        if ![left, top, right, bottom].iter().all(|v| v.is_finite()) {
            return None;
        }
        let clamp = |v: f64, max: u32| v.clamp(0.0, f64::from(max));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x0, y0, x1, y1) = (
            clamp(left.floor(), within.width) as u32,
            clamp(top.floor(), within.height) as u32,
            clamp(right.ceil(), within.width) as u32,
            clamp(bottom.ceil(), within.height) as u32,
        );
        (x1 > x0 && y1 > y0).then(|| Self { x: x0, y: y0, width: x1 - x0, height: y1 - y0 })
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Self { x, y, width: right - x, height: bottom - y }
    }
}

/// What part of a layer the display has not seen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Damage {
    /// Every pixel, or a layer the display has never seen.
    Full,
    Region(PixelRect),
}

impl Damage {
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Region(a), Self::Region(b)) => Self::Region(a.union(b)),
            _ => Self::Full,
        }
    }
}

/// One participant's ink, in image-space pixels.
#[derive(Clone, PartialEq)]
pub struct Layer {
    pixmap: Pixmap,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .finish_non_exhaustive()
    }
}

impl Layer {
    /// A fully transparent layer. `None` for empty or oversized dimensions.
    #[must_use]
    pub fn new(size: ImageSize) -> Option<Self> {
        Pixmap::new(size.width, size.height).map(|pixmap| Self { pixmap })
    }

    /// Wrap `source`, rescaling it to `size` when its dimensions differ.
    #[must_use]
    pub fn fitted(source: Pixmap, size: ImageSize) -> Option<Self> {
        if source.width() == size.width && source.height() == size.height {
            return Some(Self { pixmap: source });
        }
        let mut layer = Self::new(size)?;
        layer.replace_with(&source);
        Some(layer)
    }

    #[must_use]
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.pixmap.width(), self.pixmap.height())
    }

    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Raw pixels. Changes made through this on a stored layer must be
    /// reported with [`LayerStore::mark_damaged`] or they are not displayed.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Erase every pixel.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Overwrite this layer's pixels with `source`, scaled to fit.
    ///
    /// Always a plain copy: whatever tool was last used on this layer has no
    /// bearing on how a snapshot lands.
    pub fn replace_with(&mut self, source: &Pixmap) {
        if source.width() == self.pixmap.width() && source.height() == self.pixmap.height() {
            self.pixmap.data_mut().copy_from_slice(source.data());
            return;
        }
        self.clear();
        #[allow(clippy::cast_precision_loss)]
        let transform = Transform::from_scale(
            self.pixmap.width() as f32 / source.width() as f32,
            self.pixmap.height() as f32 / source.height() as f32,
        );
        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };
        self.pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
    }

    /// Pixel at `(x, y)`; `None` outside the layer.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }

    /// Whether no pixel carries any coverage.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }

    /// Straight-alpha RGBA bytes of `rect`, row by row, into `out`.
    ///
    /// `rect` is clipped to the layer; `out` is cleared first.
    pub fn straight_rgba(&self, rect: PixelRect, out: &mut Vec<u8>) {
        out.clear();
        let width = self.pixmap.width();
        let x0 = rect.x.min(width);
        let x1 = (rect.x + rect.width).min(width);
        let y1 = (rect.y + rect.height).min(self.pixmap.height());
        let pixels = self.pixmap.pixels();
        for y in rect.y..y1 {
            let row = (y * width) as usize;
            for pixel in &pixels[row + x0 as usize..row + x1 as usize] {
                let c = pixel.demultiply();
                out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
            }
        }
    }
}

/// In-memory mapping from participant id to layer.
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    /// Native size of the reference image; `None` until one is loaded.
    size: Option<ImageSize>,
    layers: BTreeMap<ParticipantId, Layer>,
    /// Changes since the last [`LayerStore::take_damage`].
    damage: BTreeMap<ParticipantId, Damage>,
}

impl LayerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimensions every layer is held at.
    #[must_use]
    pub fn size(&self) -> Option<ImageSize> {
        self.size
    }

    /// Adopt new reference dimensions.
    ///
    /// A change of dimensions is a full reset: every layer is dropped because
    /// its backing surface no longer matches. Returns whether a reset happened.
    pub fn set_size(&mut self, size: Option<ImageSize>) -> bool {
        let size = size.filter(|s| !s.is_empty());
        if size == self.size {
            return false;
        }
        self.size = size;
        self.layers.clear();
        self.damage.clear();
        true
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// The layer for `id`, allocating a blank one on first use.
    ///
    /// `None` while no reference image is loaded.
    pub fn get_or_create(&mut self, id: &str) -> Option<&mut Layer> {
        let size = self.size?;
        if !self.layers.contains_key(id) {
            let layer = Layer::new(size)?;
            self.layers.insert(id.to_owned(), layer);
            self.damage.insert(id.to_owned(), Damage::Full);
        }
        self.layers.get_mut(id)
    }

    /// Install `layer` for `id`, replacing any existing entry.
    ///
    /// Returns `false` (and stores nothing) when the layer's dimensions do not
    /// match the store's.
    pub fn set(&mut self, id: &str, layer: Layer) -> bool {
        if self.size != Some(layer.size()) {
            log::warn!("layer for {id} is {:?}, store is {:?}; dropped", layer.size(), self.size);
            return false;
        }
        self.layers.insert(id.to_owned(), layer);
        self.damage.insert(id.to_owned(), Damage::Full);
        true
    }

    /// Delete the layer for `id`.
    pub fn remove(&mut self, id: &str) -> Option<Layer> {
        self.damage.remove(id);
        self.layers.remove(id)
    }

    /// Drop every layer, keeping the dimensions.
    pub fn clear_all(&mut self) {
        self.layers.clear();
        self.damage.clear();
    }

    /// Record that `rect` of `id`'s layer changed. Ignored for unknown ids.
    pub fn mark_damaged(&mut self, id: &str, rect: PixelRect) {
        if !self.layers.contains_key(id) {
            return;
        }
        let damage = Damage::Region(rect);
        self.damage
            .entry(id.to_owned())
            .and_modify(|d| *d = d.merge(damage))
            .or_insert(damage);
    }

    /// Record that all of `id`'s layer changed. Ignored for unknown ids.
    pub fn mark_full(&mut self, id: &str) {
        if self.layers.contains_key(id) {
            self.damage.insert(id.to_owned(), Damage::Full);
        }
    }

    /// Hand over every pending change, in ascending participant-id order.
    pub fn take_damage(&mut self) -> Vec<(ParticipantId, Damage)> {
        std::mem::take(&mut self.damage).into_iter().collect()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in ascending participant-id order.
    pub fn sorted(&self) -> impl Iterator<Item = (&str, &Layer)> {
        self.layers.iter().map(|(id, layer)| (id.as_str(), layer))
    }

    /// Participant ids in the order the compositor paints them.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&str> {
        self.layers.keys().map(String::as_str).collect()
    }
}
