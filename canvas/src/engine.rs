//! Drawing engine: ties viewport, layers, strokes and sync into one state
//! machine the browser host drives.
//!
//! DESIGN
//! ======
//! [`EngineCore`] holds every piece of state the overlay needs and has no
//! browser dependencies, so all of its behaviour is unit-testable. Each
//! input handler mutates the core and returns a list of [`Action`]s; the
//! host executes them (repaint, apply CSS, write to the store, ask for
//! confirmation) and feeds results back through the data-input methods.
//! The core never awaits anything.
//!
//! [`Engine`] pairs the core with a [`DisplaySurface`] and owns the render
//! step.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use records::DocChange;

use crate::codec::encode_layer;
use crate::compositor::{self, DisplaySurface, Frame, SurfaceGeometry};
use crate::identity::{Participant, Role};
use crate::input::{Button, CURSOR_DRAW, CURSOR_GRAB, CURSOR_GRABBING, Gesture};
use crate::layer::{LayerStore, ParticipantId};
use crate::stroke::{Brush, StrokeEngine, Tool};
use crate::sync::merge_remote_changes;
use crate::viewport::{ImageSize, Point, Size, Viewport, ViewportState, wheel_factor};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Upload changed layer regions and composite.
    RenderNeeded,
    /// Re-apply the viewport's CSS transforms to the image and surface.
    TransformChanged,
    /// Save the viewport state to browser storage.
    PersistViewport,
    /// Encode and write this participant's layer.
    PersistLayer { participant: ParticipantId },
    /// Write an already encoded snapshot of this participant's layer. Used
    /// when the layer itself is gone by the time the host runs the action.
    PersistSnapshot { participant: ParticipantId, image_data: String },
    /// Delete this participant's drawing document.
    DeleteLayer { participant: ParticipantId },
    /// Ask the user to confirm clearing every participant's drawing.
    ConfirmClearAll,
    /// Re-open the remote layer subscription so its initial snapshot
    /// repopulates the store.
    ResubscribeLayers,
    SetCursor(&'static str),
}

/// The picture the viewport and layers are anchored to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub url: String,
    /// Native pixel size; `None` until the image has loaded.
    pub natural: Option<ImageSize>,
}

/// Engine state and logic that does not depend on the browser.
#[derive(Debug, Clone)]
pub struct EngineCore {
    pub viewport: Viewport,
    pub layers: LayerStore,
    stroke: StrokeEngine,
    brush: Brush,
    /// Drawing mode: `Some` while a tool is selected.
    tool: Option<Tool>,
    gesture: Gesture,
    participant: Option<Participant>,
    role: Role,
    reference: Option<ReferenceImage>,
    container: Size,
    dpr: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(),
            layers: LayerStore::new(),
            stroke: StrokeEngine::new(),
            brush: Brush::default(),
            tool: None,
            gesture: Gesture::Idle,
            participant: None,
            role: Role::Player,
            reference: None,
            container: Size::default(),
            dpr: 1.0,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Data inputs ---

    /// Start from a persisted viewport.
    pub fn restore_viewport(&mut self, state: ViewportState) {
        self.viewport = Viewport::restore(state);
    }

    /// Adopt persisted brush settings.
    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    /// Set (or clear) the signed-in participant.
    ///
    /// A stroke in progress for the previous participant is finalised first.
    pub fn set_participant(&mut self, participant: Option<Participant>) -> Vec<Action> {
        if participant.as_ref().map(|p| &p.id) == self.participant.as_ref().map(|p| &p.id) {
            self.participant = participant;
            return Vec::new();
        }
        let actions = self.finish_stroke();
        self.participant = participant;
        actions
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Record the display area's CSS size and fit a pending image.
    pub fn set_container(&mut self, container: Size) -> Vec<Action> {
        self.container = container;
        self.fit_if_needed()
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) -> Vec<Action> {
        if !dpr.is_finite() || dpr <= 0.0 || (dpr - self.dpr).abs() < f64::EPSILON {
            return Vec::new();
        }
        self.dpr = dpr;
        vec![Action::RenderNeeded]
    }

    /// The session's display image URL changed.
    ///
    /// Any new URL (or none) resets every layer and the fit marker. Layers
    /// come back once [`Self::on_reference_loaded`] reports the image size.
    pub fn set_reference_url(&mut self, url: Option<&str>) -> Vec<Action> {
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        if self.reference.as_ref().map(|r| r.url.as_str()) == url {
            return Vec::new();
        }
        log::debug!("engine: reference image -> {url:?}");
        let mut actions = self.finish_stroke_before_reset();
        self.layers.set_size(None);
        self.viewport.invalidate_fit();
        self.reference = url.map(|url| ReferenceImage { url: url.to_owned(), natural: None });
        actions.push(Action::RenderNeeded);
        actions
    }

    /// The reference image at `url` finished loading with size `natural`.
    ///
    /// Performs the full reset: layers are reallocated at the new size, the
    /// view is fitted, and the host is asked to resubscribe so remote layers
    /// are reloaded. Loads for a URL that is no longer current are ignored.
    pub fn on_reference_loaded(&mut self, url: &str, natural: ImageSize) -> Vec<Action> {
        let Some(reference) = self.reference.as_mut() else {
            return Vec::new();
        };
        if reference.url != url.trim() {
            log::debug!("engine: stale image load for {url}");
            return Vec::new();
        }
        if natural.is_empty() {
            log::warn!("engine: reference image {url} has no size");
            return Vec::new();
        }
        if reference.natural == Some(natural) {
            return Vec::new();
        }
        reference.natural = Some(natural);
        let mut actions = self.finish_stroke_before_reset();
        self.layers.set_size(None);
        self.layers.set_size(Some(natural));
        actions.extend([Action::ResubscribeLayers, Action::RenderNeeded]);
        actions.extend(self.fit_if_needed());
        actions
    }

    /// Fit the view to the loaded reference image, once per URL.
    pub fn fit_if_needed(&mut self) -> Vec<Action> {
        let Some(ReferenceImage { url, natural: Some(natural) }) = &self.reference else {
            return Vec::new();
        };
        if !self.viewport.fit_to_container(url, self.container, *natural) {
            return Vec::new();
        }
        log::debug!("engine: fitted {url} at zoom {}", self.viewport.zoom());
        vec![Action::TransformChanged, Action::RenderNeeded, Action::PersistViewport]
    }

    /// Fold a remote change batch into the layer store.
    pub fn apply_remote_changes(&mut self, changes: &[DocChange]) -> Vec<Action> {
        if merge_remote_changes(&mut self.layers, changes) {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    // --- Tools ---

    /// Select `tool`. Selecting the active tool again turns drawing off,
    /// finalising any stroke in progress.
    pub fn select_tool(&mut self, tool: Tool) -> Vec<Action> {
        let mut actions = self.finish_pan();
        if self.tool == Some(tool) {
            actions.extend(self.finish_stroke());
            self.tool = None;
        } else {
            self.tool = Some(tool);
        }
        actions.push(Action::SetCursor(self.cursor()));
        actions
    }

    /// Turn drawing mode off.
    pub fn disable_drawing(&mut self) -> Vec<Action> {
        match self.tool {
            Some(tool) => self.select_tool(tool),
            None => Vec::new(),
        }
    }

    /// Set the ink colour from a CSS hex string. Invalid input is ignored.
    pub fn set_color(&mut self, raw: &str) -> bool {
        self.brush.set_color(raw)
    }

    /// Set the ink width from a form value.
    pub fn set_width(&mut self, raw: &str) {
        self.brush.set_width_str(raw);
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        match self.tool {
            Some(tool) => {
                let Some(participant) = &self.participant else {
                    return Vec::new();
                };
                self.stroke
                    .pointer_down(&self.viewport, &mut self.layers, &participant.id, screen, tool, self.brush);
                Vec::new()
            }
            None => {
                self.gesture = Gesture::Panning { last_screen: screen };
                vec![Action::SetCursor(CURSOR_GRABBING)]
            }
        }
    }

    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<Action> {
        if self.stroke.is_drawing() {
            let Some(participant) = &self.participant else {
                return Vec::new();
            };
            if self.stroke.pointer_move(&self.viewport, &mut self.layers, &participant.id, screen) {
                return vec![Action::RenderNeeded];
            }
            return Vec::new();
        }
        match self.gesture.pan_to(screen) {
            Some((dx, dy)) => {
                self.viewport.pan_by(dx, dy);
                vec![Action::TransformChanged]
            }
            None => Vec::new(),
        }
    }

    /// Pointer released (on the surface or anywhere in the document).
    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        let mut actions = self.finish_stroke();
        actions.extend(self.finish_pan());
        actions
    }

    /// The browser cancelled the pointer; ends the gesture like a release.
    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        self.on_pointer_up()
    }

    /// The window lost focus mid-gesture.
    pub fn on_blur(&mut self) -> Vec<Action> {
        self.on_pointer_up()
    }

    /// Zoom around `screen`. Ignored while drawing mode is on.
    pub fn on_wheel(&mut self, screen: Point, delta_y: f64) -> Vec<Action> {
        if self.tool.is_some() || self.stroke.is_drawing() {
            return Vec::new();
        }
        if !self.viewport.zoom_at(screen, wheel_factor(delta_y)) {
            return Vec::new();
        }
        vec![Action::TransformChanged, Action::RenderNeeded, Action::PersistViewport]
    }

    // --- Clearing ---

    /// Drop the local participant's layer and delete its document.
    pub fn clear_mine(&mut self) -> Vec<Action> {
        let Some(participant) = &self.participant else {
            return Vec::new();
        };
        self.stroke.finish();
        self.layers.remove(&participant.id);
        vec![Action::RenderNeeded, Action::DeleteLayer { participant: participant.id.clone() }]
    }

    /// Ask for confirmation before clearing everyone's drawings (GM only).
    pub fn request_clear_all(&mut self) -> Vec<Action> {
        if self.role.is_gm() { vec![Action::ConfirmClearAll] } else { Vec::new() }
    }

    /// Empty the local store after the remote batch delete, keeping an
    /// empty layer for the local participant to draw on.
    pub fn clear_all_local(&mut self) -> Vec<Action> {
        if !self.role.is_gm() {
            return Vec::new();
        }
        self.stroke.finish();
        self.layers.clear_all();
        if let Some(participant) = &self.participant {
            self.layers.get_or_create(&participant.id);
        }
        vec![Action::RenderNeeded]
    }

    // --- Internal ---

    fn finish_stroke(&mut self) -> Vec<Action> {
        if !self.stroke.finish() {
            return Vec::new();
        }
        let mut actions = vec![Action::RenderNeeded];
        if let Some(participant) = &self.participant {
            actions.push(Action::PersistLayer { participant: participant.id.clone() });
        }
        actions
    }

    /// End a stroke whose layer is about to be dropped. The layer is
    /// encoded now, while it still exists, so the stroke is not lost.
    fn finish_stroke_before_reset(&mut self) -> Vec<Action> {
        if !self.stroke.finish() {
            return Vec::new();
        }
        let Some(participant) = &self.participant else {
            return Vec::new();
        };
        let Some(layer) = self.layers.get(&participant.id) else {
            return Vec::new();
        };
        match encode_layer(layer) {
            Ok(image_data) => vec![Action::PersistSnapshot { participant: participant.id.clone(), image_data }],
            Err(err) => {
                log::warn!("engine: cannot snapshot layer of {} before reset: {err}", participant.id);
                Vec::new()
            }
        }
    }

    fn finish_pan(&mut self) -> Vec<Action> {
        if !self.gesture.is_panning() {
            return Vec::new();
        }
        self.gesture = Gesture::Idle;
        vec![Action::PersistViewport, Action::SetCursor(self.cursor())]
    }

    // --- Queries ---

    /// Drawing-surface geometry for the current view; `None` until the
    /// reference image size is known.
    #[must_use]
    pub fn surface_geometry(&self) -> Option<SurfaceGeometry> {
        compositor::surface_geometry(self.layers.size()?, self.viewport.zoom(), self.dpr)
    }

    /// Composite every layer for the current view in software.
    #[must_use]
    pub fn repaint(&self) -> Option<Frame> {
        compositor::repaint(&self.layers, &self.viewport, self.dpr)
    }

    /// Cursor the display area should show.
    #[must_use]
    pub fn cursor(&self) -> &'static str {
        if self.gesture.is_panning() {
            CURSOR_GRABBING
        } else if self.tool.is_some() {
            CURSOR_DRAW
        } else {
            CURSOR_GRAB
        }
    }

    #[must_use]
    pub fn tool(&self) -> Option<Tool> {
        self.tool
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.stroke.is_drawing()
    }

    #[must_use]
    pub fn brush(&self) -> Brush {
        self.brush
    }

    #[must_use]
    pub fn participant(&self) -> Option<&Participant> {
        self.participant.as_ref()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn reference(&self) -> Option<&ReferenceImage> {
        self.reference.as_ref()
    }
}

/// The full engine: [`EngineCore`] plus the surface its layers are shown on.
pub struct Engine<D> {
    pub core: EngineCore,
    display: D,
}

impl<D: DisplaySurface> Engine<D> {
    #[must_use]
    pub fn new(display: D) -> Self {
        Self { core: EngineCore::new(), display }
    }

    #[must_use]
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Mirror changed layer regions to the display, then composite.
    ///
    /// Only damaged regions are uploaded, so a pointer move costs one
    /// segment's pixels plus one blit per layer. With no image loaded the
    /// surface is blanked.
    ///
    /// # Errors
    ///
    /// Returns the surface's error if an upload or the composite fails.
    /// Layers whose upload did not happen are re-marked fully damaged.
    pub fn render(&mut self) -> Result<(), D::Error> {
        let Some(geometry) = self.core.surface_geometry() else {
            return self.display.clear();
        };
        let pending = self.core.layers.take_damage();
        for (index, (participant, damage)) in pending.iter().enumerate() {
            let Some(layer) = self.core.layers.get(participant) else {
                continue;
            };
            if let Err(err) = self.display.upload_layer(participant, layer, *damage) {
                for (missed, _) in &pending[index..] {
                    self.core.layers.mark_full(missed);
                }
                return Err(err);
            }
        }
        let order = self.core.layers.paint_order();
        self.display.composite(&order, &geometry)
    }
}
