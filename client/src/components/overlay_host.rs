//! Bridge between the Leptos views and the imperative drawing engine.
//!
//! ARCHITECTURE
//! ============
//! `OverlayHost` owns the [`Engine`] (core plus `<canvas>` display) and the
//! [`SyncBridge`]. Views and DOM listeners call [`OverlayHost::command`] with
//! an engine operation; the host runs it, mirrors the result into the
//! [`OverlayState`] signal, then executes the returned [`Action`]s.
//!
//! ERROR HANDLING
//! ==============
//! Store writes are fire-and-forget: failures are logged at `warn` and never
//! retried. Callbacks that arrive while the engine or bridge is already
//! borrowed (a store delivering synchronously from inside a call) are
//! re-queued on the event loop instead of re-entering.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use canvas::engine::{Action, Engine, EngineCore};
use canvas::identity::Identity;
use canvas::input::Button;
use canvas::render::{CanvasDisplay, apply_viewport};
use canvas::sync::SyncBridge;
use canvas::viewport::{ImageSize, Point, Size};
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{HtmlCanvasElement, MediaQueryList};

use crate::net::js_host::HostConnection;
use crate::state::overlay::OverlayState;
use crate::util::display::{pixel_ratio_query, shows_current_image};
use crate::util::session::{ROLE_KEY, SESSION_KEY, current_role, current_session_id};
use crate::util::settings::{load_brush, load_viewport, save_brush, save_viewport};

/// Confirmation prompt shown before a GM clears every drawing.
pub const CLEAR_ALL_PROMPT: &str = "Clear ALL drawings for everyone?";

type EngineCommand = Box<dyn FnOnce(&mut EngineCore) -> Vec<Action>>;
type EventCallback = Closure<dyn FnMut(web_sys::Event)>;

/// Shared owner of the engine, the sync bridge and the overlay's DOM refs.
pub struct OverlayHost {
    engine: RefCell<Option<Engine<CanvasDisplay>>>,
    bridge: RefCell<SyncBridge>,
    identity: Box<dyn Identity>,
    overlay: RwSignal<OverlayState>,
    container_ref: NodeRef<html::Div>,
    image_ref: NodeRef<html::Img>,
    canvas_ref: NodeRef<html::Canvas>,
    raf_pending: Cell<bool>,
    raf_callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    /// Query matching the current device pixel ratio, and its listener.
    pixel_ratio_watch: RefCell<Option<(MediaQueryList, EventCallback)>>,
}

impl OverlayHost {
    pub fn new(connection: HostConnection) -> Rc<Self> {
        let overlay = OverlayState { shared: connection.shared, ..OverlayState::default() };
        Rc::new(Self {
            engine: RefCell::new(None),
            bridge: RefCell::new(SyncBridge::new(connection.store)),
            identity: connection.identity,
            overlay: RwSignal::new(overlay),
            container_ref: NodeRef::new(),
            image_ref: NodeRef::new(),
            canvas_ref: NodeRef::new(),
            raf_pending: Cell::new(false),
            raf_callback: RefCell::new(None),
            pixel_ratio_watch: RefCell::new(None),
        })
    }

    pub fn overlay(&self) -> RwSignal<OverlayState> {
        self.overlay
    }

    pub fn container_ref(&self) -> NodeRef<html::Div> {
        self.container_ref
    }

    pub fn image_ref(&self) -> NodeRef<html::Img> {
        self.image_ref
    }

    pub fn canvas_ref(&self) -> NodeRef<html::Canvas> {
        self.canvas_ref
    }

    // --- Lifecycle ---

    /// Create the engine on `canvas`, restore persisted settings and join the
    /// active session. Later calls are ignored.
    pub fn mount(self: &Rc<Self>, canvas: HtmlCanvasElement) {
        if self.engine.borrow().is_some() {
            return;
        }
        let display = match CanvasDisplay::new(canvas) {
            Ok(display) => display,
            Err(err) => {
                log::error!("overlay: drawing canvas unavailable: {err:?}");
                return;
            }
        };
        let mut engine = Engine::new(display);
        engine.core.restore_viewport(load_viewport());
        engine.core.set_brush(load_brush());
        engine.core.set_role(current_role());
        let mut actions = engine.core.set_participant(self.identity.current_participant());
        actions.extend(engine.core.set_device_pixel_ratio(device_pixel_ratio()));
        let pending_url = self.overlay.get_untracked().display_url;
        actions.extend(engine.core.set_reference_url(pending_url.as_deref()));
        actions.push(Action::TransformChanged);
        *self.engine.borrow_mut() = Some(engine);

        self.execute(actions);
        self.sync_container();
        self.report_image();
        self.install_window_listeners();
        self.watch_pixel_ratio();
        self.join_session();
        log::debug!("overlay: mounted");
    }

    /// Point the bridge at the session named in local storage and follow
    /// its display image.
    pub fn join_session(self: &Rc<Self>) {
        let session = current_session_id();
        let host = Rc::clone(self);
        self.with_bridge(move |bridge| {
            if !bridge.set_session(session.as_deref()) {
                return;
            }
            host.show_image(None);
            if session.is_none() {
                log::debug!("overlay: no active session");
                return;
            }
            let weak = Rc::downgrade(&host);
            let listener = Box::new(move |url: Option<String>| {
                if let Some(host) = weak.upgrade() {
                    host.show_image(url);
                }
            });
            if let Err(err) = bridge.watch_display_image(listener) {
                log::warn!("overlay: cannot watch display image: {err}");
            }
        });
    }

    fn show_image(self: &Rc<Self>, url: Option<String>) {
        self.overlay.update(|state| state.display_url.clone_from(&url));
        // A busy bridge is mid session switch, which already unsubscribed.
        if url.is_none()
            && let Ok(mut bridge) = self.bridge.try_borrow_mut()
        {
            bridge.unsubscribe();
        }
        self.command(move |core| core.set_reference_url(url.as_deref()));
        self.report_image();
    }

    /// The `<img>` finished loading; report its natural size.
    pub fn image_loaded(self: &Rc<Self>) {
        self.report_image();
    }

    /// Report the image size if it is loaded, and only when the element
    /// shows the current URL. A load event from the previous image can land
    /// after the URL changed.
    fn report_image(self: &Rc<Self>) {
        let Some(image) = self.image_ref.get_untracked() else {
            return;
        };
        if !image.complete() || image.natural_width() == 0 || image.natural_height() == 0 {
            return;
        }
        let Some(url) = self.overlay.get_untracked().display_url else {
            return;
        };
        if !shows_current_image(&image.current_src(), &url, resolve_url(&url).as_deref()) {
            log::debug!("overlay: image element still shows {}", image.current_src());
            return;
        }
        let natural = ImageSize::new(image.natural_width(), image.natural_height());
        self.command(move |core| core.on_reference_loaded(&url, natural));
    }

    /// Re-read the display area's size and the device pixel ratio.
    pub fn sync_container(self: &Rc<Self>) {
        let Some(container) = self.container_ref.get_untracked() else {
            return;
        };
        let rect = container.get_bounding_client_rect();
        let size = Size::new(rect.width(), rect.height());
        let dpr = device_pixel_ratio();
        self.command(move |core| {
            let mut actions = core.set_device_pixel_ratio(dpr);
            actions.extend(core.set_container(size));
            actions
        });
    }

    /// Pick up a sign-in or sign-out that happened since the last check.
    pub fn refresh_participant(self: &Rc<Self>) {
        let participant = self.identity.current_participant();
        self.command(move |core| core.set_participant(participant));
    }

    // --- Input ---

    pub fn pointer_down(self: &Rc<Self>, ev: &web_sys::PointerEvent) {
        self.refresh_participant();
        let screen = self.local_point(ev.client_x(), ev.client_y());
        let button = Button::from_dom(ev.button());
        self.command(move |core| core.on_pointer_down(screen, button));
    }

    pub fn pointer_move(self: &Rc<Self>, ev: &web_sys::PointerEvent) {
        let screen = self.local_point(ev.client_x(), ev.client_y());
        self.command(move |core| core.on_pointer_move(screen));
    }

    /// Returns whether the wheel event was consumed as a zoom.
    pub fn wheel(self: &Rc<Self>, ev: &web_sys::WheelEvent) -> bool {
        let screen = self.local_point(ev.client_x(), ev.client_y());
        let delta_y = ev.delta_y();
        let Ok(mut slot) = self.engine.try_borrow_mut() else {
            return false;
        };
        let Some(engine) = slot.as_mut() else {
            return false;
        };
        let actions = engine.core.on_wheel(screen, delta_y);
        drop(slot);
        let consumed = !actions.is_empty();
        self.execute(actions);
        consumed
    }

    pub fn set_color(self: &Rc<Self>, raw: String) {
        self.command(move |core| {
            if !core.set_color(&raw) {
                log::debug!("overlay: ignoring colour {raw:?}");
            }
            Vec::new()
        });
        self.persist_brush();
    }

    pub fn set_width(self: &Rc<Self>, raw: String) {
        self.command(move |core| {
            core.set_width(&raw);
            Vec::new()
        });
        self.persist_brush();
    }

    fn persist_brush(&self) {
        if let Some(engine) = self.engine.borrow().as_ref() {
            save_brush(&engine.core.brush());
        }
    }

    fn local_point(&self, client_x: i32, client_y: i32) -> Point {
        let (left, top) = self
            .container_ref
            .get_untracked()
            .map(|container| {
                let rect = container.get_bounding_client_rect();
                (rect.left(), rect.top())
            })
            .unwrap_or_default();
        Point::new(f64::from(client_x) - left, f64::from(client_y) - top)
    }

    // --- Command execution ---

    /// Run `op` against the engine core and execute what it asks for.
    ///
    /// Re-queued on the event loop when the engine is already borrowed.
    pub fn command<F>(self: &Rc<Self>, op: F)
    where
        F: FnOnce(&mut EngineCore) -> Vec<Action> + 'static,
    {
        self.run_command(Box::new(op));
    }

    fn run_command(self: &Rc<Self>, op: EngineCommand) {
        let Ok(mut slot) = self.engine.try_borrow_mut() else {
            let host = Rc::clone(self);
            spawn_local(async move { host.run_command(op) });
            return;
        };
        let Some(engine) = slot.as_mut() else {
            return;
        };
        let actions = op(&mut engine.core);
        let mut next = self.overlay.get_untracked();
        next.sync_from(&engine.core);
        drop(slot);
        if next != self.overlay.get_untracked() {
            self.overlay.set(next);
        }
        self.execute(actions);
    }

    fn execute(self: &Rc<Self>, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::RenderNeeded => self.request_render(),
                Action::TransformChanged => self.apply_transform(),
                Action::PersistViewport => {
                    if let Some(engine) = self.engine.borrow().as_ref() {
                        save_viewport(engine.core.viewport.state());
                    }
                }
                Action::PersistLayer { participant } => self.persist_layer(participant),
                Action::PersistSnapshot { participant, image_data } => {
                    let Ok(bridge) = self.bridge.try_borrow() else {
                        log::warn!("overlay: bridge busy, last stroke of {participant} not saved");
                        continue;
                    };
                    let pending = bridge.persist_snapshot(&participant, image_data);
                    drop(bridge);
                    spawn_local(async move {
                        if let Err(err) = pending.await {
                            log::warn!("overlay: saving last stroke of {participant} failed: {err}");
                        }
                    });
                }
                Action::DeleteLayer { participant } => {
                    let Ok(bridge) = self.bridge.try_borrow() else {
                        log::warn!("overlay: bridge busy, layer of {participant} not deleted");
                        continue;
                    };
                    let pending = bridge.delete_layer(&participant);
                    drop(bridge);
                    spawn_local(async move {
                        if let Err(err) = pending.await {
                            log::warn!("overlay: deleting layer of {participant} failed: {err}");
                        }
                    });
                }
                Action::ConfirmClearAll => self.confirm_clear_all(),
                Action::ResubscribeLayers => self.subscribe_layers(),
                Action::SetCursor(cursor) => self.overlay.update(|state| state.cursor = cursor),
            }
        }
    }

    fn persist_layer(&self, participant: String) {
        let pending = {
            let slot = self.engine.borrow();
            let Some(engine) = slot.as_ref() else {
                return;
            };
            let Ok(bridge) = self.bridge.try_borrow() else {
                log::warn!("overlay: bridge busy, layer of {participant} not saved");
                return;
            };
            bridge.persist_local_layer(&engine.core.layers, &participant)
        };
        spawn_local(async move {
            if let Err(err) = pending.await {
                log::warn!("overlay: saving layer of {participant} failed: {err}");
            }
        });
    }

    fn confirm_clear_all(self: &Rc<Self>) {
        let confirmed = web_sys::window()
            .and_then(|window| window.confirm_with_message(CLEAR_ALL_PROMPT).ok())
            .unwrap_or(false);
        if !confirmed {
            return;
        }
        let Ok(bridge) = self.bridge.try_borrow() else {
            log::warn!("overlay: bridge busy, clear all skipped");
            return;
        };
        let pending = bridge.clear_all();
        drop(bridge);
        let host = Rc::clone(self);
        spawn_local(async move {
            match pending.await {
                Ok(count) => {
                    log::debug!("overlay: cleared {count} drawings");
                    host.command(EngineCore::clear_all_local);
                }
                Err(err) => log::warn!("overlay: clear all failed: {err}"),
            }
        });
    }

    fn subscribe_layers(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.with_bridge(move |bridge| {
            let listener = Box::new(move |changes: Vec<records::DocChange>| {
                if let Some(host) = weak.upgrade() {
                    host.command(move |core| core.apply_remote_changes(&changes));
                }
            });
            if let Err(err) = bridge.subscribe_remote_layers(listener) {
                log::warn!("overlay: cannot subscribe to drawings: {err}");
            }
        });
    }

    /// Run `op` on the bridge now, or on the next turn if it is busy.
    fn with_bridge<F>(self: &Rc<Self>, op: F)
    where
        F: FnOnce(&mut SyncBridge) + 'static,
    {
        match self.bridge.try_borrow_mut() {
            Ok(mut bridge) => op(&mut bridge),
            Err(_) => {
                let host = Rc::clone(self);
                spawn_local(async move { host.with_bridge(op) });
            }
        }
    }

    // --- Presentation ---

    fn apply_transform(&self) {
        let (Some(image), Some(canvas)) = (self.image_ref.get_untracked(), self.canvas_ref.get_untracked()) else {
            return;
        };
        if let Some(engine) = self.engine.borrow().as_ref()
            && let Err(err) = apply_viewport(&image, &canvas, &engine.core.viewport)
        {
            log::warn!("overlay: applying viewport failed: {err:?}");
        }
    }

    fn render_now(&self) {
        let Ok(mut slot) = self.engine.try_borrow_mut() else {
            return;
        };
        if let Some(engine) = slot.as_mut()
            && let Err(err) = engine.render()
        {
            log::warn!("overlay: render failed: {err:?}");
        }
    }

    /// Coalesce render requests into one animation frame.
    fn request_render(self: &Rc<Self>) {
        if self.raf_pending.replace(true) {
            return;
        }
        let Some(window) = web_sys::window() else {
            self.raf_pending.set(false);
            self.render_now();
            return;
        };
        let weak: Weak<Self> = Rc::downgrade(self);
        let callback = Closure::wrap(Box::new(move |_ts: f64| {
            if let Some(host) = weak.upgrade() {
                host.raf_pending.set(false);
                host.render_now();
            }
        }) as Box<dyn FnMut(f64)>);
        if window.request_animation_frame(callback.as_ref().unchecked_ref()).is_ok() {
            *self.raf_callback.borrow_mut() = Some(callback);
        } else {
            self.raf_pending.set(false);
            self.render_now();
        }
    }

    fn install_window_listeners(self: &Rc<Self>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        self.listen(&window, "blur", |host, _| host.command(EngineCore::on_blur));
        self.listen(&window, "resize", |host, _| host.sync_container());
        self.listen(&window, "focus", |host, _| host.refresh_participant());
        self.listen(&window, "storage", |host, ev| {
            let key = ev.dyn_ref::<web_sys::StorageEvent>().and_then(web_sys::StorageEvent::key);
            match key.as_deref() {
                Some(SESSION_KEY) => host.join_session(),
                Some(ROLE_KEY) => {
                    let role = current_role();
                    host.command(move |core| {
                        core.set_role(role);
                        Vec::new()
                    });
                }
                _ => {}
            }
        });
        if let Some(document) = window.document() {
            self.listen(&document, "mouseup", |host, _| host.command(EngineCore::on_pointer_up));
        }
    }

    /// Follow device-pixel-ratio changes that fire no `resize` (browser zoom
    /// on some platforms, moving between monitors). The query only matches
    /// the ratio it was built for, so it is re-armed after every change.
    fn watch_pixel_ratio(self: &Rc<Self>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let query = pixel_ratio_query(window.device_pixel_ratio());
        let list = match window.match_media(&query) {
            Ok(Some(list)) => list,
            Ok(None) => return,
            Err(err) => {
                log::warn!("overlay: cannot watch {query}: {err:?}");
                return;
            }
        };
        let weak = Rc::downgrade(self);
        let callback = EventCallback::new(move |_ev: web_sys::Event| {
            if let Some(host) = weak.upgrade() {
                host.sync_container();
                // Replaced outside this callback; it must not drop itself.
                spawn_local(async move { host.watch_pixel_ratio() });
            }
        });
        if let Err(err) = list.add_event_listener_with_callback("change", callback.as_ref().unchecked_ref()) {
            log::warn!("overlay: cannot listen for {query}: {err:?}");
            return;
        }
        let previous = self.pixel_ratio_watch.replace(Some((list, callback)));
        if let Some((list, callback)) = previous
            && let Err(err) = list.remove_event_listener_with_callback("change", callback.as_ref().unchecked_ref())
        {
            log::warn!("overlay: cannot stop watching pixel ratio: {err:?}");
        }
    }

    /// Attach a listener for the page's lifetime.
    fn listen<F>(self: &Rc<Self>, target: &web_sys::EventTarget, event: &str, handler: F)
    where
        F: Fn(&Rc<Self>, &web_sys::Event) + 'static,
    {
        let weak = Rc::downgrade(self);
        let callback = EventCallback::new(move |ev: web_sys::Event| {
            if let Some(host) = weak.upgrade() {
                handler(&host, &ev);
            }
        });
        if let Err(err) = target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()) {
            log::warn!("overlay: cannot listen for {event}: {err:?}");
            return;
        }
        callback.forget();
    }
}

/// `url` resolved against the page address.
fn resolve_url(url: &str) -> Option<String> {
    let base = web_sys::window()?.location().href().ok()?;
    match web_sys::Url::new_with_base(url.trim(), &base) {
        Ok(resolved) => Some(resolved.href()),
        Err(err) => {
            log::debug!("overlay: cannot resolve {url}: {err:?}");
            None
        }
    }
}

fn device_pixel_ratio() -> f64 {
    web_sys::window().map_or(1.0, |window| window.device_pixel_ratio())
}
