//! Browser entry point.

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use crate::components::drawing_overlay::DrawingOverlay;

/// Root view.
#[component]
pub fn App() -> impl IntoView {
    view! { <DrawingOverlay /> }
}

/// Install logging and the panic hook, then mount the overlay.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("logger already installed: {err}")));
    }
    log::debug!("drawing overlay starting");
    leptos::mount::mount_to_body(App);
}
