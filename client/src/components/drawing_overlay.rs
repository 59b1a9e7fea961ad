//! Root of the collaborative drawing overlay.

use std::rc::Rc;

use leptos::prelude::*;

use crate::components::display_area::DisplayArea;
use crate::components::drawing_toolbar::DrawingToolbar;
use crate::components::overlay_host::OverlayHost;
use crate::net::js_host;

/// Toolbar plus display area, sharing one [`OverlayHost`].
#[component]
pub fn DrawingOverlay() -> impl IntoView {
    let host = OverlayHost::new(js_host::connect());

    view! {
        <section class="show-tell">
            <DrawingToolbar host=Rc::clone(&host) />
            <DisplayArea host=host />
        </section>
    }
}
