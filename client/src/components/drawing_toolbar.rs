//! Drawing controls: tools, brush settings and clearing.

use std::rc::Rc;

use canvas::consts::{MAX_INK_WIDTH, MIN_INK_WIDTH};
use canvas::engine::EngineCore;
use canvas::stroke::Tool;
use leptos::prelude::*;

use crate::components::overlay_host::OverlayHost;

/// Toolbar above the display area.
#[component]
pub fn DrawingToolbar(host: Rc<OverlayHost>) -> impl IntoView {
    let overlay = host.overlay();

    let on_pen = {
        let host = Rc::clone(&host);
        move |_| host.command(|core| core.select_tool(Tool::Ink))
    };
    let on_eraser = {
        let host = Rc::clone(&host);
        move |_| host.command(|core| core.select_tool(Tool::Erase))
    };
    let on_color = {
        let host = Rc::clone(&host);
        move |ev: leptos::ev::Event| host.set_color(event_target_value(&ev))
    };
    let on_width = {
        let host = Rc::clone(&host);
        move |ev: leptos::ev::Event| host.set_width(event_target_value(&ev))
    };
    let on_clear_mine = {
        let host = Rc::clone(&host);
        move |_| host.command(EngineCore::clear_mine)
    };
    let on_clear_all = {
        let host = Rc::clone(&host);
        move |_| host.command(EngineCore::request_clear_all)
    };

    view! {
        <div class="drawing-toolbar">
            <button
                class="btn drawing-toolbar__tool"
                class:drawing-toolbar__tool--active=move || overlay.get().is_active(Tool::Ink)
                disabled=move || !overlay.get().can_draw()
                title="Pen (click again to stop drawing)"
                on:click=on_pen
            >
                "Pen"
            </button>
            <button
                class="btn drawing-toolbar__tool"
                class:drawing-toolbar__tool--active=move || overlay.get().is_active(Tool::Erase)
                disabled=move || !overlay.get().can_draw()
                title="Eraser (click again to stop drawing)"
                on:click=on_eraser
            >
                "Eraser"
            </button>
            <input
                type="color"
                class="drawing-toolbar__color"
                title="Ink colour"
                prop:value=move || overlay.get().color
                on:input=on_color
            />
            <input
                type="range"
                class="drawing-toolbar__width"
                title="Brush width"
                min=MIN_INK_WIDTH.to_string()
                max=MAX_INK_WIDTH.to_string()
                step="1"
                prop:value=move || overlay.get().width.to_string()
                on:input=on_width
            />
            <span class="drawing-toolbar__width-label">{move || overlay.get().width_label()}</span>
            <span class="drawing-toolbar__spacer"></span>
            <button
                class="btn drawing-toolbar__clear"
                disabled=move || !overlay.get().signed_in
                on:click=on_clear_mine
            >
                "Clear mine"
            </button>
            <button
                class="btn drawing-toolbar__clear drawing-toolbar__clear--all"
                style:display=move || if overlay.get().is_gm { "inline-block" } else { "none" }
                on:click=on_clear_all
            >
                "Clear all"
            </button>
            <span class="drawing-toolbar__status">{move || overlay.get().status()}</span>
        </div>
    }
}
