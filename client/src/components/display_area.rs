//! The Show & Tell display area: reference image with the drawing surface
//! stacked on top.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pointer and wheel input land on the container so panning works over the
//! whole panel; the canvas itself ignores pointer events.

use std::rc::Rc;

use leptos::prelude::*;

use crate::components::overlay_host::OverlayHost;

/// Container, reference `<img>` and drawing `<canvas>`.
#[component]
pub fn DisplayArea(host: Rc<OverlayHost>) -> impl IntoView {
    let overlay = host.overlay();
    let container_ref = host.container_ref();
    let image_ref = host.image_ref();
    let canvas_ref = host.canvas_ref();

    {
        let host = Rc::clone(&host);
        Effect::new(move || {
            if let Some(canvas) = canvas_ref.get() {
                host.mount(canvas);
            }
        });
    }

    let on_pointer_down = {
        let host = Rc::clone(&host);
        move |ev: leptos::ev::PointerEvent| {
            ev.prevent_default();
            if let Some(container) = container_ref.get_untracked()
                && let Err(err) = container.set_pointer_capture(ev.pointer_id())
            {
                log::debug!("display area: pointer capture refused: {err:?}");
            }
            host.pointer_down(&ev);
        }
    };

    let on_pointer_move = {
        let host = Rc::clone(&host);
        move |ev: leptos::ev::PointerEvent| host.pointer_move(&ev)
    };

    let on_pointer_up = {
        let host = Rc::clone(&host);
        move |_ev: leptos::ev::PointerEvent| host.command(canvas::engine::EngineCore::on_pointer_up)
    };

    let on_pointer_cancel = {
        let host = Rc::clone(&host);
        move |_ev: leptos::ev::PointerEvent| host.command(canvas::engine::EngineCore::on_pointer_cancel)
    };

    let on_wheel = {
        let host = Rc::clone(&host);
        move |ev: leptos::ev::WheelEvent| {
            if host.wheel(&ev) {
                ev.prevent_default();
            }
        }
    };

    let on_load = {
        let host = Rc::clone(&host);
        move |_ev: leptos::ev::Event| host.image_loaded()
    };

    view! {
        <div
            class="show-tell__display"
            node_ref=container_ref
            style="position: relative; overflow: hidden; width: 100%; height: 100%; touch-action: none;"
            style:cursor=move || overlay.get().cursor
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointercancel=on_pointer_cancel
            on:wheel=on_wheel
        >
            <img
                class="show-tell__image"
                node_ref=image_ref
                alt=""
                draggable="false"
                style="position: absolute; left: 0; top: 0; max-width: none; user-select: none;"
                style:display=move || if overlay.get().display_url.is_some() { "block" } else { "none" }
                src=move || overlay.get().display_url
                on:load=on_load
            />
            <canvas
                class="show-tell__drawing"
                node_ref=canvas_ref
                style="position: absolute; left: 0; top: 0; pointer-events: none;"
            ></canvas>
        </div>
    }
}
