#![allow(clippy::float_cmp)]

use std::collections::BTreeMap;

use records::DocChange;
use serde_json::json;
use tiny_skia::{Paint, Pixmap, Rect, Transform};

use super::*;
use crate::codec::{decode_layer, encode_layer};
use crate::layer::{Damage, Layer, PixelRect};

const ME: &str = "m-local";
const URL: &str = "https://cdn.example/maps/keep.png";

// =============================================================
// Helpers
// =============================================================

fn participant(id: &str) -> Participant {
    Participant { id: id.to_owned(), email: format!("{id}@example.com") }
}

/// Engine with an 800x600 image loaded, zoom 1 and pan (0, 0).
fn loaded_core() -> EngineCore {
    let mut core = EngineCore::new();
    core.set_participant(Some(participant(ME)));
    core.set_reference_url(Some(URL));
    core.on_reference_loaded(URL, ImageSize::new(800, 600));
    core.restore_viewport(ViewportState::default());
    core
}

fn draw(core: &mut EngineCore, from: (f64, f64), to: (f64, f64)) -> Vec<Action> {
    let mut actions = core.on_pointer_down(Point::new(from.0, from.1), Button::Primary);
    actions.extend(core.on_pointer_move(Point::new(to.0, to.1)));
    actions.extend(core.on_pointer_up());
    actions
}

fn persists(actions: &[Action]) -> usize {
    actions.iter().filter(|a| matches!(a, Action::PersistLayer { .. })).count()
}

fn remote_snapshot(rgba: (u8, u8, u8, u8)) -> serde_json::Value {
    let mut layer = Layer::new(ImageSize::new(800, 600)).expect("layer");
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.0, rgba.1, rgba.2, rgba.3);
    let rect = Rect::from_xywh(90.0, 90.0, 80.0, 20.0).expect("rect");
    layer.pixmap_mut().fill_rect(rect, &paint, Transform::identity(), None);
    json!({ "imageData": encode_layer(&layer).expect("encode"), "updatedAt": 1 })
}

/// Surface that mirrors layers the way a browser surface does, copying only
/// the uploaded regions, and composites them in software.
#[derive(Default)]
struct MirrorSurface {
    mirrors: BTreeMap<String, Pixmap>,
    uploads: Vec<(String, Damage)>,
    shown: Option<Pixmap>,
    clears: usize,
}

impl DisplaySurface for MirrorSurface {
    type Error = String;

    fn upload_layer(&mut self, participant: &str, layer: &Layer, damage: Damage) -> Result<(), String> {
        self.uploads.push((participant.to_owned(), damage));
        let source = layer.pixmap();
        let rect = match (damage, self.mirrors.get(participant)) {
            (Damage::Region(rect), Some(_)) => rect,
            _ => PixelRect::full(layer.size()),
        };
        let mirror = self
            .mirrors
            .entry(participant.to_owned())
            .or_insert_with(|| Pixmap::new(source.width(), source.height()).expect("mirror"));
        let stride = source.width() as usize * 4;
        for y in rect.y..rect.y + rect.height {
            let start = y as usize * stride + rect.x as usize * 4;
            let end = start + rect.width as usize * 4;
            mirror.data_mut()[start..end].copy_from_slice(&source.data()[start..end]);
        }
        Ok(())
    }

    fn composite(&mut self, paint_order: &[&str], geometry: &SurfaceGeometry) -> Result<(), String> {
        self.mirrors.retain(|id, _| paint_order.contains(&id.as_str()));
        let mut target = Pixmap::new(geometry.backing.width, geometry.backing.height).ok_or("backing")?;
        let mirrors = &self.mirrors;
        compositor::paint_layers(&mut target, paint_order.iter().filter_map(|id| mirrors.get(*id)), geometry.scale);
        self.shown = Some(target);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), String> {
        self.mirrors.clear();
        self.shown = None;
        self.clears += 1;
        Ok(())
    }
}

fn region_uploads(surface: &MirrorSurface) -> usize {
    surface.uploads.iter().filter(|(_, d)| matches!(d, Damage::Region(_))).count()
}

// =============================================================
// Strokes
// =============================================================

#[test]
fn single_stroke_round_trip() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);

    let down = core.on_pointer_down(Point::new(100.0, 100.0), Button::Primary);
    let moved = core.on_pointer_move(Point::new(150.0, 100.0));
    let up = core.on_pointer_up();

    assert_eq!(persists(&down), 0);
    assert_eq!(persists(&moved), 0);
    assert_eq!(up.iter().filter(|a| **a == Action::PersistLayer { participant: ME.to_owned() }).count(), 1);

    let layer = core.layers.get(ME).expect("local layer");
    let on_line = layer.pixel(125, 100).expect("pixel");
    assert!(on_line.alpha() > 0);
    assert_eq!(on_line.red(), on_line.alpha());
    assert_eq!(layer.pixel(125, 110).expect("pixel").alpha(), 0);
    assert_eq!(layer.pixel(99, 90).expect("pixel").alpha(), 0);
}

#[test]
fn moves_never_persist() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    core.on_pointer_down(Point::new(10.0, 10.0), Button::Primary);
    for i in 1..20 {
        let actions = core.on_pointer_move(Point::new(10.0 + f64::from(i) * 5.0, 10.0));
        assert_eq!(actions, vec![Action::RenderNeeded]);
    }
    assert_eq!(persists(&core.on_pointer_up()), 1);
}

#[test]
fn blur_and_cancel_finalize_and_persist() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);

    core.on_pointer_down(Point::new(10.0, 10.0), Button::Primary);
    core.on_pointer_move(Point::new(20.0, 10.0));
    assert_eq!(persists(&core.on_blur()), 1);
    assert!(!core.is_drawing());

    core.on_pointer_down(Point::new(10.0, 30.0), Button::Primary);
    assert_eq!(persists(&core.on_pointer_cancel()), 1);
    assert_eq!(persists(&core.on_pointer_up()), 0);
}

#[test]
fn pointer_down_without_participant_is_noop() {
    let mut core = loaded_core();
    core.set_participant(None);
    core.select_tool(Tool::Ink);
    assert!(core.on_pointer_down(Point::new(10.0, 10.0), Button::Primary).is_empty());
    assert!(!core.is_drawing());
    assert!(core.on_pointer_up().is_empty());
}

#[test]
fn pointer_down_before_image_loads_is_noop() {
    let mut core = EngineCore::new();
    core.set_participant(Some(participant(ME)));
    core.set_reference_url(Some(URL));
    core.select_tool(Tool::Ink);
    core.on_pointer_down(Point::new(10.0, 10.0), Button::Primary);
    assert!(!core.is_drawing());
    assert!(core.layers.is_empty());
}

#[test]
fn secondary_button_is_ignored() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    assert!(core.on_pointer_down(Point::new(10.0, 10.0), Button::Secondary).is_empty());
    assert!(!core.is_drawing());
}

#[test]
fn stroke_respects_zoom_and_pan() {
    let mut core = loaded_core();
    core.restore_viewport(ViewportState { zoom: 0.5, pan_x: 100.0, pan_y: 0.0 });
    core.select_tool(Tool::Ink);
    // screen (150, 50) -> image (100, 100); screen (175, 50) -> image (150, 100)
    draw(&mut core, (150.0, 50.0), (175.0, 50.0));
    assert!(core.layers.get(ME).and_then(|l| l.pixel(125, 100)).expect("pixel").alpha() > 0);
}

#[test]
fn eraser_uses_latched_tool() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    draw(&mut core, (100.0, 100.0), (150.0, 100.0));

    core.select_tool(Tool::Erase);
    core.on_pointer_down(Point::new(90.0, 100.0), Button::Primary);
    core.select_tool(Tool::Ink);
    core.on_pointer_move(Point::new(160.0, 100.0));
    core.on_pointer_up();
    assert_eq!(core.layers.get(ME).and_then(|l| l.pixel(125, 100)).expect("pixel").alpha(), 0);
}

#[test]
fn brush_color_applies_to_next_stroke() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    assert!(core.set_color("#0000ff"));
    assert!(!core.set_color("nope"));
    draw(&mut core, (100.0, 100.0), (150.0, 100.0));
    let pixel = core.layers.get(ME).and_then(|l| l.pixel(125, 100)).expect("pixel");
    assert_eq!(pixel.blue(), pixel.alpha());
    assert_eq!(pixel.red(), 0);
}

#[test]
fn width_setting_is_clamped() {
    let mut core = EngineCore::new();
    core.set_width("200");
    assert_eq!(core.brush().width(), 64.0);
    core.set_width("");
    assert_eq!(core.brush().width(), 4.0);
}

// =============================================================
// Drawing mode & panning
// =============================================================

#[test]
fn drawing_is_off_by_default_and_drag_pans() {
    let mut core = loaded_core();
    assert_eq!(core.tool(), None);
    assert_eq!(core.cursor(), "grab");

    let down = core.on_pointer_down(Point::new(10.0, 10.0), Button::Primary);
    assert_eq!(down, vec![Action::SetCursor("grabbing")]);
    assert_eq!(core.on_pointer_move(Point::new(40.0, 30.0)), vec![Action::TransformChanged]);
    let state = core.viewport.state();
    assert_eq!((state.pan_x, state.pan_y), (30.0, 20.0));

    let up = core.on_pointer_up();
    assert_eq!(up, vec![Action::PersistViewport, Action::SetCursor("grab")]);
    assert!(core.layers.get(ME).is_none());
}

#[test]
fn selecting_active_tool_toggles_drawing_off() {
    let mut core = loaded_core();
    assert_eq!(core.select_tool(Tool::Ink), vec![Action::SetCursor("crosshair")]);
    assert_eq!(core.tool(), Some(Tool::Ink));
    assert_eq!(core.select_tool(Tool::Erase), vec![Action::SetCursor("crosshair")]);
    assert_eq!(core.tool(), Some(Tool::Erase));
    assert_eq!(core.select_tool(Tool::Erase), vec![Action::SetCursor("grab")]);
    assert_eq!(core.tool(), None);
}

#[test]
fn toggling_off_mid_stroke_finalizes_first() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    core.on_pointer_down(Point::new(10.0, 10.0), Button::Primary);
    core.on_pointer_move(Point::new(30.0, 10.0));
    let actions = core.select_tool(Tool::Ink);
    assert_eq!(persists(&actions), 1);
    assert!(!core.is_drawing());
    assert_eq!(core.disable_drawing(), Vec::new());
}

#[test]
fn wheel_zooms_around_cursor_when_not_drawing() {
    let mut core = loaded_core();
    let cursor = Point::new(200.0, 150.0);
    let before = core.viewport.to_image_space(cursor);
    let actions = core.on_wheel(cursor, -100.0);
    assert_eq!(actions, vec![Action::TransformChanged, Action::RenderNeeded, Action::PersistViewport]);
    assert!((core.viewport.zoom() - 1.12).abs() < 1e-9);
    let after = core.viewport.to_image_space(cursor);
    assert!((before.x - after.x).abs() < 1e-9);
    assert!((before.y - after.y).abs() < 1e-9);
}

#[test]
fn wheel_is_ignored_in_drawing_mode() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    assert!(core.on_wheel(Point::new(0.0, 0.0), -100.0).is_empty());
    assert_eq!(core.viewport.zoom(), 1.0);
}

// =============================================================
// Reference image lifecycle
// =============================================================

#[test]
fn image_load_fits_and_requests_resubscribe() {
    let mut core = EngineCore::new();
    core.set_container(Size::new(400.0, 400.0));
    core.set_reference_url(Some(URL));
    let actions = core.on_reference_loaded(URL, ImageSize::new(800, 600));
    assert!(actions.contains(&Action::ResubscribeLayers));
    assert!(actions.contains(&Action::TransformChanged));
    let state = core.viewport.state();
    assert_eq!(state.zoom, 0.5);
    assert_eq!((state.pan_x, state.pan_y), (0.0, 50.0));
}

#[test]
fn fit_happens_once_per_image() {
    let mut core = EngineCore::new();
    core.set_container(Size::new(400.0, 400.0));
    core.set_reference_url(Some(URL));
    core.on_reference_loaded(URL, ImageSize::new(800, 600));
    core.on_wheel(Point::new(0.0, 0.0), -1.0);
    let zoomed = core.viewport.state();

    assert!(core.fit_if_needed().is_empty());
    assert!(core.set_container(Size::new(500.0, 500.0)).is_empty());
    assert_eq!(core.viewport.state(), zoomed);
}

#[test]
fn hidden_container_defers_fit_until_visible() {
    let mut core = EngineCore::new();
    core.set_container(Size::new(0.0, 0.0));
    core.set_reference_url(Some(URL));
    let actions = core.on_reference_loaded(URL, ImageSize::new(800, 600));
    assert!(!actions.contains(&Action::TransformChanged));
    assert_eq!(core.viewport.last_fit_url(), None);

    let actions = core.set_container(Size::new(800.0, 600.0));
    assert!(actions.contains(&Action::TransformChanged));
    assert_eq!(core.viewport.last_fit_url(), Some(URL));
}

#[test]
fn new_image_resets_layers_and_fit() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    draw(&mut core, (10.0, 10.0), (50.0, 10.0));
    assert!(core.layers.contains(ME));

    core.set_reference_url(Some("https://cdn.example/maps/cave.png"));
    assert!(core.layers.is_empty());
    assert_eq!(core.layers.size(), None);
    assert_eq!(core.viewport.last_fit_url(), None);

    core.on_reference_loaded("https://cdn.example/maps/cave.png", ImageSize::new(1024, 768));
    assert_eq!(core.layers.size(), Some(ImageSize::new(1024, 768)));
}

#[test]
fn stale_and_duplicate_loads_are_ignored() {
    let mut core = loaded_core();
    assert!(core.on_reference_loaded("https://cdn.example/old.png", ImageSize::new(10, 10)).is_empty());
    core.select_tool(Tool::Ink);
    draw(&mut core, (10.0, 10.0), (50.0, 10.0));
    assert!(core.on_reference_loaded(URL, ImageSize::new(800, 600)).is_empty());
    assert!(core.layers.contains(ME));
}

#[test]
fn same_url_does_not_reset() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    draw(&mut core, (10.0, 10.0), (50.0, 10.0));
    assert!(core.set_reference_url(Some(&format!(" {URL} "))).is_empty());
    assert!(core.layers.contains(ME));
}

#[test]
fn clearing_the_image_disables_drawing_surface() {
    let mut core = loaded_core();
    core.set_reference_url(None);
    assert!(core.reference().is_none());
    assert!(core.repaint().is_none());
    core.select_tool(Tool::Ink);
    core.on_pointer_down(Point::new(1.0, 1.0), Button::Primary);
    assert!(!core.is_drawing());
}

fn snapshot_of(actions: &[Action]) -> Option<&str> {
    actions.iter().find_map(|a| match a {
        Action::PersistSnapshot { participant, image_data } if participant == ME => Some(image_data.as_str()),
        _ => None,
    })
}

#[test]
fn image_swap_mid_stroke_keeps_the_stroke() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    core.on_pointer_down(Point::new(100.0, 100.0), Button::Primary);
    core.on_pointer_move(Point::new(150.0, 100.0));

    let actions = core.set_reference_url(Some("https://cdn.example/maps/next.png"));
    let image_data = snapshot_of(&actions).expect("stroke snapshot before reset");
    let saved = decode_layer(image_data, ImageSize::new(800, 600)).expect("decode");
    assert!(saved.pixel(125, 100).expect("pixel").alpha() > 0);

    assert!(!core.is_drawing());
    assert!(core.layers.is_empty());
    assert!(core.on_pointer_up().is_empty());
}

#[test]
fn image_reload_mid_stroke_keeps_the_stroke() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    core.on_pointer_down(Point::new(100.0, 100.0), Button::Primary);
    core.on_pointer_move(Point::new(150.0, 100.0));

    // Same URL, new pixels behind it at a different size.
    let actions = core.on_reference_loaded(URL, ImageSize::new(1600, 1200));
    let image_data = snapshot_of(&actions).expect("stroke snapshot before reset");
    assert!(!decode_layer(image_data, ImageSize::new(800, 600)).expect("decode").is_blank());
    assert!(actions.contains(&Action::ResubscribeLayers));

    assert!(!core.is_drawing());
    assert_eq!(core.layers.size(), Some(ImageSize::new(1600, 1200)));
    assert!(core.on_pointer_up().is_empty());
}

#[test]
fn image_swap_while_idle_writes_nothing() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    draw(&mut core, (10.0, 10.0), (50.0, 10.0));
    let actions = core.set_reference_url(Some("https://cdn.example/maps/next.png"));
    assert_eq!(actions, vec![Action::RenderNeeded]);
}

// =============================================================
// Remote merge
// =============================================================

#[test]
fn remote_add_then_local_draw_paints_in_id_order() {
    let mut core = loaded_core();
    let actions = core.apply_remote_changes(&[DocChange::added("B", remote_snapshot((0, 0, 255, 255)))]);
    assert_eq!(actions, vec![Action::RenderNeeded]);

    core.select_tool(Tool::Ink);
    draw(&mut core, (100.0, 100.0), (150.0, 100.0));
    assert_eq!(core.layers.paint_order(), vec!["B", ME]);

    // "B" < "m-local": local red ink paints over B's blue.
    let frame = core.repaint().expect("frame");
    let pixel = frame.pixmap.pixel(125, 100).expect("pixel");
    assert_eq!(pixel.red(), 255);
    assert_eq!(pixel.blue(), 0);
}

#[test]
fn remote_layer_sorting_after_local_paints_over_it() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    draw(&mut core, (100.0, 100.0), (150.0, 100.0));
    core.apply_remote_changes(&[DocChange::added("zed", remote_snapshot((0, 0, 255, 255)))]);
    assert_eq!(core.layers.paint_order(), vec![ME, "zed"]);
    let frame = core.repaint().expect("frame");
    assert_eq!(frame.pixmap.pixel(125, 100).expect("pixel").blue(), 255);
}

#[test]
fn local_layer_survives_remote_merge() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    draw(&mut core, (100.0, 100.0), (150.0, 100.0));
    let before = core.layers.get(ME).cloned();

    core.apply_remote_changes(&[
        DocChange::added("B", remote_snapshot((0, 0, 255, 255))),
        DocChange::modified("B", remote_snapshot((0, 255, 0, 128))),
        DocChange::removed("C"),
    ]);
    assert_eq!(core.layers.get(ME).cloned(), before);
}

#[test]
fn malformed_remote_payload_changes_nothing() {
    let mut core = loaded_core();
    let actions = core.apply_remote_changes(&[DocChange::added("B", json!({ "imageData": "garbage" }))]);
    assert!(actions.is_empty());
    assert!(!core.layers.contains("B"));
}

#[test]
fn composite_is_identical_regardless_of_arrival_order() {
    let changes = [
        DocChange::added("B", remote_snapshot((0, 0, 255, 200))),
        DocChange::added("A", remote_snapshot((255, 0, 0, 100))),
        DocChange::added("C", remote_snapshot((0, 255, 0, 150))),
    ];
    let mut forward = loaded_core();
    forward.apply_remote_changes(&changes);
    let mut reversed = loaded_core();
    let mut backwards = changes.to_vec();
    backwards.reverse();
    reversed.apply_remote_changes(&backwards);

    let a = forward.repaint().expect("frame");
    let b = reversed.repaint().expect("frame");
    assert_eq!(a.pixmap.data(), b.pixmap.data());
}

// =============================================================
// Clearing
// =============================================================

#[test]
fn clear_mine_removes_local_layer_only() {
    let mut core = loaded_core();
    core.apply_remote_changes(&[DocChange::added("B", remote_snapshot((0, 0, 255, 255)))]);
    core.select_tool(Tool::Ink);
    draw(&mut core, (100.0, 100.0), (150.0, 100.0));
    let remote_before = core.layers.get("B").cloned();

    let actions = core.clear_mine();
    assert!(actions.contains(&Action::DeleteLayer { participant: ME.to_owned() }));
    assert!(core.layers.get(ME).is_none());
    assert_eq!(core.layers.get("B").cloned(), remote_before);
}

#[test]
fn clear_mine_without_participant_is_noop() {
    let mut core = loaded_core();
    core.set_participant(None);
    assert!(core.clear_mine().is_empty());
}

#[test]
fn clear_all_requires_gm() {
    let mut core = loaded_core();
    assert!(core.request_clear_all().is_empty());
    assert!(core.clear_all_local().is_empty());

    core.set_role(Role::Gm);
    assert_eq!(core.request_clear_all(), vec![Action::ConfirmClearAll]);
}

#[test]
fn clear_all_local_keeps_empty_local_layer() {
    let mut core = loaded_core();
    core.set_role(Role::Gm);
    core.apply_remote_changes(&[DocChange::added("B", remote_snapshot((0, 0, 255, 255)))]);
    core.select_tool(Tool::Ink);
    draw(&mut core, (100.0, 100.0), (150.0, 100.0));

    assert_eq!(core.clear_all_local(), vec![Action::RenderNeeded]);
    assert_eq!(core.layers.paint_order(), vec![ME]);
    assert!(core.layers.get(ME).expect("local").is_blank());
}

// =============================================================
// Participant changes & rendering
// =============================================================

#[test]
fn switching_participant_mid_stroke_persists_previous() {
    let mut core = loaded_core();
    core.select_tool(Tool::Ink);
    core.on_pointer_down(Point::new(10.0, 10.0), Button::Primary);
    let actions = core.set_participant(Some(participant("other")));
    assert!(actions.contains(&Action::PersistLayer { participant: ME.to_owned() }));
    assert!(core.set_participant(Some(participant("other"))).is_empty());
}

#[test]
fn engine_without_image_clears_the_surface() {
    let mut engine = Engine::new(MirrorSurface::default());
    engine.render().expect("render");
    assert!(engine.display().shown.is_none());
    assert_eq!(engine.display().clears, 1);
}

#[test]
fn engine_shows_the_same_pixels_as_a_full_repaint() {
    let mut engine = Engine::new(MirrorSurface::default());
    engine.core = loaded_core();
    engine.core.select_tool(Tool::Ink);
    assert_eq!(engine.core.set_device_pixel_ratio(2.0), vec![Action::RenderNeeded]);
    assert!(engine.core.set_device_pixel_ratio(2.0).is_empty());
    engine.core.apply_remote_changes(&[DocChange::added("zed", remote_snapshot((0, 0, 255, 255)))]);

    engine.core.on_pointer_down(Point::new(100.0, 100.0), Button::Primary);
    for step in 1..=5 {
        engine.core.on_pointer_move(Point::new(100.0 + f64::from(step) * 20.0, 100.0 + f64::from(step) * 3.0));
        engine.render().expect("render");
    }
    engine.core.on_pointer_up();
    engine.render().expect("render");

    let expected = engine.core.repaint().expect("frame");
    let shown = engine.display().shown.as_ref().expect("shown");
    assert_eq!((shown.width(), shown.height()), (1600, 1200));
    assert_eq!(shown.data(), expected.pixmap.data());
}

#[test]
fn pointer_moves_upload_only_the_touched_region() {
    let mut engine = Engine::new(MirrorSurface::default());
    engine.core = loaded_core();
    engine.core.select_tool(Tool::Ink);
    engine.core.on_pointer_down(Point::new(100.0, 100.0), Button::Primary);
    engine.render().expect("render");
    assert_eq!(engine.display().uploads, vec![(ME.to_owned(), Damage::Full)]);

    for step in 1..=10 {
        engine.core.on_pointer_move(Point::new(100.0 + f64::from(step) * 5.0, 100.0));
        engine.render().expect("render");
    }
    let uploads = &engine.display().uploads[1..];
    assert_eq!(uploads.len(), 10);
    for (_, damage) in uploads {
        let Damage::Region(rect) = damage else {
            panic!("move uploaded {damage:?}");
        };
        assert!(rect.width < 20 && rect.height < 20, "move uploaded {rect:?}");
    }

    // Nothing changed: composite again without uploading.
    engine.render().expect("render");
    assert_eq!(region_uploads(engine.display()), 10);
}

#[test]
fn removed_layers_leave_the_surface() {
    let mut engine = Engine::new(MirrorSurface::default());
    engine.core = loaded_core();
    engine.core.apply_remote_changes(&[DocChange::added("zed", remote_snapshot((0, 0, 255, 255)))]);
    engine.render().expect("render");
    assert!(engine.display().mirrors.contains_key("zed"));

    engine.core.apply_remote_changes(&[DocChange::removed("zed")]);
    engine.render().expect("render");
    assert!(!engine.display().mirrors.contains_key("zed"));
    let shown = engine.display().shown.as_ref().expect("shown");
    assert!(shown.pixels().iter().all(|p| p.alpha() == 0));
}
