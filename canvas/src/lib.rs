//! Drawing overlay core for the Show & Tell display.
//!
//! Every participant draws on their own transparent raster layer at the
//! reference image's native resolution. Layers are composited client-side in
//! participant-id order, persisted as whole-layer PNG snapshots once per
//! finished stroke, and merged back from a live subscription on the other
//! clients. The browser host wires DOM events into [`engine::EngineCore`]
//! and executes the [`engine::Action`]s it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`viewport`] | Zoom/pan transform and coordinate conversions |
//! | [`layer`] | Per-participant layers and the layer store |
//! | [`stroke`] | Tools, brush, and the stroke state machine |
//! | [`compositor`] | Deterministic layer compositing and the display-surface seam |
//! | [`sync`] | Snapshot persistence and remote-change merging |
//! | [`codec`] | Layer rasters to and from PNG data URIs |
//! | [`store`] | Document-store capability and subscriptions |
//! | [`memory`] | In-process document store |
//! | [`identity`] | Participant identity and session roles |
//! | [`input`] | Mouse buttons, pan gesture, cursors |
//! | [`color`] | Ink colour parsing |
//! | [`render`] | `<canvas>` presentation and CSS alignment |
//! | [`consts`] | Shared numeric constants (zoom limits, brush sizes, etc.) |

pub mod codec;
pub mod color;
pub mod compositor;
pub mod consts;
pub mod engine;
pub mod identity;
pub mod input;
pub mod layer;
pub mod memory;
pub mod render;
pub mod store;
pub mod stroke;
pub mod sync;
pub mod viewport;
