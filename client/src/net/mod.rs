//! Bindings to the page's JavaScript store host.
//!
//! SYSTEM CONTEXT
//! ==============
//! `wire` defines the JSON payloads crossing the wasm boundary; `js_host`
//! implements the drawing core's store and identity capabilities over them.

#[cfg(feature = "csr")]
pub mod js_host;
pub mod wire;
