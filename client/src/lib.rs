//! Browser host for the Show & Tell drawing overlay.
//!
//! SYSTEM CONTEXT
//! ==============
//! Everything that touches the DOM or the JavaScript store host is compiled
//! only with the `csr` feature; the remaining modules (wire parsing, local
//! settings, view state) build and test natively.

#[cfg(feature = "csr")]
pub mod app;
#[cfg(feature = "csr")]
pub mod components;
pub mod net;
pub mod state;
pub mod util;
