//! Utility helpers shared across client UI modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser storage concerns from component logic so
//! the parsing and sanitising rules stay testable outside the browser.

pub mod display;
pub mod session;
pub mod settings;
pub mod ui_persistence;
