//! Client-side view state.

pub mod overlay;
