pub mod display_area;
pub mod drawing_overlay;
pub mod drawing_toolbar;
pub mod overlay_host;
