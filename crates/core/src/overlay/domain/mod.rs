pub mod display_surface;
pub mod overlay_builder;
pub mod overlay_controller;
pub mod overlay_shape;
