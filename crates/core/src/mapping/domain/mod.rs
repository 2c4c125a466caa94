pub mod face_rect_mapper;
pub mod landmark_mapper;
pub mod preview_geometry;
pub mod scaled_frame;
