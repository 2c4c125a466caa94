pub mod constants;
pub mod display_rect;
pub mod frame;
pub mod image_orientation;
pub mod model_resolver;
pub mod normalized_rect;
pub mod video_metadata;
