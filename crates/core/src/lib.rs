pub mod detection;
pub mod mapping;
pub mod overlay;
pub mod pipeline;
pub mod shared;
pub mod video;
