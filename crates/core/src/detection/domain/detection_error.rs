use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("detector model error: {0}")]
    Model(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("frame has no pixels to analyse")]
    InvalidFrame,
}
