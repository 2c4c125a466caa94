use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source produced no frames")]
    NoFrames,
    #[error("detection workers stopped before delivering a result")]
    WorkersGone,
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
    #[error("at least one detector is required")]
    NoDetectors,
}
