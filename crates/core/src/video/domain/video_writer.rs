use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Sink for the composed live preview.
pub trait VideoWriter: Send {
    /// `metadata` gives the output size and rate; a zero rate means the
    /// writer picks its own.
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes buffered frames and finalizes the container.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
