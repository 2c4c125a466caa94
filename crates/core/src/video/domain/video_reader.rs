use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// A capture source: a still image, a video file, a stream or a device.
///
/// Implementations own the decoding details. Callers see RGB [`Frame`]s in
/// stored orientation and the source's [`VideoMetadata`].
pub trait VideoReader: Send {
    /// Opens the source and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in capture order. Live sources may
    /// never end; callers bound it with `take`.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    fn close(&mut self);
}
