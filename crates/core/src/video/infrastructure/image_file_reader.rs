use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Adapts a single image file to the [`VideoReader`] interface.
///
/// The image is decoded eagerly on `open` with the `image` crate and yielded
/// once as frame 0, so the still flow reads assets the same way the live
/// flow reads a capture source.
pub struct ImageFileReader {
    frame: Option<Frame>,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for ImageFileReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        log::debug!("Decoded {} ({width}x{height})", path.display());

        self.frame = Some(Frame::new(rgb.into_raw(), width, height, 3, 0));
        Ok(VideoMetadata::still(width, height, Some(path.to_path_buf())))
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        match self.frame.take() {
            Some(frame) => Box::new(std::iter::once(Ok(frame))),
            None => Box::new(std::iter::once(Err("ImageFileReader: not opened".into()))),
        }
    }

    fn close(&mut self) {
        self.frame = None;
    }
}
