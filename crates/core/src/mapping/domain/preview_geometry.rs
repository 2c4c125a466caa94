//! Normalized-to-display conversion for a live preview surface.
//!
//! A live preview shows oriented camera frames (rotated to the display
//! orientation and mirrored for a front sensor) scaled into the preview's
//! bounds according to its gravity. The detector sees frames with the same
//! orientation applied, so its normalized output already lives in the
//! preview's orientation; only the gravity placement remains to be undone.

use crate::mapping::domain::face_rect_mapper::map_face_rect;
use crate::mapping::domain::scaled_frame::scaled_frame_rect;
use crate::shared::display_rect::DisplayRect;
use crate::shared::normalized_rect::NormalizedRect;

/// How frame content is scaled into the preview bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VideoGravity {
    /// Uniform scale that covers the bounds; overflow is cropped.
    #[default]
    AspectFill,
    /// Uniform scale that fits inside the bounds; margins are letterboxed.
    AspectFit,
    /// Non-uniform stretch to the bounds.
    Resize,
}

impl VideoGravity {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "fill" => Some(VideoGravity::AspectFill),
            "fit" => Some(VideoGravity::AspectFit),
            "resize" => Some(VideoGravity::Resize),
            _ => None,
        }
    }
}

/// Current layout of a live preview: its on-screen bounds plus the size of
/// the oriented frames it displays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewGeometry {
    pub bounds: DisplayRect,
    pub content_width: f64,
    pub content_height: f64,
    pub gravity: VideoGravity,
}

impl PreviewGeometry {
    pub fn new(
        bounds: DisplayRect,
        content_width: f64,
        content_height: f64,
        gravity: VideoGravity,
    ) -> Self {
        Self {
            bounds,
            content_width,
            content_height,
            gravity,
        }
    }

    /// Where the full frame content lands, in the preview's coordinate
    /// space. With `AspectFill` the rect overflows the bounds.
    pub fn content_rect(&self) -> DisplayRect {
        let b = &self.bounds;
        let placed = match self.gravity {
            VideoGravity::Resize => DisplayRect::with_size(b.width, b.height),
            VideoGravity::AspectFit => {
                scaled_frame_rect(self.content_width, self.content_height, b)
            }
            VideoGravity::AspectFill => {
                if self.content_width <= 0.0 || self.content_height <= 0.0 || b.is_empty() {
                    DisplayRect::default()
                } else {
                    let scale = (b.width / self.content_width).max(b.height / self.content_height);
                    let w = self.content_width * scale;
                    let h = self.content_height * scale;
                    DisplayRect::new((b.width - w) / 2.0, (b.height - h) / 2.0, w, h)
                }
            }
        };
        DisplayRect {
            x: b.x + placed.x,
            y: b.y + placed.y,
            ..placed
        }
    }

    /// Converts a detector rect into preview coordinates.
    pub fn convert_rect(&self, normalized: &NormalizedRect) -> DisplayRect {
        map_face_rect(normalized, &self.content_rect())
    }
}
