/// How a frame's stored pixels relate to its upright display orientation.
///
/// Mirrors the eight EXIF orientations. Each variant names the transform
/// that has already happened to the stored data; [`Frame::oriented`] undoes
/// it. A front-facing camera held in portrait typically delivers
/// `LeftMirrored` frames.
///
/// [`Frame::oriented`]: crate::shared::frame::Frame::oriented
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageOrientation {
    /// Stored upright.
    #[default]
    Up,
    /// Mirrored left-to-right.
    UpMirrored,
    /// Rotated 180°.
    Down,
    /// Mirrored top-to-bottom.
    DownMirrored,
    /// Needs a 90° counter-clockwise turn to be upright.
    Left,
    /// Stored transposed (row 0 is the visual left column).
    LeftMirrored,
    /// Needs a 90° clockwise turn to be upright.
    Right,
    /// Stored anti-transposed (row 0 is the visual right column).
    RightMirrored,
}

impl ImageOrientation {
    pub const ALL: &[ImageOrientation] = &[
        ImageOrientation::Up,
        ImageOrientation::UpMirrored,
        ImageOrientation::Down,
        ImageOrientation::DownMirrored,
        ImageOrientation::Left,
        ImageOrientation::LeftMirrored,
        ImageOrientation::Right,
        ImageOrientation::RightMirrored,
    ];

    /// True when upright output swaps the stored width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            ImageOrientation::Left
                | ImageOrientation::LeftMirrored
                | ImageOrientation::Right
                | ImageOrientation::RightMirrored
        )
    }

    /// Upright `(width, height)` for stored dimensions `(w, h)`.
    pub fn oriented_size(self, w: u32, h: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (h, w)
        } else {
            (w, h)
        }
    }

    /// Maps an upright output pixel `(x, y)` back to the stored pixel it
    /// comes from, for stored dimensions `(w, h)`.
    pub(crate) fn source_pixel(self, x: usize, y: usize, w: usize, h: usize) -> (usize, usize) {
        match self {
            ImageOrientation::Up => (x, y),
            ImageOrientation::UpMirrored => (w - 1 - x, y),
            ImageOrientation::Down => (w - 1 - x, h - 1 - y),
            ImageOrientation::DownMirrored => (x, h - 1 - y),
            ImageOrientation::Left => (w - 1 - y, x),
            ImageOrientation::LeftMirrored => (y, x),
            ImageOrientation::Right => (y, h - 1 - x),
            ImageOrientation::RightMirrored => (w - 1 - y, h - 1 - x),
        }
    }

    /// Parses the kebab-case names used on the command line
    /// (`up`, `left-mirrored`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        let parsed = match name {
            "up" => ImageOrientation::Up,
            "up-mirrored" => ImageOrientation::UpMirrored,
            "down" => ImageOrientation::Down,
            "down-mirrored" => ImageOrientation::DownMirrored,
            "left" => ImageOrientation::Left,
            "left-mirrored" => ImageOrientation::LeftMirrored,
            "right" => ImageOrientation::Right,
            "right-mirrored" => ImageOrientation::RightMirrored,
            _ => return None,
        };
        Some(parsed)
    }
}

impl std::fmt::Display for ImageOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ImageOrientation::Up => "up",
            ImageOrientation::UpMirrored => "up-mirrored",
            ImageOrientation::Down => "down",
            ImageOrientation::DownMirrored => "down-mirrored",
            ImageOrientation::Left => "left",
            ImageOrientation::LeftMirrored => "left-mirrored",
            ImageOrientation::Right => "right",
            ImageOrientation::RightMirrored => "right-mirrored",
        };
        f.write_str(name)
    }
}
