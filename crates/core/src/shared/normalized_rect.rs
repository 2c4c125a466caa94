/// A detector-reported rectangle in unit-square coordinates.
///
/// Origin is the bottom-left corner of the analysed image and y grows
/// upward. Components are nominally in `[0, 1]`, but detectors may report
/// boxes that spill slightly past the image edge; nothing here clamps them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    /// The whole unit square.
    pub const UNIT: NormalizedRect = NormalizedRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rect from pixel corners in a top-left-origin image of
    /// `image_w × image_h`, flipping into the bottom-left convention.
    ///
    /// Corners are clamped to the image before normalizing. A zero-sized
    /// image yields a zero rect.
    pub fn from_pixel_corners(
        (x1, y1, x2, y2): (f64, f64, f64, f64),
        image_w: u32,
        image_h: u32,
    ) -> Self {
        if image_w == 0 || image_h == 0 {
            return Self::default();
        }
        let w = image_w as f64;
        let h = image_h as f64;
        let left = x1.min(x2).clamp(0.0, w);
        let right = x1.max(x2).clamp(0.0, w);
        let top = y1.min(y2).clamp(0.0, h);
        let bottom = y1.max(y2).clamp(0.0, h);

        Self {
            x: left / w,
            y: 1.0 - bottom / h,
            width: (right - left) / w,
            height: (bottom - top) / h,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A face-local normalized landmark point.
///
/// Relative to [`NormalizedRect`] the detector swaps the roles of x and y
/// here; see `landmark_mapper` for how that is undone on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_rect_extents() {
        let r = NormalizedRect::UNIT;
        assert_relative_eq!(r.max_x(), 1.0);
        assert_relative_eq!(r.max_y(), 1.0);
        assert!(!r.is_empty());
    }

    #[test]
    fn test_from_pixel_corners_flips_y() {
        // Box in the top-left quarter of a 200x100 image
        let r = NormalizedRect::from_pixel_corners((0.0, 0.0, 100.0, 50.0), 200, 100);
        assert_relative_eq!(r.x, 0.0);
        assert_relative_eq!(r.y, 0.5);
        assert_relative_eq!(r.width, 0.5);
        assert_relative_eq!(r.height, 0.5);
    }

    #[test]
    fn test_from_pixel_corners_bottom_edge_has_zero_y() {
        let r = NormalizedRect::from_pixel_corners((50.0, 80.0, 150.0, 100.0), 200, 100);
        assert_relative_eq!(r.y, 0.0);
        assert_relative_eq!(r.height, 0.2);
    }

    #[test]
    fn test_from_pixel_corners_clamps_to_image() {
        let r = NormalizedRect::from_pixel_corners((-20.0, -10.0, 250.0, 120.0), 200, 100);
        assert_eq!(r, NormalizedRect::UNIT);
    }

    #[test]
    fn test_from_pixel_corners_zero_image() {
        let r = NormalizedRect::from_pixel_corners((0.0, 0.0, 10.0, 10.0), 0, 100);
        assert!(r.is_empty());
    }

    #[test]
    fn test_empty_when_zero_width() {
        assert!(NormalizedRect::new(0.2, 0.2, 0.0, 0.3).is_empty());
    }
}
