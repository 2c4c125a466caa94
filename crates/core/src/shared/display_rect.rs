/// A pixel-space rectangle on the rendering surface.
///
/// Origin top-left, y grows downward. Width and height are never negative
/// for rects produced by the mappers; zero-area rects are legal and simply
/// draw nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A pixel-space point on the rendering surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

impl DisplayPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl DisplayRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rect anchored at the origin, e.g. the bounds of a view.
    pub fn with_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
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

    /// True if `other` lies inside `self`, allowing `epsilon` of slack on
    /// every edge for floating-point rounding.
    pub fn contains_rect(&self, other: &DisplayRect, epsilon: f64) -> bool {
        other.x >= self.x - epsilon
            && other.y >= self.y - epsilon
            && other.max_x() <= self.max_x() + epsilon
            && other.max_y() <= self.max_y() + epsilon
    }

    /// Integer pixel bounds `(x, y, w, h)` for rasterization, rounded to the
    /// nearest pixel. Returns `None` for rects that cover no whole pixel.
    pub fn to_pixel_bounds(&self) -> Option<(i32, i32, u32, u32)> {
        let x = self.x.round();
        let y = self.y.round();
        let w = (self.max_x().round() - x).max(0.0);
        let h = (self.max_y().round() - y).max(0.0);
        if w < 1.0 || h < 1.0 || !w.is_finite() || !h.is_finite() {
            return None;
        }
        Some((x as i32, y as i32, w as u32, h as u32))
    }
}
