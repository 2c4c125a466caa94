use crate::shared::constants::{FACE_STROKE_RGB, LANDMARK_STROKE_RGB};
use crate::shared::display_rect::{DisplayPoint, DisplayRect};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const YELLOW: Color = Color::from_rgb(FACE_STROKE_RGB);
    pub const GREEN: Color = Color::from_rgb(LANDMARK_STROKE_RGB);

    pub const fn from_rgb(rgb: [u8; 3]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
        }
    }

    pub fn to_rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Stroke and fill for one overlay shape. `fill: None` is transparent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeStyle {
    pub stroke: Color,
    pub fill: Option<Color>,
    pub line_width: u32,
}

impl ShapeStyle {
    pub fn outline(stroke: Color, line_width: u32) -> Self {
        Self {
            stroke,
            fill: None,
            line_width,
        }
    }

    pub fn face() -> Self {
        Self::outline(Color::YELLOW, 2)
    }

    pub fn landmark() -> Self {
        Self::outline(Color::GREEN, 1)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    Rectangle(DisplayRect),
    /// Points joined in order; `closed` also joins the last point to the first.
    Polyline {
        points: Vec<DisplayPoint>,
        closed: bool,
    },
}

/// A drawable overlay in display coordinates. Built fresh for every
/// detection generation.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayShape {
    pub kind: ShapeKind,
    pub style: ShapeStyle,
}

impl OverlayShape {
    pub fn rectangle(rect: DisplayRect, style: ShapeStyle) -> Self {
        Self {
            kind: ShapeKind::Rectangle(rect),
            style,
        }
    }

    pub fn closed_polyline(points: Vec<DisplayPoint>, style: ShapeStyle) -> Self {
        Self {
            kind: ShapeKind::Polyline {
                points,
                closed: true,
            },
            style,
        }
    }
}
