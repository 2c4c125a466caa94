//! In-memory display surface rendered with `imageproc`.
//!
//! Stands in for a platform view: a fixed-size canvas with an optional
//! background image placed at a display rect, plus attached overlay shapes
//! drawn in attach order on every compose.

use std::collections::BTreeMap;

use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_polygon_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::overlay::domain::display_surface::{DisplaySurface, ShapeId};
use crate::overlay::domain::overlay_shape::{Color, OverlayShape, ShapeKind};
use crate::shared::display_rect::{DisplayPoint, DisplayRect};
use crate::shared::frame::Frame;

const BACKDROP: Color = Color { r: 0, g: 0, b: 0 };

pub struct RasterSurface {
    width: u32,
    height: u32,
    background: Option<(Frame, DisplayRect)>,
    shapes: BTreeMap<ShapeId, OverlayShape>,
    next_id: u64,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: None,
            shapes: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> DisplayRect {
        DisplayRect::with_size(self.width as f64, self.height as f64)
    }

    /// Shows `frame` scaled into `placement`. Parts of the placement outside
    /// the canvas are cropped.
    pub fn set_background(&mut self, frame: Frame, placement: DisplayRect) {
        self.background = Some((frame, placement));
    }

    /// Renders the background and every attached shape into a new frame.
    pub fn compose(&self, index: usize) -> Frame {
        let mut canvas = RgbImage::from_pixel(self.width, self.height, rgb(BACKDROP));

        if let Some((frame, placement)) = &self.background {
            blit_scaled(&mut canvas, frame, placement);
        }
        for shape in self.shapes.values() {
            draw_shape(&mut canvas, shape);
        }

        Frame::new(canvas.into_raw(), self.width, self.height, 3, index)
    }
}

impl DisplaySurface for RasterSurface {
    fn add_shape(&mut self, shape: OverlayShape) -> ShapeId {
        self.next_id += 1;
        let id = ShapeId::new(self.next_id);
        self.shapes.insert(id, shape);
        id
    }

    fn remove_shape(&mut self, id: ShapeId) -> bool {
        self.shapes.remove(&id).is_some()
    }

    fn shape_count(&self) -> usize {
        self.shapes.len()
    }
}

fn rgb(color: Color) -> Rgb<u8> {
    Rgb(color.to_rgb())
}

/// Nearest-neighbor copy of `frame` into `placement` on the canvas.
fn blit_scaled(canvas: &mut RgbImage, frame: &Frame, placement: &DisplayRect) {
    if frame.is_empty() || placement.is_empty() || frame.channels() < 3 {
        return;
    }
    let src = frame.as_ndarray();
    let src_w = frame.width() as usize;
    let src_h = frame.height() as usize;
    let sx = frame.width() as f64 / placement.width;
    let sy = frame.height() as f64 / placement.height;

    let x0 = placement.x.max(0.0).floor() as u32;
    let y0 = placement.y.max(0.0).floor() as u32;
    let x1 = (placement.max_x().ceil().max(0.0) as u32).min(canvas.width());
    let y1 = (placement.max_y().ceil().max(0.0) as u32).min(canvas.height());

    for y in y0..y1 {
        let v = (y as f64 + 0.5 - placement.y) * sy;
        if v < 0.0 {
            continue;
        }
        let src_y = (v as usize).min(src_h - 1);
        for x in x0..x1 {
            let u = (x as f64 + 0.5 - placement.x) * sx;
            if u < 0.0 {
                continue;
            }
            let src_x = (u as usize).min(src_w - 1);
            canvas.put_pixel(
                x,
                y,
                Rgb([
                    src[[src_y, src_x, 0]],
                    src[[src_y, src_x, 1]],
                    src[[src_y, src_x, 2]],
                ]),
            );
        }
    }
}

fn draw_shape(canvas: &mut RgbImage, shape: &OverlayShape) {
    let stroke = rgb(shape.style.stroke);
    let line_width = shape.style.line_width.max(1);

    match &shape.kind {
        ShapeKind::Rectangle(rect) => {
            let Some((x, y, w, h)) = rect.to_pixel_bounds() else {
                return;
            };
            if let Some(fill) = shape.style.fill {
                draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(w, h), rgb(fill));
            }
            // Stroke grows inward from the rect's edge
            for inset in 0..line_width {
                let i = inset as i32;
                let (iw, ih) = (w.saturating_sub(2 * inset), h.saturating_sub(2 * inset));
                if iw == 0 || ih == 0 {
                    break;
                }
                draw_hollow_rect_mut(canvas, Rect::at(x + i, y + i).of_size(iw, ih), stroke);
            }
        }
        ShapeKind::Polyline { points, closed } => {
            if *closed {
                if let Some(fill) = shape.style.fill {
                    fill_polygon(canvas, points, rgb(fill));
                }
            }
            for (a, b) in segments(points, *closed) {
                draw_thick_segment(canvas, a, b, line_width, stroke);
            }
        }
    }
}

/// Consecutive point pairs; a closed path adds the last-to-first edge. A
/// single point yields one degenerate segment so it still marks a pixel.
fn segments(points: &[DisplayPoint], closed: bool) -> Vec<(DisplayPoint, DisplayPoint)> {
    match points.len() {
        0 => Vec::new(),
        1 => vec![(points[0], points[0])],
        _ => {
            let mut out: Vec<_> = points.windows(2).map(|w| (w[0], w[1])).collect();
            if closed && points.len() > 2 {
                out.push((points[points.len() - 1], points[0]));
            }
            out
        }
    }
}

fn draw_thick_segment(
    canvas: &mut RgbImage,
    a: DisplayPoint,
    b: DisplayPoint,
    line_width: u32,
    color: Rgb<u8>,
) {
    let half = (line_width as i32 - 1) / 2;
    for dy in -half..=(line_width as i32 - 1 - half) {
        for dx in -half..=(line_width as i32 - 1 - half) {
            if a == b {
                let (px, py) = (a.x.round() as i64 + dx as i64, a.y.round() as i64 + dy as i64);
                if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
                continue;
            }
            let (ox, oy) = (dx as f32, dy as f32);
            draw_line_segment_mut(
                canvas,
                (a.x as f32 + ox, a.y as f32 + oy),
                (b.x as f32 + ox, b.y as f32 + oy),
                color,
            );
        }
    }
}

fn fill_polygon(canvas: &mut RgbImage, points: &[DisplayPoint], color: Rgb<u8>) {
    let mut poly: Vec<Point<i32>> = points
        .iter()
        .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
        .collect();
    poly.dedup();
    if poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    // imageproc rejects polygons without at least three distinct vertices
    if poly.len() >= 3 {
        draw_polygon_mut(canvas, &poly, color);
    }
}
