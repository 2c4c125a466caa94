//! Aspect-fit placement of an image inside a display region.

use crate::shared::display_rect::DisplayRect;

/// Where an image of `intrinsic_width × intrinsic_height` pixels lands when
/// shown aspect-fit inside `frame`: scaled uniformly, centered, letterboxed
/// on the long axis.
///
/// The result is expressed in the region's own coordinate space; the
/// region's origin is not added. Degenerate input (zero intrinsic size or a
/// zero-sized region) yields a zero-size rect rather than NaNs.
pub fn scaled_frame_rect(
    intrinsic_width: f64,
    intrinsic_height: f64,
    frame: &DisplayRect,
) -> DisplayRect {
    if intrinsic_width <= 0.0 || intrinsic_height <= 0.0 || frame.is_empty() {
        return DisplayRect::default();
    }

    let width_ratio = intrinsic_width / frame.width;
    let height_ratio = intrinsic_height / frame.height;
    let scale = width_ratio.max(height_ratio);

    let scaled_width = intrinsic_width / scale;
    let scaled_height = intrinsic_height / scale;

    DisplayRect {
        x: (frame.width - scaled_width) / 2.0,
        y: (frame.height - scaled_height) / 2.0,
        width: scaled_width,
        height: scaled_height,
    }
}
