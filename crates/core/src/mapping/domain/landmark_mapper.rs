use crate::shared::display_rect::{DisplayPoint, DisplayRect};
use crate::shared::normalized_rect::NormalizedPoint;

/// Maps face-local landmark points onto the screen using the face's
/// already-mapped display rect.
///
/// The detector reports landmark points with x and y exchanged relative to
/// its frame-level rects, so the point's `y` scales by the face height along
/// the display x axis and its `x` by the face width along the display y
/// axis. This is deliberate and must not be "corrected".
pub fn map_landmark_points(points: &[NormalizedPoint], face: &DisplayRect) -> Vec<DisplayPoint> {
    points
        .iter()
        .map(|p| DisplayPoint {
            x: p.y * face.height + face.x,
            y: p.x * face.width + face.y,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axes_are_swapped() {
        let face = DisplayRect::new(100.0, 200.0, 50.0, 80.0);
        let pts = map_landmark_points(&[NormalizedPoint::new(0.5, 0.25)], &face);
        // x = 0.25 * 80 + 100, y = 0.5 * 50 + 200
        assert_relative_eq!(pts[0].x, 120.0);
        assert_relative_eq!(pts[0].y, 225.0);
    }

    #[test]
    fn test_origin_point_maps_to_face_origin() {
        let face = DisplayRect::new(12.0, 34.0, 56.0, 78.0);
        let pts = map_landmark_points(&[NormalizedPoint::new(0.0, 0.0)], &face);
        assert_eq!(pts[0], DisplayPoint::new(12.0, 34.0));
    }

    #[test]
    fn test_preserves_input_order() {
        let face = DisplayRect::with_size(100.0, 100.0);
        let input = [
            NormalizedPoint::new(0.1, 0.9),
            NormalizedPoint::new(0.5, 0.5),
            NormalizedPoint::new(0.9, 0.1),
        ];
        let xs: Vec<f64> = map_landmark_points(&input, &face)
            .iter()
            .map(|p| p.x)
            .collect();
        assert_eq!(xs, vec![90.0, 50.0, 10.0]);
    }

    #[test]
    fn test_empty_region_maps_to_nothing() {
        assert!(map_landmark_points(&[], &DisplayRect::with_size(10.0, 10.0)).is_empty());
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let face = DisplayRect::new(3.5, 9.25, 41.0, 67.0);
        let input: Vec<NormalizedPoint> = (0..16)
            .map(|i| NormalizedPoint::new(i as f64 / 15.0, 1.0 - i as f64 / 15.0))
            .collect();
        let first = map_landmark_points(&input, &face);
        for _ in 0..5 {
            assert_eq!(map_landmark_points(&input, &face), first);
        }
    }
}
