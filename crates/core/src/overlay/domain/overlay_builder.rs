//! Turns detector observations into display-space overlay shapes.

use crate::detection::domain::face_observation::FaceObservation;
use crate::mapping::domain::face_rect_mapper::map_face_rect;
use crate::mapping::domain::landmark_mapper::map_landmark_points;
use crate::mapping::domain::preview_geometry::PreviewGeometry;
use crate::overlay::domain::overlay_shape::{OverlayShape, ShapeStyle};
use crate::shared::display_rect::DisplayRect;

/// Rectangles only, mapped against the image's on-screen rect.
pub fn build_still_overlays(
    observations: &[FaceObservation],
    image_rect: &DisplayRect,
    style: ShapeStyle,
) -> Vec<OverlayShape> {
    observations
        .iter()
        .map(|o| OverlayShape::rectangle(map_face_rect(&o.bounding_box, image_rect), style))
        .collect()
}

/// For each face: its rectangle, then one closed outline per present
/// landmark region. Empty regions add nothing.
pub fn build_live_overlays(
    observations: &[FaceObservation],
    geometry: &PreviewGeometry,
    face_style: ShapeStyle,
    landmark_style: ShapeStyle,
) -> Vec<OverlayShape> {
    let mut shapes = Vec::new();
    for observation in observations {
        let face = geometry.convert_rect(&observation.bounding_box);
        shapes.push(OverlayShape::rectangle(face, face_style));

        let Some(landmarks) = &observation.landmarks else {
            continue;
        };
        for (_, region) in landmarks.iter() {
            if region.is_empty() {
                continue;
            }
            let points = map_landmark_points(region.points(), &face);
            shapes.push(OverlayShape::closed_polyline(points, landmark_style));
        }
    }
    shapes
}
