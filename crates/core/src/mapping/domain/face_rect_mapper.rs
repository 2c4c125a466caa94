use crate::shared::display_rect::DisplayRect;
use crate::shared::normalized_rect::NormalizedRect;

/// Maps a detector rect into pixel space against a reference rect.
///
/// The detector's y axis points up from the bottom edge while the display's
/// points down from the top, so the vertical origin is flipped:
/// `y = ref.y + (1 - n.y - n.height) * ref.height`.
pub fn map_face_rect(normalized: &NormalizedRect, reference: &DisplayRect) -> DisplayRect {
    DisplayRect {
        x: reference.x + normalized.x * reference.width,
        y: reference.y + (1.0 - normalized.y - normalized.height) * reference.height,
        width: normalized.width * reference.width,
        height: normalized.height * reference.height,
    }
}
