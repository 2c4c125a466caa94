use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::face_observation::FaceObservation;
use crate::shared::frame::Frame;
use crate::shared::image_orientation::ImageOrientation;

/// Per-call options for a detection request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectionRequest {
    /// How the frame's stored pixels must be turned to be upright. Results
    /// are normalized against the upright image.
    pub orientation: ImageOrientation,
    /// Also report per-feature landmark regions.
    pub landmarks: bool,
}

impl DetectionRequest {
    pub fn faces() -> Self {
        Self::default()
    }

    pub fn with_landmarks(orientation: ImageOrientation) -> Self {
        Self {
            orientation,
            landmarks: true,
        }
    }
}

/// Domain interface for face detection.
///
/// Implementations may keep per-session state (inference buffers, warm
/// sessions), hence `&mut self`. Each worker thread owns its own instance.
pub trait FaceDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        request: &DetectionRequest,
    ) -> Result<Vec<FaceObservation>, DetectionError>;
}
