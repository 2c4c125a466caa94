use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::normalized_rect::NormalizedRect;

/// One detected face.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceObservation {
    /// Bottom-left-origin unit-square rect relative to the upright image.
    pub bounding_box: NormalizedRect,
    /// Present only when landmarks were requested and the detector found any.
    pub landmarks: Option<FaceLandmarks>,
    pub confidence: f64,
}

impl FaceObservation {
    pub fn new(bounding_box: NormalizedRect, confidence: f64) -> Self {
        Self {
            bounding_box,
            landmarks: None,
            confidence,
        }
    }

    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }
}
