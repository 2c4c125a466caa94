/// YOLO face-pose detector using ONNX Runtime via `ort`.
///
/// Orients the frame, letterboxes it, runs inference and NMS, then reports
/// faces in the bottom-left-origin unit square of the upright image. When
/// landmarks are requested the model's five keypoints become face-local
/// landmark regions.
use std::path::Path;

use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::face_detector::{DetectionRequest, FaceDetector};
use crate::detection::domain::face_landmarks::{FaceLandmarks, LandmarkFeature, LandmarkRegion};
use crate::detection::domain::face_observation::FaceObservation;
use crate::shared::frame::Frame;
use crate::shared::normalized_rect::{NormalizedPoint, NormalizedRect};

use super::onnx_session::build_session;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoints per detection (5 landmarks × 3 values each: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// Keypoint slots in model output order.
const KP_LEFT_EYE: usize = 0;
const KP_RIGHT_EYE: usize = 1;
const KP_NOSE: usize = 2;
const KP_LEFT_MOUTH: usize = 3;
const KP_RIGHT_MOUTH: usize = 4;

/// YOLO face detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, DetectionError> {
        let session = build_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!("YOLO detector ready ({input_size}px input, confidence {confidence})");

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }

    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, DetectionError> {
        let inference_err = |e: &dyn std::fmt::Display| DetectionError::Inference(e.to_string());

        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value =
            ort::value::Tensor::from_array(input_tensor).map_err(|e| inference_err(&e))?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| inference_err(&e))?;
        if outputs.len() == 0 {
            return Err(DetectionError::Inference(
                "YOLO model produced no outputs".into(),
            ));
        }
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| inference_err(&e))?;
        let shape = tensor.shape().to_vec();

        // [1, features, detections] (transposed) or [1, detections, features]
        if shape.len() != 3 {
            return Err(DetectionError::Inference(format!(
                "unexpected YOLO output shape: {shape:?}"
            )));
        }
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };

        let data = tensor
            .as_slice()
            .ok_or_else(|| DetectionError::Inference("non-contiguous output tensor".into()))?;

        let mut dets = Vec::new();
        for i in 0..num_dets {
            let row: Vec<f32> = if transposed {
                (0..num_feats).map(|f| data[f * num_dets + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            };
            if let Some(det) = parse_row(&row, self.confidence, scale, pad_x, pad_y) {
                dets.push(det);
            }
        }
        Ok(dets)
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        request: &DetectionRequest,
    ) -> Result<Vec<FaceObservation>, DetectionError> {
        if frame.is_empty() {
            return Err(DetectionError::InvalidFrame);
        }

        let upright = frame.oriented(request.orientation);
        let mut raw = self.infer(&upright)?;
        let kept = nms(&mut raw, NMS_IOU_THRESH);

        Ok(kept
            .iter()
            .filter_map(|d| to_observation(d, upright.width(), upright.height(), request.landmarks))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Output conversion
// ---------------------------------------------------------------------------

/// Parses one model row `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`
/// into frame-space corners. Rows below `confidence` are dropped.
fn parse_row(
    row: &[f32],
    confidence: f64,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
) -> Option<RawDetection> {
    if row.len() < 5 {
        return None;
    }
    let conf = row[4] as f64;
    if conf < confidence {
        return None;
    }

    let cx = row[0] as f64;
    let cy = row[1] as f64;
    let w = row[2] as f64;
    let h = row[3] as f64;
    let px = pad_x as f64;
    let py = pad_y as f64;

    let keypoints = if row.len() >= 5 + NUM_KEYPOINT_VALUES {
        let mut pts = [None; 5];
        for (k, slot) in pts.iter_mut().enumerate() {
            let kconf = row[5 + k * 3 + 2] as f64;
            if kconf >= KEYPOINT_CONF_THRESH {
                let kx = row[5 + k * 3] as f64;
                let ky = row[5 + k * 3 + 1] as f64;
                *slot = Some(((kx - px) / scale, (ky - py) / scale));
            }
        }
        Some(pts)
    } else {
        None
    };

    Some(RawDetection {
        x1: ((cx - w / 2.0) - px) / scale,
        y1: ((cy - h / 2.0) - py) / scale,
        x2: ((cx + w / 2.0) - px) / scale,
        y2: ((cy + h / 2.0) - py) / scale,
        confidence: conf,
        keypoints,
    })
}

/// Converts a frame-space detection into a normalized observation.
///
/// Boxes are clamped to the frame; boxes left with no area are dropped.
fn to_observation(
    det: &RawDetection,
    frame_w: u32,
    frame_h: u32,
    with_landmarks: bool,
) -> Option<FaceObservation> {
    let w = frame_w as f64;
    let h = frame_h as f64;
    let x1 = det.x1.clamp(0.0, w);
    let y1 = det.y1.clamp(0.0, h);
    let x2 = det.x2.clamp(0.0, w);
    let y2 = det.y2.clamp(0.0, h);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    let rect = NormalizedRect::from_pixel_corners((x1, y1, x2, y2), frame_w, frame_h);
    let observation = FaceObservation::new(rect, det.confidence);

    if !with_landmarks {
        return Some(observation);
    }
    match det.keypoints.map(|kps| landmarks_from_keypoints(&kps, (x1, y1, x2, y2))) {
        Some(lm) if !lm.is_empty() => Some(observation.with_landmarks(lm)),
        _ => Some(observation),
    }
}

/// Builds face-local landmark regions from frame-space keypoints.
///
/// Landmark points carry swapped axes: `x` runs down the face box (scaled by
/// its width) and `y` runs across it (scaled by its height). The display
/// mapper swaps them back.
fn landmarks_from_keypoints(
    keypoints: &[Option<(f64, f64)>; 5],
    (x1, y1, x2, y2): (f64, f64, f64, f64),
) -> FaceLandmarks {
    let box_w = x2 - x1;
    let box_h = y2 - y1;
    let local = |k: usize| {
        keypoints[k].map(|(kx, ky)| NormalizedPoint::new((ky - y1) / box_w, (kx - x1) / box_h))
    };

    let mut landmarks = FaceLandmarks::default();
    let singles = [
        (KP_LEFT_EYE, LandmarkFeature::LeftPupil),
        (KP_RIGHT_EYE, LandmarkFeature::RightPupil),
        (KP_NOSE, LandmarkFeature::Nose),
    ];
    for (k, feature) in singles {
        if let Some(p) = local(k) {
            landmarks.set_region(feature, LandmarkRegion::new(vec![p]));
        }
    }

    let lips: Vec<NormalizedPoint> = [KP_LEFT_MOUTH, KP_RIGHT_MOUTH]
        .into_iter()
        .filter_map(local)
        .collect();
    if !lips.is_empty() {
        landmarks.set_region(LandmarkFeature::OuterLips, LandmarkRegion::new(lips));
    }

    landmarks
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray (YOLO convention)
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    keypoints: Option<[Option<(f64, f64)>; 5]>,
}

impl RawDetection {
    fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if !suppressed[j] && bbox_iou(&dets[i].bbox(), &dets[j].bbox()) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
