pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Directory name used under the platform cache/config dirs.
pub const APP_DIR_NAME: &str = "FaceOverlay";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Display region used for still images when none is configured
/// (a portrait phone-sized view).
pub const DEFAULT_DISPLAY_WIDTH: u32 = 375;
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 667;

/// Face rectangles are drawn in yellow, landmark outlines in green.
pub const FACE_STROKE_RGB: [u8; 3] = [255, 255, 0];
pub const LANDMARK_STROKE_RGB: [u8; 3] = [0, 255, 0];

/// Pending detection jobs per worker before new frames are skipped.
pub const DETECTION_QUEUE_PER_WORKER: usize = 2;
