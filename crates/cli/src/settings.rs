use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use faceoverlay_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use faceoverlay_core::mapping::domain::preview_geometry::VideoGravity;
use faceoverlay_core::overlay::domain::overlay_controller::StalePolicy;
use faceoverlay_core::overlay::domain::overlay_shape::{Color, ShapeStyle};
use faceoverlay_core::shared::constants::{
    APP_DIR_NAME, DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH, FACE_STROKE_RGB,
    LANDMARK_STROKE_RGB,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    Fill,
    Fit,
    Resize,
}

impl From<Gravity> for VideoGravity {
    fn from(g: Gravity) -> Self {
        match g {
            Gravity::Fill => VideoGravity::AspectFill,
            Gravity::Fit => VideoGravity::AspectFit,
            Gravity::Resize => VideoGravity::Resize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Staleness {
    /// Late detection results are ignored.
    Drop,
    /// Every detection result is drawn in arrival order.
    Apply,
}

impl From<Staleness> for StalePolicy {
    fn from(s: Staleness) -> Self {
        match s {
            Staleness::Drop => StalePolicy::DropStale,
            Staleness::Apply => StalePolicy::ApplyAll,
        }
    }
}

/// User defaults read from `settings.json`. Command-line flags win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub face_color: [u8; 3],
    pub face_line_width: u32,
    pub landmark_color: [u8; 3],
    pub landmark_line_width: u32,
    pub display_width: u32,
    pub display_height: u32,
    pub confidence: f64,
    pub workers: usize,
    pub gravity: Gravity,
    pub stale: Staleness,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            face_color: FACE_STROKE_RGB,
            face_line_width: 2,
            landmark_color: LANDMARK_STROKE_RGB,
            landmark_line_width: 1,
            display_width: DEFAULT_DISPLAY_WIDTH,
            display_height: DEFAULT_DISPLAY_HEIGHT,
            confidence: DEFAULT_CONFIDENCE,
            workers: 1,
            gravity: Gravity::Fill,
            stale: Staleness::Drop,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads `path`, or the default location when `None`. A missing or
    /// unreadable file yields the defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Self::default();
        };
        let Ok(json) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str::<Self>(&json) {
            Ok(settings) => {
                log::debug!("Loaded settings from {}", path.display());
                settings.sanitize()
            }
            Err(e) => {
                log::warn!("Ignoring invalid settings in {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Resets out-of-range values to their defaults, warning for each.
    pub fn sanitize(mut self) -> Self {
        let defaults = Self::default();
        if self.workers == 0 {
            log::warn!("Ignoring workers = 0 in settings; using {}", defaults.workers);
            self.workers = defaults.workers;
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            log::warn!(
                "Ignoring confidence = {} in settings; using {}",
                self.confidence,
                defaults.confidence
            );
            self.confidence = defaults.confidence;
        }
        if self.display_width == 0 || self.display_height == 0 {
            log::warn!(
                "Ignoring display size {}x{} in settings; using {}x{}",
                self.display_width,
                self.display_height,
                defaults.display_width,
                defaults.display_height
            );
            self.display_width = defaults.display_width;
            self.display_height = defaults.display_height;
        }
        if self.face_line_width == 0 {
            log::warn!("Ignoring face_line_width = 0 in settings");
            self.face_line_width = defaults.face_line_width;
        }
        if self.landmark_line_width == 0 {
            log::warn!("Ignoring landmark_line_width = 0 in settings");
            self.landmark_line_width = defaults.landmark_line_width;
        }
        self
    }

    pub fn face_style(&self) -> ShapeStyle {
        ShapeStyle::outline(Color::from_rgb(self.face_color), self.face_line_width)
    }

    pub fn landmark_style(&self) -> ShapeStyle {
        ShapeStyle::outline(Color::from_rgb(self.landmark_color), self.landmark_line_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("settings.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(Some(&dir.path().join("absent.json")));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_json_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "{ not json");
        assert_eq!(Settings::load(Some(&path)), Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{ "workers": 3, "stale": "apply", "gravity": "fit" }"#);

        let settings = Settings::load(Some(&path));
        assert_eq!(settings.workers, 3);
        assert_eq!(settings.stale, Staleness::Apply);
        assert_eq!(settings.gravity, Gravity::Fit);
        assert_eq!(settings.face_color, FACE_STROKE_RGB);
        assert_eq!(settings.display_width, DEFAULT_DISPLAY_WIDTH);
    }

    #[test]
    fn test_out_of_range_values_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"{ "workers": 0, "confidence": 7.5, "display_width": 0, "gravity": "fit" }"#,
        );

        let settings = Settings::load(Some(&path));
        let defaults = Settings::default();
        assert_eq!(settings.workers, defaults.workers);
        assert_eq!(settings.confidence, defaults.confidence);
        assert_eq!(settings.display_width, defaults.display_width);
        assert_eq!(settings.display_height, defaults.display_height);
        assert_eq!(settings.gravity, Gravity::Fit);
    }

    #[test]
    fn test_sanitize_keeps_valid_values() {
        let settings = Settings {
            workers: 4,
            confidence: 0.6,
            display_width: 100,
            display_height: 50,
            face_line_width: 0,
            ..Settings::default()
        }
        .sanitize();
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.confidence, 0.6);
        assert_eq!((settings.display_width, settings.display_height), (100, 50));
        assert_eq!(settings.face_line_width, 2);
    }

    #[test]
    fn test_nan_confidence_is_rejected() {
        let settings = Settings {
            confidence: f64::NAN,
            ..Settings::default()
        }
        .sanitize();
        assert_eq!(settings.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_styles_follow_settings() {
        let settings = Settings {
            face_color: [1, 2, 3],
            face_line_width: 4,
            ..Settings::default()
        };
        let style = settings.face_style();
        assert_eq!(style.stroke.to_rgb(), [1, 2, 3]);
        assert_eq!(style.line_width, 4);
        assert_eq!(style.fill, None);
        assert_eq!(Settings::default().landmark_style(), ShapeStyle::landmark());
        assert_eq!(Settings::default().face_style(), ShapeStyle::face());
    }

    #[test]
    fn test_enum_conversions() {
        assert_eq!(StalePolicy::from(Staleness::Drop), StalePolicy::DropStale);
        assert_eq!(StalePolicy::from(Staleness::Apply), StalePolicy::ApplyAll);
        assert_eq!(VideoGravity::from(Gravity::Fill), VideoGravity::AspectFill);
        assert_eq!(VideoGravity::from(Gravity::Resize), VideoGravity::Resize);
    }

    #[test]
    fn test_serializes_lowercase_names() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains(r#""gravity":"fill""#));
        assert!(json.contains(r#""stale":"drop""#));
    }
}
