use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::detection::domain::face_detector::{DetectionRequest, FaceDetector};
use crate::mapping::domain::scaled_frame::scaled_frame_rect;
use crate::overlay::domain::overlay_builder::build_still_overlays;
use crate::overlay::domain::overlay_controller::{OverlayController, PresentOutcome, StalePolicy};
use crate::overlay::domain::overlay_shape::ShapeStyle;
use crate::overlay::infrastructure::raster_surface::RasterSurface;
use crate::pipeline::asset_locator::locate_asset;
use crate::pipeline::detection_worker::DetectionWorkerPool;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_logger::{
    PipelineLogger, METRIC_FACES, METRIC_SHAPES, STAGE_COMPOSE, STAGE_DETECT, STAGE_WRITE,
};
use crate::shared::display_rect::DisplayRect;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// A fixed display region showing one image aspect-fit.
///
/// The image's on-screen rect is recomputed on every [`layout`] and is
/// `None` until both an image and a non-empty region are known.
///
/// [`layout`]: StillImageView::layout
#[derive(Clone, Debug, Default)]
pub struct StillImageView {
    bounds: DisplayRect,
    image_size: Option<(u32, u32)>,
    scaled_rect: Option<DisplayRect>,
}

impl StillImageView {
    pub fn new(bounds: DisplayRect) -> Self {
        Self {
            bounds,
            image_size: None,
            scaled_rect: None,
        }
    }

    pub fn set_image(&mut self, width: u32, height: u32) {
        self.image_size = Some((width, height));
        self.scaled_rect = None;
    }

    pub fn layout(&mut self, bounds: DisplayRect) {
        self.bounds = bounds;
        self.scaled_rect = self.image_size.and_then(|(w, h)| {
            let rect = scaled_frame_rect(w as f64, h as f64, &bounds);
            (!rect.is_empty()).then_some(rect)
        });
    }

    pub fn bounds(&self) -> DisplayRect {
        self.bounds
    }

    pub fn scaled_rect(&self) -> Option<DisplayRect> {
        self.scaled_rect
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StillReport {
    /// The resolved input path; `None` when the asset was not found.
    pub source: Option<PathBuf>,
    pub faces: usize,
    pub shapes: usize,
    pub written: bool,
}

/// Still-image flow: locate → read → lay out → detect in background →
/// draw rectangles → write the composed display.
pub struct AnnotateStillUseCase {
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
    workers: DetectionWorkerPool,
    display: (u32, u32),
    face_style: ShapeStyle,
    logger: Box<dyn PipelineLogger>,
}

impl AnnotateStillUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
        detector: Box<dyn FaceDetector>,
        display: (u32, u32),
        face_style: ShapeStyle,
        logger: Box<dyn PipelineLogger>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            reader,
            image_writer,
            workers: DetectionWorkerPool::spawn(vec![detector])?,
            display,
            face_style,
            logger,
        })
    }

    pub fn execute(
        &mut self,
        input: &str,
        assets_dir: Option<&Path>,
        output_path: &Path,
    ) -> Result<StillReport, Box<dyn std::error::Error>> {
        let Some(source) = locate_asset(input, assets_dir) else {
            log::warn!("Image asset {input:?} not found, nothing to draw");
            return Ok(StillReport::default());
        };
        let mut report = StillReport {
            source: Some(source.clone()),
            ..StillReport::default()
        };

        let metadata = self.reader.open(&source)?;
        let frame = self.reader.frames().next().ok_or(PipelineError::NoFrames)??;
        self.reader.close();
        self.logger
            .info(&format!("Loaded {} ({}x{})", source.display(), metadata.width, metadata.height));

        let (dw, dh) = self.display;
        let mut surface = RasterSurface::new(dw, dh);
        let mut view = StillImageView::default();
        view.set_image(frame.width(), frame.height());
        view.layout(surface.bounds());
        let Some(image_rect) = view.scaled_rect() else {
            log::warn!("Image or display region is empty, nothing to draw");
            return Ok(report);
        };

        let start = Instant::now();
        self.workers
            .submit(frame.clone(), DetectionRequest::faces())
            .ok_or(PipelineError::WorkersGone)?;
        let completion = self
            .workers
            .completions()
            .recv()
            .map_err(|_| PipelineError::WorkersGone)?;
        self.logger
            .timing(STAGE_DETECT, start.elapsed().as_secs_f64() * 1000.0);

        // Completion is applied here, on the thread that owns the surface.
        let mut controller = OverlayController::new(StalePolicy::DropStale);
        match completion.outcome {
            Ok(observations) => {
                report.faces = observations.len();
                let shapes = build_still_overlays(&observations, &image_rect, self.face_style);
                if let PresentOutcome::Applied { added, .. } =
                    controller.present(&mut surface, completion.sequence, shapes)
                {
                    report.shapes = added;
                }
                self.logger.metric(METRIC_FACES, report.faces as f64);
                self.logger.metric(METRIC_SHAPES, report.shapes as f64);
            }
            Err(e) => log::warn!("Face detection failed: {e}"),
        }

        let start = Instant::now();
        surface.set_background(frame, image_rect);
        let composed = surface.compose(0);
        self.logger
            .timing(STAGE_COMPOSE, start.elapsed().as_secs_f64() * 1000.0);

        let start = Instant::now();
        self.image_writer.write(output_path, &composed)?;
        self.logger
            .timing(STAGE_WRITE, start.elapsed().as_secs_f64() * 1000.0);
        self.logger.progress(1, 1);
        report.written = true;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_error::DetectionError;
    use crate::detection::domain::face_observation::FaceObservation;
    use crate::overlay::domain::overlay_shape::Color;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::frame::Frame;
    use crate::shared::normalized_rect::NormalizedRect;
    use crate::shared::video_metadata::VideoMetadata;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    // --- Stubs ---

    struct StubImageReader {
        frame: Option<Frame>,
    }

    impl VideoReader for StubImageReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            let frame = self.frame.as_ref().ok_or("no image")?;
            Ok(VideoMetadata::still(
                frame.width(),
                frame.height(),
                Some(path.to_path_buf()),
            ))
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.frame.take().into_iter().map(Ok))
        }

        fn close(&mut self) {}
    }

    type Written = Arc<Mutex<Vec<(PathBuf, Frame)>>>;

    struct StubImageWriter {
        written: Written,
    }

    impl ImageWriter for StubImageWriter {
        fn write(
            &self,
            path: &Path,
            frame: &Frame,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.written
                .lock()
                .unwrap()
                .push((path.to_path_buf(), frame.clone()));
            Ok(())
        }
    }

    struct StubDetector {
        result: Result<Vec<FaceObservation>, String>,
    }

    impl FaceDetector for StubDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
            request: &DetectionRequest,
        ) -> Result<Vec<FaceObservation>, DetectionError> {
            assert!(!request.landmarks);
            self.result.clone().map_err(DetectionError::Inference)
        }
    }

    fn asset_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("iprofile.png"), b"stub").unwrap();
        tmp
    }

    fn use_case(
        image: Frame,
        result: Result<Vec<FaceObservation>, String>,
        display: (u32, u32),
    ) -> (AnnotateStillUseCase, Written) {
        let written = Written::default();
        let uc = AnnotateStillUseCase::new(
            Box::new(StubImageReader { frame: Some(image) }),
            Box::new(StubImageWriter {
                written: written.clone(),
            }),
            Box::new(StubDetector { result }),
            display,
            ShapeStyle::outline(Color::YELLOW, 1),
            Box::new(NullPipelineLogger),
        )
        .unwrap();
        (uc, written)
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    // --- StillImageView ---

    #[test]
    fn test_view_without_image_has_no_rect() {
        let mut view = StillImageView::default();
        view.layout(DisplayRect::with_size(100.0, 100.0));
        assert!(view.scaled_rect().is_none());
    }

    #[test]
    fn test_view_recomputes_on_every_layout() {
        let mut view = StillImageView::new(DisplayRect::default());
        view.set_image(400, 200);
        view.layout(DisplayRect::with_size(200.0, 200.0));
        assert_relative_eq!(view.scaled_rect().unwrap().height, 100.0);

        view.layout(DisplayRect::with_size(400.0, 400.0));
        assert_relative_eq!(view.scaled_rect().unwrap().height, 200.0);

        view.layout(DisplayRect::with_size(0.0, 0.0));
        assert!(view.scaled_rect().is_none());
    }

    // --- Use case ---

    #[test]
    fn test_draws_mapped_rectangle_and_writes() {
        let assets = asset_dir();
        let out = assets.path().join("out.png");
        // 100x100 image in a 100x200 display: letterboxed at y = 50
        let face = FaceObservation::new(NormalizedRect::new(0.25, 0.5, 0.5, 0.25), 0.9);
        let (mut uc, written) =
            use_case(Frame::filled(100, 100, [40, 40, 40], 0), Ok(vec![face]), (100, 200));

        let report = uc.execute("iprofile", Some(assets.path()), &out).unwrap();
        assert_eq!(report.faces, 1);
        assert_eq!(report.shapes, 1);
        assert!(report.written);
        assert_eq!(report.source, Some(assets.path().join("iprofile.png")));

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        let (path, frame) = &written[0];
        assert_eq!(path, &out);
        assert_eq!((frame.width(), frame.height()), (100, 200));
        // Rect (25, 50 + 25, 50, 25): top-left corner stroked
        assert_eq!(pixel(frame, 25, 75), Color::YELLOW.to_rgb());
        // Letterbox margin stays black, image area shows the image
        assert_eq!(pixel(frame, 50, 10), [0, 0, 0]);
        assert_eq!(pixel(frame, 5, 140), [40, 40, 40]);
    }

    #[test]
    fn test_missing_asset_short_circuits() {
        let assets = TempDir::new().unwrap();
        let (mut uc, written) = use_case(Frame::filled(10, 10, [0, 0, 0], 0), Ok(vec![]), (10, 10));

        let report = uc
            .execute("iprofile", Some(assets.path()), &assets.path().join("o.png"))
            .unwrap();
        assert_eq!(report, StillReport::default());
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_display_short_circuits() {
        let assets = asset_dir();
        let (mut uc, written) = use_case(Frame::filled(10, 10, [0, 0, 0], 0), Ok(vec![]), (0, 0));

        let report = uc
            .execute("iprofile", Some(assets.path()), &assets.path().join("o.png"))
            .unwrap();
        assert!(!report.written);
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_detection_failure_still_writes_image() {
        let assets = asset_dir();
        let (mut uc, written) = use_case(
            Frame::filled(10, 10, [9, 9, 9], 0),
            Err("model crashed".into()),
            (10, 10),
        );

        let report = uc
            .execute("iprofile", Some(assets.path()), &assets.path().join("o.png"))
            .unwrap();
        assert!(report.written);
        assert_eq!(report.shapes, 0);
        assert_eq!(written.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_no_faces_draws_nothing() {
        let assets = asset_dir();
        let (mut uc, written) = use_case(Frame::filled(8, 8, [7, 7, 7], 0), Ok(vec![]), (8, 8));

        let report = uc
            .execute("iprofile", Some(assets.path()), &assets.path().join("o.png"))
            .unwrap();
        assert_eq!(report.shapes, 0);
        let written = written.lock().unwrap();
        assert!(written[0].1.data().chunks(3).all(|p| p == [7, 7, 7]));
    }
}
