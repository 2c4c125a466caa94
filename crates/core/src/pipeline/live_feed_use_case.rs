use std::path::Path;
use std::time::Instant;

use crossbeam_channel::{select, Receiver};

use crate::detection::domain::face_detector::DetectionRequest;
use crate::mapping::domain::preview_geometry::{PreviewGeometry, VideoGravity};
use crate::overlay::domain::overlay_builder::build_live_overlays;
use crate::overlay::domain::overlay_controller::{OverlayController, PresentOutcome, StalePolicy};
use crate::overlay::domain::overlay_shape::ShapeStyle;
use crate::overlay::infrastructure::raster_surface::RasterSurface;
use crate::pipeline::detection_worker::{DetectionCompletion, DetectionWorkerPool};
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_logger::{
    PipelineLogger, METRIC_DETECT_SKIPPED, METRIC_FACES, METRIC_SHAPES, METRIC_STALE_DROPPED,
    STAGE_COMPOSE, STAGE_DETECT, STAGE_WRITE,
};
use crate::shared::display_rect::DisplayRect;
use crate::shared::frame::Frame;
use crate::shared::image_orientation::ImageOrientation;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Frames buffered between capture and render.
const RENDER_QUEUE_CAPACITY: usize = 4;

/// Output frame rate when the source doesn't report one.
const FALLBACK_FPS: f64 = 30.0;

#[derive(Clone, Copy, Debug)]
pub struct LiveFeedConfig {
    /// How capture frames must be turned to match the preview. Also sent to
    /// the detector so its output is already in preview orientation.
    pub orientation: ImageOrientation,
    pub gravity: VideoGravity,
    pub preview_size: (u32, u32),
    pub stale_policy: StalePolicy,
    pub face_style: ShapeStyle,
    pub landmark_style: ShapeStyle,
    /// Stop after this many frames; `None` runs until the source ends.
    pub max_frames: Option<usize>,
}

impl Default for LiveFeedConfig {
    fn default() -> Self {
        Self {
            orientation: ImageOrientation::Up,
            gravity: VideoGravity::default(),
            preview_size: (
                crate::shared::constants::DEFAULT_DISPLAY_WIDTH,
                crate::shared::constants::DEFAULT_DISPLAY_HEIGHT,
            ),
            stale_policy: StalePolicy::default(),
            face_style: ShapeStyle::face(),
            landmark_style: ShapeStyle::landmark(),
            max_frames: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveReport {
    /// `false` when the capture source could not be opened.
    pub started: bool,
    pub frames_rendered: usize,
    pub generations_applied: usize,
    pub stale_dropped: usize,
    pub failures: usize,
    pub detections_skipped: usize,
}

/// Live flow: capture thread → detection workers → render thread.
///
/// The render thread (the caller's) owns the overlay controller and the
/// preview surface. It composes a preview frame for every captured frame
/// and replaces the overlays whenever a detection completes.
pub struct LiveFeedUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    workers: DetectionWorkerPool,
    config: LiveFeedConfig,
    logger: Box<dyn PipelineLogger>,
}

impl LiveFeedUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        workers: DetectionWorkerPool,
        config: LiveFeedConfig,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            workers,
            config,
            logger,
        }
    }

    pub fn execute(
        &mut self,
        source: &Path,
        output_path: &Path,
    ) -> Result<LiveReport, Box<dyn std::error::Error>> {
        let metadata = match self.reader.open(source) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Capture source {} unavailable: {e}", source.display());
                return Ok(LiveReport::default());
            }
        };

        let (pw, ph) = self.config.preview_size;
        self.writer.open(
            output_path,
            &VideoMetadata {
                width: pw,
                height: ph,
                fps: if metadata.fps > 0.0 {
                    metadata.fps
                } else {
                    FALLBACK_FPS
                },
                total_frames: self.config.max_frames.unwrap_or(metadata.total_frames),
                codec: String::new(),
                source_path: metadata.source_path.clone(),
            },
        )?;
        self.logger.info(&format!(
            "Capturing {}x{} from {} into a {pw}x{ph} preview",
            metadata.width,
            metadata.height,
            source.display()
        ));

        let submitter = self.workers.submitter().ok_or(PipelineError::WorkersGone)?;
        let request = DetectionRequest::with_landmarks(self.config.orientation);
        let max_frames = self.config.max_frames.unwrap_or(usize::MAX);
        let total = self.config.max_frames.unwrap_or(metadata.total_frames);

        // Known up front so completions that beat the first frame still map
        let (cw, ch) = self
            .config
            .orientation
            .oriented_size(metadata.width, metadata.height);
        let geometry = PreviewGeometry::new(
            DisplayRect::with_size(pw as f64, ph as f64),
            cw as f64,
            ch as f64,
            self.config.gravity,
        );

        let reader = &mut self.reader;
        let mut render = RenderLoop {
            writer: &mut *self.writer,
            logger: &mut *self.logger,
            config: &self.config,
            surface: RasterSurface::new(pw, ph),
            controller: OverlayController::new(self.config.stale_policy),
            geometry,
            report: LiveReport {
                started: true,
                ..LiveReport::default()
            },
            total,
            last_index: None,
        };
        let completions = self.workers.completions();

        let outcome = std::thread::scope(|s| -> Result<usize, Box<dyn std::error::Error>> {
            let (frame_tx, frame_rx) =
                crossbeam_channel::bounded::<(Frame, Option<u64>)>(RENDER_QUEUE_CAPACITY);

            let capture = s.spawn(move || {
                for result in reader.frames().take(max_frames) {
                    let frame = match result {
                        Ok(f) => f,
                        Err(e) => {
                            log::warn!("Capture stopped: {e}");
                            break;
                        }
                    };
                    let sequence = submitter.submit(frame.clone(), request);
                    if frame_tx.send((frame, sequence)).is_err() {
                        break;
                    }
                }
                reader.close();
                submitter.skipped()
            });

            let rendered = render.run(frame_rx, completions);
            let skipped = capture
                .join()
                .map_err(|_| PipelineError::ThreadPanicked("capture"))?;
            rendered.map(|()| skipped)
        });
        let mut report = render.report;

        self.writer.close()?;
        report.detections_skipped = outcome?;
        self.logger
            .metric(METRIC_DETECT_SKIPPED, report.detections_skipped as f64);
        self.logger.summary();
        Ok(report)
    }
}

/// Render-thread state for one run.
struct RenderLoop<'a> {
    writer: &'a mut dyn VideoWriter,
    logger: &'a mut dyn PipelineLogger,
    config: &'a LiveFeedConfig,
    surface: RasterSurface,
    controller: OverlayController,
    geometry: PreviewGeometry,
    report: LiveReport,
    total: usize,
    /// Index of the newest rendered frame.
    last_index: Option<usize>,
}

impl RenderLoop<'_> {
    fn run(
        &mut self,
        frames: Receiver<(Frame, Option<u64>)>,
        completions: &Receiver<DetectionCompletion>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut submitted = 0usize;
        let mut completed = 0usize;

        loop {
            select! {
                recv(frames) -> msg => match msg {
                    Ok((frame, sequence)) => {
                        submitted += usize::from(sequence.is_some());
                        self.render_frame(frame)?;
                    }
                    Err(_) => break,
                },
                recv(completions) -> msg => {
                    let Ok(completion) = msg else { break };
                    completed += 1;
                    self.apply(completion);
                }
            }
        }

        self.drain(completions, submitted.saturating_sub(completed))
    }

    /// Capture has ended; waits for `pending` in-flight detections. If any
    /// of them changed the overlays, the newest frame is composed and
    /// written once more so the output ends on the final overlay state.
    fn drain(
        &mut self,
        completions: &Receiver<DetectionCompletion>,
        pending: usize,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut changed = false;
        for _ in 0..pending {
            let Ok(completion) = completions.recv() else {
                break;
            };
            changed |= self.apply(completion);
        }

        let Some(index) = self.last_index.filter(|_| changed) else {
            return Ok(());
        };
        log::debug!("Writing frame {index} again with late overlays");
        let composed = self.surface.compose(index);
        self.writer.write(&composed)?;
        Ok(())
    }

    fn render_frame(&mut self, frame: Frame) -> Result<(), Box<dyn std::error::Error>> {
        let start = Instant::now();
        let index = frame.index();
        let upright = frame.oriented(self.config.orientation);
        self.geometry = PreviewGeometry::new(
            self.surface.bounds(),
            upright.width() as f64,
            upright.height() as f64,
            self.config.gravity,
        );
        self.surface
            .set_background(upright, self.geometry.content_rect());
        let composed = self.surface.compose(index);
        self.logger
            .timing(STAGE_COMPOSE, start.elapsed().as_secs_f64() * 1000.0);

        let start = Instant::now();
        self.writer.write(&composed)?;
        self.logger
            .timing(STAGE_WRITE, start.elapsed().as_secs_f64() * 1000.0);

        self.last_index = Some(index);
        self.report.frames_rendered += 1;
        self.logger.progress(self.report.frames_rendered, self.total);
        Ok(())
    }

    /// Returns whether the overlays on the surface changed.
    fn apply(&mut self, completion: DetectionCompletion) -> bool {
        self.logger
            .timing(STAGE_DETECT, completion.elapsed.as_secs_f64() * 1000.0);

        let observations = match completion.outcome {
            Ok(o) => o,
            Err(e) => {
                log::warn!("Detection {} failed: {e}", completion.sequence);
                self.report.failures += 1;
                return false;
            }
        };
        let shapes = build_live_overlays(
            &observations,
            &self.geometry,
            self.config.face_style,
            self.config.landmark_style,
        );
        match self
            .controller
            .present(&mut self.surface, completion.sequence, shapes)
        {
            PresentOutcome::Applied { added, .. } => {
                self.report.generations_applied += 1;
                self.logger.metric(METRIC_FACES, observations.len() as f64);
                self.logger.metric(METRIC_SHAPES, added as f64);
                true
            }
            PresentOutcome::DroppedStale => {
                self.report.stale_dropped += 1;
                self.logger
                    .metric(METRIC_STALE_DROPPED, self.report.stale_dropped as f64);
                false
            }
        }
    }
}
