mod settings;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use faceoverlay_core::detection::domain::face_detector::FaceDetector;
use faceoverlay_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use faceoverlay_core::mapping::domain::preview_geometry::VideoGravity;
use faceoverlay_core::overlay::domain::overlay_controller::StalePolicy;
use faceoverlay_core::pipeline::annotate_still_use_case::AnnotateStillUseCase;
use faceoverlay_core::pipeline::detection_worker::DetectionWorkerPool;
use faceoverlay_core::pipeline::live_feed_use_case::{LiveFeedConfig, LiveFeedUseCase};
use faceoverlay_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use faceoverlay_core::shared::constants::{YOLO_MODEL_NAME, YOLO_MODEL_URL};
use faceoverlay_core::shared::image_orientation::ImageOrientation;
use faceoverlay_core::shared::model_resolver;
use faceoverlay_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use faceoverlay_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use faceoverlay_core::video::infrastructure::image_file_reader::ImageFileReader;
use faceoverlay_core::video::infrastructure::image_file_writer::ImageFileWriter;

use settings::Settings;

/// Progress lines are logged every this many live frames.
const LIVE_PROGRESS_EVERY: usize = 30;

/// Draws face rectangles and landmark outlines over images and camera feeds.
#[derive(Parser)]
#[command(name = "faceoverlay", version)]
struct Cli {
    /// Settings file (default: <config dir>/FaceOverlay/settings.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory checked for the detector model before downloading it.
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Annotate a still image shown aspect-fit in a fixed display region.
    Still(StillArgs),
    /// Annotate a live capture source and record the preview.
    Live(LiveArgs),
}

#[derive(Args)]
struct StillArgs {
    /// Image path, or an asset name such as `iprofile`.
    input: String,

    /// Output image (PNG or JPEG) of the whole display region.
    output: PathBuf,

    /// Display region size as WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_size)]
    display: Option<(u32, u32)>,

    /// Directory searched for asset names.
    #[arg(long, default_value = "assets")]
    assets_dir: PathBuf,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,
}

#[derive(Args)]
struct LiveArgs {
    /// Video file, stream URL, or capture device (e.g. /dev/video0).
    input: PathBuf,

    /// Output video of the composed preview.
    output: PathBuf,

    /// ffmpeg input format for capture devices (v4l2, avfoundation, dshow).
    #[arg(long)]
    input_format: Option<String>,

    /// Orientation of captured frames relative to the preview
    /// (up, left-mirrored, ...).
    #[arg(long, default_value = "up")]
    orientation: String,

    /// Preview scaling: fill, fit or resize.
    #[arg(long)]
    gravity: Option<String>,

    /// Preview size as WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_size)]
    preview_size: Option<(u32, u32)>,

    /// Detection worker threads.
    #[arg(long)]
    workers: Option<usize>,

    /// Draw late detection results instead of dropping them.
    #[arg(long)]
    keep_stale: bool,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref());

    match &cli.command {
        Command::Still(args) => {
            validate_still(args)?;
            run_still(args, &settings, cli.models_dir.as_deref())
        }
        Command::Live(args) => {
            validate_live(args)?;
            run_live(args, &settings, cli.models_dir.as_deref())
        }
    }
}

fn run_still(
    args: &StillArgs,
    settings: &Settings,
    models_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let confidence = args.confidence.unwrap_or(settings.confidence);
    let mut detectors = build_detectors(1, confidence, models_dir)?;
    let detector = detectors.pop().ok_or("No detector was built")?;
    let display = args
        .display
        .unwrap_or((settings.display_width, settings.display_height));

    let mut use_case = AnnotateStillUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        detector,
        display,
        settings.face_style(),
        Box::new(StdoutPipelineLogger::new(1)),
    )?;
    let report = use_case.execute(&args.input, Some(&args.assets_dir), &args.output)?;

    if report.written {
        log::info!(
            "Drew {} face rectangle(s); output written to {}",
            report.shapes,
            args.output.display()
        );
    }
    Ok(())
}

fn run_live(
    args: &LiveArgs,
    settings: &Settings,
    models_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = live_config(args, settings)?;
    let workers = args.workers.unwrap_or(settings.workers);
    let confidence = args.confidence.unwrap_or(settings.confidence);

    let pool = DetectionWorkerPool::spawn(build_detectors(workers, confidence, models_dir)?)?;
    let reader = FfmpegReader::new().with_input_format(args.input_format.clone());

    let mut use_case = LiveFeedUseCase::new(
        Box::new(reader),
        Box::new(FfmpegWriter::new()),
        pool,
        config,
        Box::new(StdoutPipelineLogger::new(LIVE_PROGRESS_EVERY)),
    );
    let report = use_case.execute(&args.input, &args.output)?;

    if report.started {
        log::info!(
            "Rendered {} frame(s), {} overlay generation(s); output written to {}",
            report.frames_rendered,
            report.generations_applied,
            args.output.display()
        );
    }
    Ok(())
}

fn live_config(
    args: &LiveArgs,
    settings: &Settings,
) -> Result<LiveFeedConfig, Box<dyn std::error::Error>> {
    let orientation = ImageOrientation::parse(&args.orientation)
        .ok_or_else(|| format!("Unknown orientation '{}'", args.orientation))?;
    let gravity = match args.gravity.as_deref() {
        Some(name) => {
            VideoGravity::parse(name).ok_or_else(|| format!("Unknown gravity '{name}'"))?
        }
        None => settings.gravity.into(),
    };
    let stale_policy = if args.keep_stale {
        StalePolicy::ApplyAll
    } else {
        settings.stale.into()
    };

    Ok(LiveFeedConfig {
        orientation,
        gravity,
        preview_size: args
            .preview_size
            .unwrap_or((settings.display_width, settings.display_height)),
        stale_policy,
        face_style: settings.face_style(),
        landmark_style: settings.landmark_style(),
        max_frames: args.max_frames,
    })
}

/// One detector per worker; each owns its own inference session.
fn build_detectors(
    count: usize,
    confidence: f64,
    models_dir: Option<&Path>,
) -> Result<Vec<Box<dyn FaceDetector>>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        models_dir,
        Some(Box::new(download_progress)),
    )?;

    let mut detectors: Vec<Box<dyn FaceDetector>> = Vec::with_capacity(count);
    for _ in 0..count {
        detectors.push(Box::new(OnnxYoloDetector::new(&model_path, confidence)?));
    }
    Ok(detectors)
}

fn validate_still(args: &StillArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate_confidence(args.confidence)?;
    if args.input.trim().is_empty() {
        return Err("Input must name an image or asset".into());
    }
    Ok(())
}

fn validate_live(args: &LiveArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate_confidence(args.confidence)?;
    if ImageOrientation::parse(&args.orientation).is_none() {
        return Err(format!(
            "Orientation must be one of: {}, got '{}'",
            orientation_names().join(", "),
            args.orientation
        )
        .into());
    }
    if let Some(g) = args.gravity.as_deref() {
        if VideoGravity::parse(g).is_none() {
            return Err(format!("Gravity must be one of: fill, fit, resize, got '{g}'").into());
        }
    }
    if args.workers == Some(0) {
        return Err("Workers must be at least 1".into());
    }
    if args.max_frames == Some(0) {
        return Err("Max frames must be at least 1".into());
    }
    Ok(())
}

fn validate_confidence(confidence: Option<f64>) -> Result<(), Box<dyn std::error::Error>> {
    match confidence {
        Some(c) if !(0.0..=1.0).contains(&c) => {
            Err(format!("Confidence must be between 0.0 and 1.0, got {c}").into())
        }
        _ => Ok(()),
    }
}

fn orientation_names() -> Vec<String> {
    ImageOrientation::ALL.iter().map(|o| o.to_string()).collect()
}

/// Parses `WIDTHxHEIGHT`, both positive.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid dimension '{v}' in '{s}'"))
    };
    Ok((parse(w)?, parse(h)?))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
