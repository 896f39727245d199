//! Virtual Touch - Main Entry Point

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;

use virtual_touch::camera::{CaptureSource, ImageDirectory};
use virtual_touch::detection::{DetectionBridge, DetectionWorker, LandmarkModel, ResultHandler, ScriptedModel};
use virtual_touch::pointer::{LogSink, PointerSink};
use virtual_touch::render::{FrameDumper, HeadlessRender, RenderSink};
use virtual_touch::telemetry::init_logging;
use virtual_touch::{AppConfig, SnapshotStore, VirtualTouchApp};

#[derive(Parser, Debug)]
#[command(name = "virtual-touch", version, about = "Control the pointer with hand gestures")]
struct Args {
    /// Config file (default: <config dir>/virtual-touch/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera index
    #[arg(long)]
    camera: Option<u32>,

    /// Log pointer commands instead of moving the real pointer
    #[arg(long)]
    dry_run: bool,

    /// Read frames from an image directory instead of the camera
    #[arg(long, value_name = "DIR")]
    replay: Option<PathBuf>,

    /// Replay landmark results from a JSON-lines file instead of running a model
    #[arg(long, value_name = "FILE")]
    landmarks: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Write overlaid preview frames as PNG
    #[arg(long, value_name = "DIR")]
    dump_frames: Option<PathBuf>,

    /// Only dump every Nth frame
    #[arg(long, default_value_t = 1)]
    dump_every: u64,

    /// JSON console logs
    #[arg(long)]
    log_json: bool,

    /// Also log to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// List cameras and exit
    #[cfg(feature = "camera")]
    #[arg(long)]
    list_cameras: bool,
}

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::load_or_default().context("loading default config")?,
    };

    if let Some(index) = args.camera {
        config.camera.index = index;
    }
    if args.log_json {
        config.logging.json_format = true;
    }
    if let Some(path) = &args.log_file {
        config.logging.file_enabled = true;
        config.logging.file_path = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

fn create_sink(args: &Args) -> anyhow::Result<Box<dyn PointerSink + Send>> {
    if args.dry_run {
        log::info!("Dry run: pointer commands are logged only");
        return Ok(Box::new(LogSink::new(None)));
    }

    #[cfg(feature = "enigo")]
    {
        let sink = virtual_touch::pointer::EnigoSink::spawn().context("initializing pointer control")?;
        Ok(Box::new(sink))
    }

    #[cfg(not(feature = "enigo"))]
    {
        log::warn!("Built without the `enigo` feature; pointer commands are logged only");
        Ok(Box::new(LogSink::new(None)))
    }
}

fn create_source(args: &Args, config: &AppConfig) -> anyhow::Result<Box<dyn CaptureSource>> {
    let (width, height) = (config.camera.width, config.camera.height);

    if let Some(dir) = &args.replay {
        let source = ImageDirectory::open(dir, width, height)
            .with_context(|| format!("opening replay directory {}", dir.display()))?;
        return Ok(Box::new(source));
    }

    #[cfg(feature = "camera")]
    {
        let camera = virtual_touch::camera::DeviceCamera::open(
            config.camera.index,
            width,
            height,
            config.camera.fps,
        )?;
        Ok(Box::new(camera))
    }

    #[cfg(not(feature = "camera"))]
    {
        bail!("no frame source: pass --replay <dir> or build with the `camera` feature")
    }
}

fn create_model(args: &Args, config: &AppConfig) -> anyhow::Result<Box<dyn LandmarkModel>> {
    if let Some(path) = &args.landmarks {
        return Ok(Box::new(ScriptedModel::from_file(path)?));
    }

    #[cfg(feature = "onnx")]
    {
        let model = virtual_touch::detection::OnnxHandLandmarker::load(
            config.detection.model_path.as_deref(),
            config.detection.min_confidence,
        )?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = config;
        bail!("no landmark model: pass --landmarks <file> or build with the `onnx` feature")
    }
}

/// Pressing Enter on the terminal stops the loop
fn watch_stdin(stop: Arc<AtomicBool>) {
    let spawned = std::thread::Builder::new()
        .name("stdin-watch".to_string())
        .spawn(move || {
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_ok() {
                stop.store(true, Ordering::Relaxed);
            }
        });
    if let Err(e) = spawned {
        log::warn!("Could not watch stdin for quit: {}", e);
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // Keep the guard alive so file logs are flushed on exit
    let _log_guard = init_logging(&config.logging).map_err(|e| anyhow::anyhow!("initializing logging: {}", e))?;

    #[cfg(feature = "camera")]
    {
        if args.list_cameras {
            for (index, name) in virtual_touch::camera::device::list_cameras().iter().enumerate() {
                println!("{:<5} {}", index, name);
            }
            return Ok(());
        }
    }

    let sink = create_sink(&args)?;
    let screen = config.resolve_screen(sink.screen_size());
    log::info!("Mapping camera {}x{} onto screen {}", config.camera.width, config.camera.height, screen);

    if !config.screen_mapper(screen).is_valid() {
        bail!("camera region inside the margin is empty");
    }
    let mapper = config.gesture_mapper(screen);

    let source = create_source(&args, &config)?;
    let model = create_model(&args, &config)?;
    log::info!("Landmark model: {}", model.name());

    let snapshot = SnapshotStore::new();
    let handler = ResultHandler::new(mapper, sink, snapshot.clone());
    let stats = handler.stats();
    let worker = DetectionWorker::spawn(model, config.detection.queue_depth, handler.into_callback())?;
    let bridge = DetectionBridge::new(worker, stats);

    let mut render: Vec<Box<dyn RenderSink>> = vec![Box::new(HeadlessRender::new(Duration::from_secs(5)))];
    if let Some(dir) = &args.dump_frames {
        render.push(Box::new(FrameDumper::new(dir, args.dump_every)?));
    }

    let mut app = VirtualTouchApp::new(source, bridge, snapshot, render)
        .with_mirror(config.camera.mirror)
        .with_max_frames(args.max_frames)
        .with_timings_report(config.timings_report.clone());

    let stop = Arc::new(AtomicBool::new(false));
    watch_stdin(stop.clone());
    log::info!("Running. Press Enter to quit.");

    let frames = app.run(&stop);
    app.shutdown();
    log::info!("Processed {} frames", frames);

    Ok(())
}
