use anyhow::{bail, Context, Result};
use clap::Parser;
use snapbits_fx::assets::{AssetStore, FsAssetLoader};
use snapbits_fx::capture::{spawn_capture, FrameSlot, StillImageSource};
use snapbits_fx::config::PipelineConfig;
use snapbits_fx::control::Controller;
use snapbits_fx::output::{OutputSink, PngSequenceOutput};
use snapbits_fx::perception;
use snapbits_fx::registry::{BackgroundTable, FilterRegistry};
use snapbits_fx::runner::{run_pipeline, LoopOptions};
use snapbits_fx::selection::{Selection, SelectionState};
use snapbits_fx::ui::SelectorStrip;
use snapbits_fx::{CompositeSettings, Pipeline};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index (requires the `camera` feature)
    #[arg(short, long)]
    input_device: Option<u32>,

    /// Still images to use as input frames instead of a webcam
    #[arg(long, num_args = 1.., conflicts_with = "input_device")]
    images: Vec<PathBuf>,

    /// Stop after the last still image instead of looping
    #[arg(long)]
    once: bool,

    /// Output v4l2loopback device path (requires the `camera` feature)
    #[arg(short, long)]
    output_device: Option<String>,

    /// Directory receiving numbered PNG frames
    #[arg(long, conflicts_with = "output_device")]
    output_dir: Option<PathBuf>,

    /// Capture resolution width
    #[arg(long, default_value_t = 1280)]
    capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 720)]
    capture_height: u32,

    /// Output resolution width
    #[arg(long, default_value_t = 1280)]
    output_width: u32,

    /// Output resolution height
    #[arg(long, default_value_t = 720)]
    output_height: u32,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Mirror input frames horizontally (selfie view)
    #[arg(long)]
    mirror: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Directory holding the filter PNGs
    #[arg(long, default_value = "assets/filters")]
    assets: PathBuf,

    /// JSON file replacing the built-in filter and background tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recorded perception results (one JSON object per line)
    /// If not provided, frames pass through without landmarks
    #[arg(long)]
    perception: Option<String>,

    /// Initially selected filter
    #[arg(long)]
    filter: Option<String>,

    /// Initially selected background
    #[arg(long)]
    background: Option<String>,

    /// Draw the filter selector strip on output frames
    #[arg(long)]
    show_selector: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("SnapBits FX starting");
    tracing::info!("Capture: {}x{}", args.capture_width, args.capture_height);
    tracing::info!("Output: {}x{}", args.output_width, args.output_height);
    tracing::info!("Target FPS: {}", args.fps);

    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    // Filters with missing assets are left out, not fatal
    let mut store = AssetStore::new(FsAssetLoader::new(&args.assets));
    let registry = FilterRegistry::load(&config.filters, &mut store);
    let backgrounds = BackgroundTable::new(&config.backgrounds);
    tracing::info!(
        "{} of {} filters available: {}",
        registry.len(),
        config.filters.len(),
        registry.names().join(", ")
    );

    let selection = SelectionState::new(Selection::default());
    let controller = Controller::new(selection.clone(), &registry, &backgrounds);
    if let Err(e) = controller.select_filter(args.filter.as_deref()) {
        tracing::warn!("{}", e);
    }
    if let Err(e) = controller.select_background(args.background.as_deref()) {
        tracing::warn!("{}", e);
    }

    let selector = args.show_selector.then(|| SelectorStrip::new(&registry));
    let pipeline = Pipeline::new(
        registry,
        backgrounds,
        selection,
        CompositeSettings::from(&config),
    );

    let mut perception = perception::create_provider(args.perception.as_deref())
        .context("Failed to initialize perception")?;
    if args.perception.is_none() {
        tracing::info!("Running in passthrough mode (no perception)");
    }

    let mut output = open_output(&args)?;

    let stop = Arc::new(AtomicBool::new(false));
    let slot = Arc::new(FrameSlot::new());
    let capture = start_capture(&args, slot.clone(), stop.clone())?;

    controller
        .spawn_stdin(stop.clone())
        .context("Failed to start control thread")?;
    tracing::info!("Type `filter <name>`, `background <name>`, `click <x> <y>`, `list` or `quit`");

    // Main loop
    let options = LoopOptions {
        target_fps: args.fps,
        max_frames: args.max_frames,
        selector,
    };
    let result = run_pipeline(
        &slot,
        perception.as_mut(),
        &pipeline,
        output.as_mut(),
        &stop,
        &options,
    );

    stop.store(true, std::sync::atomic::Ordering::Release);
    if capture.join().is_err() {
        tracing::warn!("Capture thread panicked");
    }

    let stats = result?;
    tracing::info!(
        "Processed {} frames, dropped {} stale captures",
        stats.frames,
        stats.dropped
    );
    Ok(())
}

fn start_capture(
    args: &Args,
    slot: Arc<FrameSlot>,
    stop: Arc<AtomicBool>,
) -> Result<std::thread::JoinHandle<()>> {
    let (width, height) = (args.capture_width, args.capture_height);

    if !args.images.is_empty() {
        let paths = args.images.clone();
        let (fps, looped) = (args.fps, !args.once);
        return spawn_capture(
            move || StillImageSource::open(&paths, width, height, fps, looped),
            slot,
            stop,
            args.mirror,
        )
        .context("Failed to start capture thread");
    }

    #[cfg(feature = "camera")]
    {
        let (device, fps) = (args.input_device.unwrap_or(0), args.fps);
        spawn_capture(
            move || snapbits_fx::capture::WebcamCapture::new(device, width, height, fps),
            slot,
            stop,
            args.mirror,
        )
        .context("Failed to start capture thread")
    }

    #[cfg(not(feature = "camera"))]
    {
        let _ = (slot, stop);
        bail!("No --images given and webcam capture requires the `camera` feature")
    }
}

fn open_output(args: &Args) -> Result<Box<dyn OutputSink>> {
    if let Some(dir) = &args.output_dir {
        let sink = PngSequenceOutput::new(dir, args.output_width, args.output_height)
            .context("Failed to initialize PNG output")?;
        return Ok(Box::new(sink));
    }

    match &args.output_device {
        #[cfg(feature = "camera")]
        Some(device) => {
            let sink = snapbits_fx::output::V4L2Output::new(
                device,
                args.output_width,
                args.output_height,
            )
            .context("Failed to initialize v4l2loopback output")?;
            Ok(Box::new(sink))
        }
        #[cfg(not(feature = "camera"))]
        Some(_) => bail!("v4l2loopback output requires the `camera` feature"),
        None => bail!("Choose an output with --output-dir or --output-device"),
    }
}
