use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use framesight_core::{
    render::draw_detections,
    runtime::configure_ort_dylib,
    Detector, OrtEngine, RgbFrame,
};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "framesight",
    version,
    about = "Object detection on still images via ONNX models",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a model's parsed metadata (input size, layout, classes).
    Info {
        /// ONNX model path
        #[arg(short, long)]
        model: PathBuf,
    },

    /// Detect objects in an image and print one line per box.
    Detect {
        /// Input image path
        #[arg(short, long)]
        image: PathBuf,

        /// ONNX model path
        #[arg(short, long)]
        model: PathBuf,

        /// Confidence threshold (candidates must score strictly above)
        #[arg(long, default_value_t = 0.3)]
        confidence: f32,

        /// IoU threshold for per-class suppression
        #[arg(long, default_value_t = 0.45)]
        iou: f32,

        /// Write an annotated copy of the image here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Respect RUST_LOG; default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { model } => cmd_info(model),
        Commands::Detect {
            image,
            model,
            confidence,
            iou,
            output,
        } => cmd_detect(image, model, confidence, iou, output),
    }
}

fn cmd_info(model: PathBuf) -> Result<()> {
    configure_ort_dylib();
    let engine = OrtEngine::load(&model)
        .with_context(|| format!("failed to load {}", model.display()))?;
    let detector = Detector::new(engine);

    let size = detector.input_size();
    println!("model      : {}", model.display());
    println!("input size : {}x{}", size.width, size.height);
    println!("layout     : {:?}", detector.variant());
    println!("version    : {}", detector.version().unwrap_or("(none)"));
    println!("classes    : {}", detector.names().len());

    let mut names: Vec<_> = detector.names().iter().collect();
    names.sort_by_key(|(id, _)| **id);
    for (id, name) in names {
        println!("  {id:>3}  {name}");
    }
    Ok(())
}

fn cmd_detect(
    image: PathBuf,
    model: PathBuf,
    confidence: f32,
    iou: f32,
    output: Option<PathBuf>,
) -> Result<()> {
    configure_ort_dylib();

    let pb = spinner("Loading model…");
    let engine = OrtEngine::load(&model)
        .with_context(|| format!("failed to load {}", model.display()))?;
    let mut detector = Detector::new(engine)
        .with_confidence_threshold(confidence)
        .with_iou_threshold(iou);
    pb.finish_and_clear();

    let img = image::open(&image)
        .with_context(|| format!("failed to open {}", image.display()))?
        .into_rgb8();
    let frame = RgbFrame::from_image(&img);
    info!(width = frame.width, height = frame.height, "image loaded");

    let pb = spinner("Detecting…");
    let detections = detector.detect(&frame)?;
    pb.finish_and_clear();

    for det in &detections {
        let label = detector.label(det.class_id).unwrap_or("?");
        println!(
            "{label:<16} {:.3}  x={} y={} w={} h={}",
            det.confidence, det.x, det.y, det.width, det.height
        );
    }
    info!(count = detections.len(), "done");

    if let Some(out) = output {
        let mut annotated = img;
        draw_detections(&mut annotated, &detections, [255, 0, 0]);
        annotated
            .save(&out)
            .with_context(|| format!("failed to save {}", out.display()))?;
        info!(path = %out.display(), "annotated image written");
    }

    Ok(())
}

fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .expect("valid spinner template"),
    );
    pb.set_message(msg);
    pb
}
