//! Detect faces in a photo, draw their boxes and print a summary.
//!
//! Usage:
//!   facedetect photo.jpg --model seeta_fd_frontal_v1.0.bin
//!   facedetect photo.jpg --model model.bin -o faces.png --json

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use facedetection::{
    FaceDetectionError, FacePipeline, JpegCompressor, PathSource, RustfaceDetector, SourceKind,
};

#[derive(Parser, Debug)]
#[command(name = "facedetect")]
#[command(version, about = "Compress a photo, detect faces and outline them", long_about = None)]
struct Args {
    /// Input image file
    #[arg(required = true)]
    image: PathBuf,

    /// SeetaFace detector model
    #[arg(long, default_value = "seeta_fd_frontal_v1.0.bin")]
    model: PathBuf,

    /// Where to write the annotated image (format from extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for compressed copies (default: system temp dir)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Leave files up to this many KiB uncompressed
    #[arg(long, default_value = "100")]
    ignore_by: u64,

    /// JPEG quality for compressed copies (1-100)
    #[arg(long, default_value = "60")]
    quality: u8,

    /// Minimum face size for detection
    #[arg(long, default_value = "20")]
    min_face_size: u32,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.stage() {
                Some(stage) => eprintln!("Error ({stage} stage): {e}"),
                None => eprintln!("Error: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), FaceDetectionError> {
    let cache_dir = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("facedetection"));
    let detector = RustfaceDetector::new(&args.model).min_face_size(args.min_face_size);
    let pipeline = FacePipeline::new(Box::new(detector)).compressor(Box::new(
        JpegCompressor::new(cache_dir)
            .ignore_by(args.ignore_by)
            .quality(args.quality),
    ));
    pipeline.initialize()?;

    let mut source = PathSource::new(&args.image);
    let Some(outcome) = pipeline.run_from(&mut source, SourceKind::Pick)? else {
        return Ok(());
    };

    if let Some(output) = &args.output {
        outcome.save_annotated(output)?;
        log::info!("annotated image written to {}", output.display());
    }

    if args.json {
        let json = serde_json::to_string_pretty(&outcome.report)
            .map_err(|e| FaceDetectionError::Encode(e.to_string()))?;
        println!("{json}");
    } else {
        print!("{}", outcome.report);
    }
    Ok(())
}
