//! End-to-end run: load → compress → detect → annotate & report.
//!
//! ```no_run
//! use facedetection::{BoxError, DetectionResult, FaceDetector, FacePipeline, JpegCompressor};
//!
//! struct NoFaces;
//! impl FaceDetector for NoFaces {
//!     fn detect(&self, _gray: &[u8], _w: u32, _h: u32) -> Result<Vec<DetectionResult>, BoxError> {
//!         Ok(vec![])
//!     }
//! }
//!
//! let pipeline = FacePipeline::new(Box::new(NoFaces))
//!     .compressor(Box::new(JpegCompressor::new("/tmp/facedetection")));
//! let outcome = pipeline.run("photo.jpg".as_ref()).unwrap();
//! print!("{}", outcome.report);
//! ```
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use image::{ImageReader, Rgba, RgbaImage};

use crate::annotate::{annotate, DEFAULT_RECT_COLOR};
use crate::compress::{CompressOutcome, Compressor, JpegCompressor};
use crate::error::FaceDetectionError;
use crate::face_detector::FaceDetector;
use crate::report::DetectionReport;
use crate::size::file_size_label;
use crate::source::{ImageSource, SourceKind};

/// Cooperative cancellation flag checked between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The run stops at its next stage boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), FaceDetectionError> {
        if self.is_cancelled() {
            Err(FaceDetectionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    /// Path the run started from.
    pub source: PathBuf,
    /// What the compressor did; its path is the analysed file.
    pub compressed: CompressOutcome,
    /// Decoded analysed image, never modified.
    pub original: RgbaImage,
    /// Copy of `original` with face rectangles drawn on it.
    pub annotated: RgbaImage,
    /// Statistics summary.
    pub report: DetectionReport,
}

impl DetectionOutcome {
    /// Write the annotated image; the format follows the file extension.
    pub fn save_annotated(&self, path: &Path) -> Result<(), FaceDetectionError> {
        self.annotated
            .save(path)
            .map_err(|e| FaceDetectionError::Encode(format!("{}: {e}", path.display())))
    }
}

/// Face detection pipeline over pluggable detector and compressor backends.
pub struct FacePipeline {
    detector: Box<dyn FaceDetector>,
    compressor: Box<dyn Compressor>,
    rect_color: Rgba<u8>,
    init: OnceLock<Result<(), String>>,
}

impl FacePipeline {
    /// Create a pipeline around `detector`.
    ///
    /// Compression defaults to a [`JpegCompressor`] writing into a
    /// `facedetection` folder under the system temp directory.
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self {
            detector,
            compressor: Box::new(JpegCompressor::new(
                std::env::temp_dir().join("facedetection"),
            )),
            rect_color: DEFAULT_RECT_COLOR,
            init: OnceLock::new(),
        }
    }

    /// Replace the compressor.
    pub fn compressor(mut self, compressor: Box<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    /// Set the rectangle outline colour (default: opaque red).
    pub fn rect_color(mut self, color: Rgba<u8>) -> Self {
        self.rect_color = color;
        self
    }

    /// Initialise the detector.
    ///
    /// Only the first call reaches [`FaceDetector::init`]; its outcome is
    /// remembered and returned by every later call, so a failed init keeps
    /// failing every run with [`FaceDetectionError::DetectorInit`].
    pub fn initialize(&self) -> Result<(), FaceDetectionError> {
        self.init
            .get_or_init(|| {
                let result = self.detector.init().map_err(|e| e.to_string());
                match &result {
                    Ok(()) => log::debug!("face detector initialised"),
                    Err(e) => log::warn!("face detector initialisation failed: {e}"),
                }
                result
            })
            .clone()
            .map_err(FaceDetectionError::DetectorInit)
    }

    /// Run the pipeline on the image at `path`.
    pub fn run(&self, path: &Path) -> Result<DetectionOutcome, FaceDetectionError> {
        self.run_with_cancel(path, &CancelToken::new())
    }

    /// Obtain an image from `source` and run on it.
    ///
    /// Returns `Ok(None)` without running anything when the user cancels
    /// the selection.
    pub fn run_from(
        &self,
        source: &mut dyn ImageSource,
        kind: SourceKind,
    ) -> Result<Option<DetectionOutcome>, FaceDetectionError> {
        match source.acquire(kind)? {
            Some(path) => self.run(&path).map(Some),
            None => {
                log::debug!("image selection cancelled, nothing to run");
                Ok(None)
            }
        }
    }

    /// Run the pipeline, stopping at the next stage boundary once `cancel` fires.
    pub fn run_with_cancel(
        &self,
        path: &Path,
        cancel: &CancelToken,
    ) -> Result<DetectionOutcome, FaceDetectionError> {
        self.initialize()?;
        cancel.check()?;

        let loaded = load_image(path)?;
        log::debug!(
            "loaded {} ({}x{})",
            path.display(),
            loaded.width(),
            loaded.height()
        );
        cancel.check()?;

        let compressed = self
            .compressor
            .compress(path)
            .map_err(|e| FaceDetectionError::Compression(e.to_string()))?;
        let original = match &compressed {
            CompressOutcome::Compressed(out) => load_image(out).map_err(|e| match e {
                FaceDetectionError::Decode(cause) => {
                    FaceDetectionError::Compression(format!("unreadable output {cause}"))
                }
                other => other,
            })?,
            CompressOutcome::PassThrough(_) => loaded,
        };
        cancel.check()?;

        let gray = image::imageops::grayscale(&original);
        let started = Instant::now();
        let faces = self
            .detector
            .detect(gray.as_raw(), gray.width(), gray.height())
            .map_err(|e| FaceDetectionError::Detection(e.to_string()))?;
        let detect_time_ms = started.elapsed().as_millis() as u64;
        log::debug!("detected {} face(s) in {detect_time_ms}ms", faces.len());
        cancel.check()?;

        let mut annotated = original.clone();
        annotate(&mut annotated, &faces, self.rect_color);
        let report = DetectionReport::new(
            original.width(),
            original.height(),
            file_size_label(compressed.path()),
            faces,
            detect_time_ms,
        );
        log::info!(
            "{}: {} face(s), {}x{} {}",
            compressed.path().display(),
            report.face_count(),
            report.width(),
            report.height(),
            report.file_size()
        );

        Ok(DetectionOutcome {
            source: path.to_path_buf(),
            compressed,
            original,
            annotated,
            report,
        })
    }
}

fn load_image(path: &Path) -> Result<RgbaImage, FaceDetectionError> {
    let reader = ImageReader::open(path).map_err(|e| {
        if e.kind() == ErrorKind::PermissionDenied {
            FaceDetectionError::PermissionDenied(format!("{}: {e}", path.display()))
        } else {
            decode_error(path, e)
        }
    })?;
    let image = reader
        .with_guessed_format()
        .map_err(|e| decode_error(path, e))?
        .decode()
        .map_err(|e| decode_error(path, e))?;
    Ok(image.to_rgba8())
}

fn decode_error(path: &Path, cause: impl std::fmt::Display) -> FaceDetectionError {
    FaceDetectionError::Decode(format!("{}: {cause}", path.display()))
}
