uniffi::setup_scaffolding!();

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use facedetection::{DetectionOutcome, DetectionSession, FacePipeline, JpegCompressor};

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FaceDetectionError {
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },
    #[error("failed to decode image: {message}")]
    DecodeError { message: String },
    #[error("image compression failed: {message}")]
    CompressionError { message: String },
    #[error("face detection failed: {message}")]
    DetectionError { message: String },
    #[error("face detector initialisation failed: {message}")]
    DetectorInitError { message: String },
    #[error("failed to encode image: {message}")]
    EncodeError { message: String },
    #[error("run was cancelled")]
    Cancelled,
    #[error("I/O error: {message}")]
    IoError { message: String },
}

impl From<facedetection::FaceDetectionError> for FaceDetectionError {
    fn from(e: facedetection::FaceDetectionError) -> Self {
        use facedetection::FaceDetectionError as Core;
        match e {
            Core::PermissionDenied(message) => FaceDetectionError::PermissionDenied { message },
            Core::Decode(message) => FaceDetectionError::DecodeError { message },
            Core::Compression(message) => FaceDetectionError::CompressionError { message },
            Core::InvalidQuality(q) => FaceDetectionError::CompressionError {
                message: format!("invalid quality {q}"),
            },
            Core::Detection(message) => FaceDetectionError::DetectionError { message },
            Core::DetectorInit(message) => FaceDetectionError::DetectorInitError { message },
            Core::Encode(message) => FaceDetectionError::EncodeError { message },
            Core::Cancelled => FaceDetectionError::Cancelled,
            Core::Io(e) => FaceDetectionError::IoError {
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, uniffi::Record)]
pub struct Face {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
    pub angle: Option<i32>,
}

impl From<&facedetection::DetectionResult> for Face {
    fn from(result: &facedetection::DetectionResult) -> Self {
        Face {
            x: result.rect.x,
            y: result.rect.y,
            width: result.rect.width,
            height: result.rect.height,
            confidence: result.confidence,
            angle: result.angle,
        }
    }
}

#[derive(Debug, uniffi::Record)]
pub struct FaceReport {
    pub width: u32,
    pub height: u32,
    pub file_size: String,
    pub faces: Vec<Face>,
    pub detect_time_ms: u64,
    /// Multi-line summary ready for a text view.
    pub text: String,
    /// Annotated image encoded as PNG.
    pub annotated_png: Vec<u8>,
    /// File that was analysed (the compressed copy, or the input itself).
    pub analysed_path: String,
}

/// Human-readable size of a byte count, e.g. `"1.50KB"`.
#[uniffi::export]
pub fn format_file_size(bytes: u64) -> String {
    facedetection::format_size(bytes)
}

/// Size label of a file; `""` for directories and `"0BT"` for missing paths.
#[uniffi::export]
pub fn file_size_label(path: String) -> String {
    facedetection::file_size_label(Path::new(&path))
}

/// Long-lived detector handle for the app.
///
/// The SeetaFace model is loaded once by [`FaceDetectionEngine::initialize`].
/// Each [`FaceDetectionEngine::detect`] call supersedes the one still in
/// flight, which then fails with `Cancelled`.
#[derive(uniffi::Object)]
pub struct FaceDetectionEngine {
    session: DetectionSession,
}

#[uniffi::export]
impl FaceDetectionEngine {
    /// Load the model at `model_path`; compressed copies go to `cache_dir`.
    #[uniffi::constructor]
    pub fn initialize(
        model_path: String,
        cache_dir: String,
    ) -> Result<Arc<Self>, FaceDetectionError> {
        let detector = facedetection::RustfaceDetector::new(model_path);
        let pipeline = FacePipeline::new(Box::new(detector))
            .compressor(Box::new(JpegCompressor::new(cache_dir)));
        pipeline.initialize()?;
        Ok(Arc::new(Self {
            session: DetectionSession::new(Arc::new(pipeline)),
        }))
    }

    /// Run detection on `image_path`, blocking until it finishes.
    pub fn detect(&self, image_path: String) -> Result<FaceReport, FaceDetectionError> {
        let outcome = self.session.submit(image_path)?.wait()?;
        face_report(outcome)
    }

    /// Cancel the run in flight, if any.
    pub fn cancel_current(&self) {
        self.session.cancel_current();
    }
}

/// One-shot variant of [`FaceDetectionEngine`]: loads the model, runs once.
#[uniffi::export]
pub fn detect_faces(
    image_path: String,
    model_path: String,
    cache_dir: String,
) -> Result<FaceReport, FaceDetectionError> {
    FaceDetectionEngine::initialize(model_path, cache_dir)?.detect(image_path)
}

fn face_report(outcome: DetectionOutcome) -> Result<FaceReport, FaceDetectionError> {
    let mut annotated_png = Vec::new();
    outcome
        .annotated
        .write_to(&mut Cursor::new(&mut annotated_png), image::ImageFormat::Png)
        .map_err(|e| FaceDetectionError::EncodeError {
            message: e.to_string(),
        })?;

    let report = &outcome.report;
    Ok(FaceReport {
        width: report.width(),
        height: report.height(),
        file_size: report.file_size().to_string(),
        faces: report.faces().iter().map(Face::from).collect(),
        detect_time_ms: report.detect_time_ms(),
        text: report.render(),
        annotated_png,
        analysed_path: outcome.compressed.path().to_string_lossy().into_owned(),
    })
}
