//! Photo face detection: compress a photo, find faces with a pluggable
//! detector, outline them on a copy of the image and summarise the run.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "rustface")]
//! # fn main() {
//! use facedetection::{FacePipeline, JpegCompressor, RustfaceDetector};
//!
//! let detector = RustfaceDetector::new("seeta_fd_frontal_v1.0.bin").min_face_size(40);
//! let pipeline = FacePipeline::new(Box::new(detector))
//!     .compressor(Box::new(JpegCompressor::new("/tmp/facedetection").ignore_by(100)));
//! pipeline.initialize().unwrap();
//!
//! let outcome = pipeline.run("photo.jpg".as_ref()).unwrap();
//! outcome.save_annotated("photo_faces.png".as_ref()).unwrap();
//! print!("{}", outcome.report);
//! # }
//! # #[cfg(not(feature = "rustface"))]
//! # fn main() {}
//! ```
//!
//! The example needs the `rustface` feature; any other engine can be used
//! by implementing [`FaceDetector`].
#![warn(missing_docs)]

mod annotate;
mod compress;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
/// Pipeline orchestration and cancellation.
pub mod pipeline;
mod report;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;
mod session;
mod size;
mod source;

/// Rectangle drawing and the default outline colour.
pub use annotate::{annotate, DEFAULT_RECT_COLOR};
/// Compression backends.
pub use compress::{
    default_filter, sample_size, CompressFilter, CompressOutcome, Compressor, JpegCompressor,
    PassThroughCompressor,
};
/// Error type, stage attribution and the boxed collaborator error.
pub use error::{BoxError, FaceDetectionError, Stage};
/// Face detection trait and result types.
pub use face_detector::{DetectionResult, FaceDetector, FaceRect};
/// Pipeline entry points.
pub use pipeline::{CancelToken, DetectionOutcome, FacePipeline};
/// Per-run summary.
pub use report::DetectionReport;
#[cfg(feature = "rustface")]
/// Built-in detector that loads a SeetaFace model file.
pub use rustface_backend::RustfaceDetector;
/// Background runs with supersede semantics.
pub use session::{DetectionSession, RunHandle};
/// File size formatting.
pub use size::{file_size_label, format_size};
/// Image selection collaborators.
pub use source::{ImageSource, PathSource, SourceKind};
