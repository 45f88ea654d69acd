use std::fmt;

use thiserror::Error;

/// Boxed error returned by pluggable collaborators (detectors, compressors).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decoding the selected image.
    Load,
    /// Running the compressor.
    Compress,
    /// Initialising or running the face detector.
    Detect,
    /// Drawing rectangles and building the report.
    Annotate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Compress => "compress",
            Stage::Detect => "detect",
            Stage::Annotate => "annotate",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a pipeline run or one of its collaborators.
#[derive(Debug, Error)]
pub enum FaceDetectionError {
    /// The image could not be accessed.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Missing, unreadable or corrupt image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The compressor failed; carries its message.
    #[error("image compression failed: {0}")]
    Compression(String),

    /// The detector failed; carries its message.
    #[error("face detection failed: {0}")]
    Detection(String),

    /// The detector could not be set up, e.g. a missing model file.
    #[error("face detector initialisation failed: {0}")]
    DetectorInit(String),

    /// Writing the annotated image failed.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// JPEG quality outside `1..=100`.
    #[error("jpeg quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    /// The run was cancelled or superseded.
    #[error("run was cancelled")]
    Cancelled,

    /// Filesystem failure outside the decode path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FaceDetectionError {
    /// The pipeline stage this error terminated, if it is tied to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            FaceDetectionError::Decode(_) => Some(Stage::Load),
            FaceDetectionError::Compression(_) | FaceDetectionError::InvalidQuality(_) => {
                Some(Stage::Compress)
            }
            FaceDetectionError::Detection(_) | FaceDetectionError::DetectorInit(_) => {
                Some(Stage::Detect)
            }
            FaceDetectionError::Encode(_) => Some(Stage::Annotate),
            FaceDetectionError::PermissionDenied(_)
            | FaceDetectionError::Cancelled
            | FaceDetectionError::Io(_) => None,
        }
    }
}
