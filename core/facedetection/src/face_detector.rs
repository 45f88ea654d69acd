use serde::{Deserialize, Serialize};

use crate::error::BoxError;

/// Axis-aligned face rectangle in pixel coordinates (origin top-left).
///
/// Detectors may report rectangles that start at negative coordinates or run
/// past the image edge; consumers decide how to treat those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRect {
    /// X coordinate of the top-left corner.
    pub x: i32,
    /// Y coordinate of the top-left corner.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FaceRect {
    /// Build a rectangle from its top-left corner and size.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom-right corner `(x + width, y + height)`.
    pub fn end(&self) -> (i64, i64) {
        (
            self.x as i64 + self.width as i64,
            self.y as i64 + self.height as i64,
        )
    }
}

/// A single detected face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Bounding box of the face.
    pub rect: FaceRect,
    /// Detector score. Not normalised: SeetaFace scores are unbounded.
    pub confidence: f64,
    /// In-plane rotation in degrees, for backends that estimate it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<i32>,
}

impl DetectionResult {
    /// Pair a rectangle with its score.
    pub const fn new(rect: FaceRect, confidence: f64) -> Self {
        Self {
            rect,
            confidence,
            angle: None,
        }
    }

    /// Attach the face's rotation.
    pub fn with_angle(mut self, degrees: i32) -> Self {
        self.angle = Some(degrees);
        self
    }
}

/// Pluggable face detection backend.
///
/// Implement this trait to plug in any detection engine (SeetaFace, ONNX,
/// OpenCV, a platform service) and pass it to [`crate::FacePipeline::new`].
pub trait FaceDetector: Send + Sync {
    /// One-time setup such as loading model files.
    ///
    /// Called by [`crate::FacePipeline::initialize`] at most once per pipeline.
    fn init(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    ///
    /// The returned order is preserved verbatim in the report.
    fn detect(&self, gray: &[u8], width: u32, height: u32)
        -> Result<Vec<DetectionResult>, BoxError>;
}
