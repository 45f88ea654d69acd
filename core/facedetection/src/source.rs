use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::FaceDetectionError;

/// How the user wants to obtain the photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Choose an existing image.
    Pick,
    /// Take a new photo.
    Capture,
}

/// Supplies the image a pipeline run works on.
///
/// `Ok(None)` means the user backed out; no run is started in that case.
pub trait ImageSource {
    /// Let the user choose an existing image.
    fn pick_image(&mut self) -> Result<Option<PathBuf>, FaceDetectionError>;

    /// Let the user take a photo.
    fn capture_photo(&mut self) -> Result<Option<PathBuf>, FaceDetectionError>;

    /// Dispatch on `kind`.
    fn acquire(&mut self, kind: SourceKind) -> Result<Option<PathBuf>, FaceDetectionError> {
        match kind {
            SourceKind::Pick => self.pick_image(),
            SourceKind::Capture => self.capture_photo(),
        }
    }
}

/// Source backed by a path chosen outside the process (e.g. a CLI argument).
///
/// There is no camera, so [`ImageSource::capture_photo`] always yields `None`.
#[derive(Debug, Clone)]
pub struct PathSource {
    path: PathBuf,
}

impl PathSource {
    /// Wrap an already selected path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for PathSource {
    fn pick_image(&mut self) -> Result<Option<PathBuf>, FaceDetectionError> {
        match std::fs::File::open(&self.path) {
            Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(
                FaceDetectionError::PermissionDenied(format!("{}: {e}", self.path.display())),
            ),
            // Anything else is reported by the load stage.
            _ => Ok(Some(self.path.clone())),
        }
    }

    fn capture_photo(&mut self) -> Result<Option<PathBuf>, FaceDetectionError> {
        Ok(None)
    }
}
