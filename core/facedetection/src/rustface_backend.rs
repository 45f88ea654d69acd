use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::BoxError;
use crate::face_detector::{DetectionResult, FaceDetector, FaceRect};

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model file is read by [`FaceDetector::init`], once; later calls are
/// no-ops. Detection before a successful init is an error.
pub struct RustfaceDetector {
    model_path: PathBuf,
    model: OnceLock<rustface::Model>,
    min_face_size: u32,
    score_thresh: f64,
    pyramid_scale_factor: f32,
    slide_window_step: (u32, u32),
}

impl RustfaceDetector {
    /// Create a detector that will load the SeetaFace model at `model_path`.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            model: OnceLock::new(),
            min_face_size: 20,
            score_thresh: 2.0,
            pyramid_scale_factor: 0.8,
            slide_window_step: (4, 4),
        }
    }

    /// Smallest face edge in pixels that will be reported (default: 20).
    pub fn min_face_size(mut self, size: u32) -> Self {
        self.min_face_size = size;
        self
    }

    /// Minimum classifier score (default: 2.0).
    pub fn score_thresh(mut self, thresh: f64) -> Self {
        self.score_thresh = thresh;
        self
    }

    /// Image pyramid down-scaling factor (default: 0.8).
    pub fn pyramid_scale_factor(mut self, factor: f32) -> Self {
        self.pyramid_scale_factor = factor;
        self
    }

    /// Sliding window step in pixels (default: 4×4).
    pub fn slide_window_step(mut self, x: u32, y: u32) -> Self {
        self.slide_window_step = (x, y);
        self
    }

    /// Path the model is loaded from.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl FaceDetector for RustfaceDetector {
    fn init(&self) -> Result<(), BoxError> {
        if self.model.get().is_some() {
            return Ok(());
        }
        let file = File::open(&self.model_path)
            .map_err(|e| format!("{}: {e}", self.model_path.display()))?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|e| format!("{}: {e}", self.model_path.display()))?;
        // A concurrent init may have won; either model is identical.
        let _ = self.model.set(model);
        log::debug!("loaded SeetaFace model from {}", self.model_path.display());
        Ok(())
    }

    fn detect(
        &self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<DetectionResult>, BoxError> {
        let model = self
            .model
            .get()
            .ok_or("SeetaFace model not loaded, call init first")?;

        let mut detector = rustface::create_detector_with_model(model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(self.score_thresh);
        detector.set_pyramid_scale_factor(self.pyramid_scale_factor);
        detector.set_slide_window_step(self.slide_window_step.0, self.slide_window_step.1);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                DetectionResult::new(
                    FaceRect::new(bbox.x(), bbox.y(), bbox.width(), bbox.height()),
                    face.score(),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_fails_for_missing_model() {
        let detector = RustfaceDetector::new("/no/such/seeta_fd_frontal_v1.0.bin");
        let err = detector.init().unwrap_err();
        assert!(err.to_string().contains("seeta_fd_frontal_v1.0.bin"));
    }

    #[test]
    fn detect_requires_init() {
        let detector = RustfaceDetector::new("model.bin").min_face_size(40);
        assert!(detector.detect(&[0; 16], 4, 4).is_err());
    }
}
