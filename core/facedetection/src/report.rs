use std::fmt;

use serde::{Deserialize, Serialize};

use crate::face_detector::DetectionResult;

/// Summary of one pipeline run.
///
/// Faces are kept in the order the detector produced them; the text
/// rendering lists them in that same order so repeated runs on the same
/// input give identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    width: u32,
    height: u32,
    file_size: String,
    faces: Vec<DetectionResult>,
    detect_time_ms: u64,
}

impl DetectionReport {
    /// Assemble a report. `faces` is stored as given.
    pub fn new(
        width: u32,
        height: u32,
        file_size: impl Into<String>,
        faces: Vec<DetectionResult>,
        detect_time_ms: u64,
    ) -> Self {
        Self {
            width,
            height,
            file_size: file_size.into(),
            faces,
            detect_time_ms,
        }
    }

    /// Width of the analysed image in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the analysed image in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Formatted size of the analysed file, see [`crate::file_size_label`].
    pub fn file_size(&self) -> &str {
        &self.file_size
    }

    /// Detected faces in detector order.
    pub fn faces(&self) -> &[DetectionResult] {
        &self.faces
    }

    /// Number of detected faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Wall-clock time spent inside the detector, in milliseconds.
    pub fn detect_time_ms(&self) -> u64 {
        self.detect_time_ms
    }

    /// Render the multi-line text block: image size, face count, one line
    /// per face, detection time.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DetectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "image size = {}x{} {}",
            self.width, self.height, self.file_size
        )?;
        writeln!(f, "face num = {}", self.faces.len())?;
        for face in &self.faces {
            writeln!(
                f,
                "confidence = {} x = {} y = {} width = {} height = {}",
                face.confidence, face.rect.x, face.rect.y, face.rect.width, face.rect.height
            )?;
        }
        writeln!(f, "detectTime = {}ms", self.detect_time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face_detector::FaceRect;

    #[test]
    fn render_keeps_detector_order() {
        let faces = vec![
            DetectionResult::new(FaceRect::new(10, 20, 30, 40), 0.9),
            DetectionResult::new(FaceRect::new(1, 2, 3, 4), 0.5),
            DetectionResult::new(FaceRect::new(5, 6, 7, 8), 0.7),
        ];
        let report = DetectionReport::new(640, 480, "12.50KB", faces, 42);

        assert_eq!(report.face_count(), 3);
        assert_eq!(
            report.render(),
            "image size = 640x480 12.50KB\n\
             face num = 3\n\
             confidence = 0.9 x = 10 y = 20 width = 30 height = 40\n\
             confidence = 0.5 x = 1 y = 2 width = 3 height = 4\n\
             confidence = 0.7 x = 5 y = 6 width = 7 height = 8\n\
             detectTime = 42ms\n"
        );
    }

    #[test]
    fn render_without_faces() {
        let report = DetectionReport::new(2, 3, "0.00BT", Vec::new(), 0);
        let text = report.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            ["image size = 2x3 0.00BT", "face num = 0", "detectTime = 0ms"]
        );
    }

    #[test]
    fn serializes_to_json() {
        let faces = vec![DetectionResult::new(FaceRect::new(-3, 4, 5, 6), 2.5)];
        let report = DetectionReport::new(8, 9, "1.00KB", faces, 7);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["file_size"], "1.00KB");
        assert_eq!(json["faces"][0]["rect"]["x"], -3);
        assert_eq!(json["faces"][0]["confidence"], 2.5);
    }
}
