use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use facedetection::{
    file_size_label, BoxError, CompressOutcome, Compressor, DetectionResult, DetectionSession,
    FaceDetectionError, FaceDetector, FacePipeline, FaceRect, JpegCompressor,
    PassThroughCompressor, PathSource, SourceKind, Stage, DEFAULT_RECT_COLOR,
};
use image::{ImageEncoder, Rgb, RgbImage};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Portrait-ish photo with a bright "face" blob in the upper half.
fn make_photo(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 3.0);
    let radius = width.min(height) as f64 / 5.0;
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let d = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
        *pixel = if d < radius {
            Rgb([230, 190, 160])
        } else {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x ^ y) & 0xFF) as u8,
            ])
        };
    }
    img
}

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = make_photo(width, height);
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    let path = dir.join(name);
    std::fs::write(&path, buffer).unwrap();
    path
}

/// Detector that always reports the same faces and counts its calls.
struct FixedDetector {
    faces: Vec<DetectionResult>,
    calls: Arc<AtomicUsize>,
}

impl FixedDetector {
    fn new(faces: Vec<DetectionResult>) -> Self {
        Self {
            faces,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FaceDetector for FixedDetector {
    fn detect(&self, _gray: &[u8], _w: u32, _h: u32) -> Result<Vec<DetectionResult>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.faces.clone())
    }
}

struct ExplodingCompressor;

impl Compressor for ExplodingCompressor {
    fn compress(&self, _path: &Path) -> Result<CompressOutcome, BoxError> {
        Err("encoder crashed".into())
    }
}

fn result(confidence: f64, x: i32, y: i32, w: u32, h: u32) -> DetectionResult {
    DetectionResult::new(FaceRect::new(x, y, w, h), confidence)
}

#[test]
fn three_faces_reported_in_detector_order() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "group.png", 200, 150);
    let faces = vec![
        result(0.9, 10, 10, 30, 30),
        result(0.5, 80, 40, 25, 25),
        result(0.7, 150, 90, 40, 50),
    ];
    let pipeline = FacePipeline::new(Box::new(FixedDetector::new(faces)))
        .compressor(Box::new(PassThroughCompressor));

    let outcome = pipeline.run(&path).unwrap();
    let report = &outcome.report;
    assert_eq!(report.face_count(), 3);

    let text = report.render();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        format!("image size = 200x150 {}", file_size_label(&path))
    );
    assert_eq!(lines[1], "face num = 3");
    assert_eq!(
        &lines[2..5],
        [
            "confidence = 0.9 x = 10 y = 10 width = 30 height = 30",
            "confidence = 0.5 x = 80 y = 40 width = 25 height = 25",
            "confidence = 0.7 x = 150 y = 90 width = 40 height = 50",
        ]
    );
    assert!(lines[5].starts_with("detectTime = ") && lines[5].ends_with("ms"));

    for face in report.faces() {
        let (x, y) = (face.rect.x as u32, face.rect.y as u32);
        assert_eq!(outcome.annotated.get_pixel(x, y), &DEFAULT_RECT_COLOR);
    }
}

#[test]
fn no_faces_means_untouched_copy() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "empty.png", 64, 48);
    let pipeline = FacePipeline::new(Box::new(FixedDetector::new(vec![])))
        .compressor(Box::new(PassThroughCompressor));

    let outcome = pipeline.run(&path).unwrap();
    assert_eq!(outcome.report.face_count(), 0);
    assert_eq!(outcome.annotated, outcome.original);
}

#[test]
fn compression_error_is_terminal_and_skips_detector() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "photo.png", 32, 32);
    let detector = FixedDetector::new(vec![result(1.0, 0, 0, 5, 5)]);
    let calls = detector.calls.clone();
    let pipeline =
        FacePipeline::new(Box::new(detector)).compressor(Box::new(ExplodingCompressor));

    let err = pipeline.run(&path).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Compress));
    assert!(err.to_string().contains("encoder crashed"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn large_photo_is_compressed_before_detection() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    // 1800px on the long side is sampled down by 2.
    let path = write_png(dir.path(), "large.png", 1800, 1200);
    let cache = dir.path().join("cache");
    let pipeline = FacePipeline::new(Box::new(FixedDetector::new(vec![])))
        .compressor(Box::new(JpegCompressor::new(&cache).ignore_by(0)));

    let outcome = pipeline.run(&path).unwrap();
    assert!(outcome.compressed.is_compressed());
    assert!(outcome.compressed.path().starts_with(&cache));
    assert_eq!(
        (outcome.report.width(), outcome.report.height()),
        (900, 600)
    );
    assert_eq!(
        outcome.report.file_size(),
        file_size_label(outcome.compressed.path())
    );
}

#[test]
fn gif_passes_through_compression() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let img = image::DynamicImage::ImageRgb8(make_photo(40, 40));
    let path = dir.path().join("anim.gif");
    img.save(&path).unwrap();

    let pipeline = FacePipeline::new(Box::new(FixedDetector::new(vec![])))
        .compressor(Box::new(JpegCompressor::new(dir.path()).ignore_by(0)));

    let outcome = pipeline.run(&path).unwrap();
    assert_eq!(outcome.compressed, CompressOutcome::PassThrough(path));
}

#[test]
fn corrupt_image_fails_at_load() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\ngarbage").unwrap();
    let pipeline = FacePipeline::new(Box::new(FixedDetector::new(vec![])));

    let err = pipeline.run(&path).unwrap_err();
    assert!(matches!(err, FaceDetectionError::Decode(_)), "{err}");
}

#[test]
fn source_driven_run() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "picked.png", 50, 50);
    let detector = FixedDetector::new(vec![result(4.2, 5, 5, 10, 10)]);
    let pipeline =
        FacePipeline::new(Box::new(detector)).compressor(Box::new(PassThroughCompressor));

    let mut source = PathSource::new(&path);
    let outcome = pipeline
        .run_from(&mut source, SourceKind::Pick)
        .unwrap()
        .expect("picked image should run");
    assert_eq!(outcome.source, path);
    assert_eq!(outcome.report.face_count(), 1);
}

#[test]
fn session_runs_in_background() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "bg.png", 30, 30);
    let detector = FixedDetector::new(vec![result(1.0, 1, 1, 3, 3)]);
    let pipeline =
        FacePipeline::new(Box::new(detector)).compressor(Box::new(PassThroughCompressor));
    let session = DetectionSession::new(Arc::new(pipeline));

    let outcome = session.submit(&path).unwrap().wait().unwrap();
    assert_eq!(outcome.report.face_count(), 1);
}

#[cfg(feature = "rustface")]
#[test]
fn rustface_backend_reports_missing_model_at_init() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "photo.png", 40, 40);
    let detector = facedetection::RustfaceDetector::new(dir.path().join("missing.bin"));
    let pipeline = FacePipeline::new(Box::new(detector));

    assert!(matches!(
        pipeline.initialize(),
        Err(FaceDetectionError::DetectorInit(_))
    ));
    let err = pipeline.run(&path).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Detect));
}
