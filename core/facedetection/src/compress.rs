use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, RgbImage, RgbaImage};

use crate::error::{BoxError, FaceDetectionError};

/// Inputs at or below this many KiB are passed through untouched by default.
const DEFAULT_IGNORE_BY_KB: u64 = 100;

/// Default JPEG quality, matching the mobile compression library.
const DEFAULT_QUALITY: u8 = 60;

/// Reference long side used by the sample-size table.
const BASE_SIDE: u32 = 1280;

/// Predicate deciding whether a path should be compressed at all.
pub type CompressFilter = Box<dyn Fn(&Path) -> bool + Send + Sync>;

/// What a [`Compressor`] did with its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressOutcome {
    /// A new, smaller file was written.
    Compressed(PathBuf),
    /// The input was left as is (filtered out or already small enough).
    PassThrough(PathBuf),
}

impl CompressOutcome {
    /// Path of the file to analyse next.
    pub fn path(&self) -> &Path {
        match self {
            CompressOutcome::Compressed(path) | CompressOutcome::PassThrough(path) => path,
        }
    }

    /// `true` when a new file was produced.
    pub fn is_compressed(&self) -> bool {
        matches!(self, CompressOutcome::Compressed(_))
    }
}

/// Pluggable image compression backend.
pub trait Compressor: Send + Sync {
    /// Compress the image at `path`, or decide to pass it through.
    fn compress(&self, path: &Path) -> Result<CompressOutcome, BoxError>;
}

/// Compressor that never touches its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughCompressor;

impl Compressor for PassThroughCompressor {
    fn compress(&self, path: &Path) -> Result<CompressOutcome, BoxError> {
        Ok(CompressOutcome::PassThrough(path.to_path_buf()))
    }
}

/// Default filter: skip empty paths and GIFs.
pub fn default_filter(path: &Path) -> bool {
    let name = path.to_string_lossy();
    !(name.is_empty() || name.to_lowercase().ends_with(".gif"))
}

/// Downsampling JPEG compressor.
///
/// Files larger than the `ignore_by` threshold are decoded, shrunk by an
/// integer sample factor chosen from their dimensions, flattened onto white
/// and re-encoded as JPEG into `target_dir`.
///
/// ```no_run
/// use facedetection::{Compressor, JpegCompressor};
///
/// let compressor = JpegCompressor::new("/tmp/cache").ignore_by(50).quality(70);
/// let outcome = compressor.compress("photo.jpg".as_ref()).unwrap();
/// println!("analyse {}", outcome.path().display());
/// ```
pub struct JpegCompressor {
    target_dir: PathBuf,
    ignore_by_kb: u64,
    quality: u8,
    filter: CompressFilter,
}

impl JpegCompressor {
    /// Create a compressor writing its output into `target_dir`.
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            ignore_by_kb: DEFAULT_IGNORE_BY_KB,
            quality: DEFAULT_QUALITY,
            filter: Box::new(default_filter),
        }
    }

    /// Pass through files no larger than `kb` KiB (default: 100). `0` compresses everything.
    pub fn ignore_by(mut self, kb: u64) -> Self {
        self.ignore_by_kb = kb;
        self
    }

    /// JPEG quality from 1 to 100 (default: 60).
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Replace the filter predicate. Paths for which it returns `false` pass through.
    pub fn filter(mut self, filter: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Directory compressed files are written to.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    fn needs_compression(&self, path: &Path) -> Result<bool, FaceDetectionError> {
        if self.ignore_by_kb == 0 {
            return Ok(true);
        }
        let len = std::fs::metadata(path)?.len();
        Ok(len > self.ignore_by_kb.saturating_mul(1024))
    }

    fn compress_file(&self, path: &Path) -> Result<PathBuf, FaceDetectionError> {
        if !(1..=100).contains(&self.quality) {
            return Err(FaceDetectionError::InvalidQuality(self.quality));
        }

        let input = std::fs::read(path)?;
        let decoded = image::load_from_memory(&input)
            .map_err(|e| FaceDetectionError::Decode(e.to_string()))?;

        let sample = sample_size(decoded.width(), decoded.height());
        let sampled = downsample(&decoded, sample);
        let rgb = flatten_alpha(&sampled.to_rgba8());

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, self.quality)
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| FaceDetectionError::Encode(e.to_string()))?;

        std::fs::create_dir_all(&self.target_dir)?;
        let output = self.target_dir.join(unique_file_name());
        std::fs::write(&output, &buffer)?;

        log::debug!(
            "compressed {} ({}x{}, {} bytes) -> {} ({}x{}, {} bytes, sample {})",
            path.display(),
            decoded.width(),
            decoded.height(),
            input.len(),
            output.display(),
            rgb.width(),
            rgb.height(),
            buffer.len(),
            sample
        );
        Ok(output)
    }
}

impl Compressor for JpegCompressor {
    fn compress(&self, path: &Path) -> Result<CompressOutcome, BoxError> {
        if !(self.filter)(path) {
            log::debug!("compression filter skipped {}", path.display());
            return Ok(CompressOutcome::PassThrough(path.to_path_buf()));
        }
        if !self.needs_compression(path)? {
            log::debug!(
                "{} is within {} KiB, passing through",
                path.display(),
                self.ignore_by_kb
            );
            return Ok(CompressOutcome::PassThrough(path.to_path_buf()));
        }
        Ok(CompressOutcome::Compressed(self.compress_file(path)?))
    }
}

/// Integer downsampling factor for an image of the given size.
///
/// Odd dimensions are rounded up to even first. Near-square images keep
/// full resolution below 1664px on the long side; elongated images are
/// scaled so the short side lands near 1280px.
pub fn sample_size(width: u32, height: u32) -> u32 {
    let width = width + width % 2;
    let height = height + height % 2;
    let long_side = width.max(height);
    let short_side = width.min(height);
    if long_side == 0 {
        return 1;
    }

    let scale = short_side as f64 / long_side as f64;
    let sample = if scale > 0.5625 {
        if long_side < 1664 {
            1
        } else if long_side < 4990 {
            2
        } else if long_side > 4990 && long_side < 10240 {
            4
        } else {
            long_side / BASE_SIDE
        }
    } else if scale > 0.5 {
        long_side / BASE_SIDE
    } else {
        (long_side as f64 / (BASE_SIDE as f64 / scale)).ceil() as u32
    };
    sample.max(1)
}

fn downsample(image: &DynamicImage, sample: u32) -> DynamicImage {
    if sample <= 1 {
        return image.clone();
    }
    let width = (image.width() / sample).max(1);
    let height = (image.height() / sample).max(1);
    image.resize_exact(width, height, FilterType::Triangle)
}

/// Flatten alpha channel by compositing onto a white background.
fn flatten_alpha(rgba: &RgbaImage) -> RgbImage {
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let inv_alpha = 1.0 - alpha;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        rgb.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    rgb
}

fn unique_file_name() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{millis}_{seq}.jpg")
}
