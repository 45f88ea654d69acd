use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::face_detector::{DetectionResult, FaceRect};

/// Outline colour used when none is configured: opaque red.
pub const DEFAULT_RECT_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Draw a one-pixel outline for every result, in order.
///
/// Each outline runs from `(x, y)` to `(x + width, y + height)` inclusive.
/// Corners are clamped to the buffer; rectangles lying entirely outside the
/// buffer are skipped.
pub fn annotate(buffer: &mut RgbaImage, results: &[DetectionResult], color: Rgba<u8>) {
    for result in results {
        match clamp_to_bounds(&result.rect, buffer.width(), buffer.height()) {
            Some(rect) => draw_hollow_rect_mut(buffer, rect, color),
            None => log::warn!(
                "skipping face rectangle {:?} outside {}x{} image",
                result.rect,
                buffer.width(),
                buffer.height()
            ),
        }
    }
}

/// Clamp the inclusive outline `(x, y)..=(x + w, y + h)` to the buffer.
fn clamp_to_bounds(rect: &FaceRect, width: u32, height: u32) -> Option<Rect> {
    if width == 0 || height == 0 {
        return None;
    }
    let (max_x, max_y) = (width as i64 - 1, height as i64 - 1);
    let (x0, y0) = (rect.x as i64, rect.y as i64);
    let (x1, y1) = rect.end();

    if x1 < 0 || y1 < 0 || x0 > max_x || y0 > max_y {
        return None;
    }

    let (x0, y0) = (x0.max(0), y0.max(0));
    let (x1, y1) = (x1.min(max_x), y1.min(max_y));
    let w = (x1 - x0 + 1) as u32;
    let h = (y1 - y0 + 1) as u32;
    Some(Rect::at(x0 as i32, y0 as i32).of_size(w, h))
}
