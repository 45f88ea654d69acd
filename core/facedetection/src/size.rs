use std::path::Path;

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * 1024 * 1024;

/// Format a byte count as a two-decimal size string with a `BT`/`KB`/`MB`/`GB` suffix.
///
/// ```
/// assert_eq!(facedetection::format_size(512), "512.00BT");
/// assert_eq!(facedetection::format_size(1536), "1.50KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    let value = bytes as f64;
    if bytes < KB {
        format!("{value:.2}BT")
    } else if bytes < MB {
        format!("{:.2}KB", value / KB as f64)
    } else if bytes < GB {
        format!("{:.2}MB", value / MB as f64)
    } else {
        format!("{:.2}GB", value / GB as f64)
    }
}

/// Size label for a path on disk.
///
/// Regular files are formatted with [`format_size`], directories give an
/// empty string and a missing path gives `"0BT"`.
pub fn file_size_label(path: &Path) -> String {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => format_size(meta.len()),
        Ok(meta) if meta.is_dir() => String::new(),
        _ => "0BT".to_string(),
    }
}
