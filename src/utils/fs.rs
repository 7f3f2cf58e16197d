//! File system utilities.

use crate::Result;
use std::path::Path;

const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "m4v", "ts", "m2ts", "flv", "webm", "mpg", "mpeg",
];

/// Get the extension of a filename in lowercase.
pub fn get_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check if a filename is a video file based on extension.
pub fn is_video_file(name: &str) -> bool {
    get_extension(name)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Strip a trailing video extension, leaving other dotted suffixes alone.
pub fn strip_video_extension(name: &str) -> &str {
    if is_video_file(name) {
        if let Some(idx) = name.rfind('.') {
            return &name[..idx];
        }
    }
    name
}

/// Read a newline separated list of rip filenames.
///
/// Blank lines and `#` comments are skipped; entries that look like paths
/// are reduced to their final component.
pub fn read_filename_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| {
            Path::new(l)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(l)
                .to_string()
        })
        .collect())
}
