//! File naming: sanitized stems, staged input names, and segment names.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Output container for stream-copied segments.
pub const OUTPUT_EXT: &str = "mp4";

/// Extensions accepted as video input.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "avi", "mkv", "webm", "mpg", "mpeg", "ts", "wmv", "flv",
];

static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-]").expect("invalid sanitize regex"));

/// File name stem with every non-word character replaced by `_`, so the
/// name is safe for the engine staging dir and archive entries.
pub fn sanitize_stem(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let sanitized = NON_WORD_RE.replace_all(&stem, "_").into_owned();
    if sanitized.is_empty() {
        "video".to_string()
    } else {
        sanitized
    }
}

/// Engine-side name the source is staged under.
pub fn staged_input_name(stem: &str) -> String {
    format!("{}.{}", stem, OUTPUT_EXT)
}

/// Archive entry name for one segment: `{stem}_part{index}.{ext}`.
pub fn segment_name(stem: &str, index: usize) -> String {
    format!("{}_part{}.{}", stem, index, OUTPUT_EXT)
}

/// Cheap input-type check on the extension, before any bytes are staged.
pub fn is_supported_video(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_lowercase();
            VIDEO_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}
