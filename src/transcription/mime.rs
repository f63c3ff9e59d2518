//! Audio extension / content-type lookup
//!
//! Used when uploading audio to vendors and when persisting downloaded
//! audio. The table is bijective so the two lookups invert each other.

use std::path::Path;

/// Generic streaming audio type, used when an extension is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "audio/webm";

/// Generic container extension, used when a content type is unknown.
pub const DEFAULT_EXTENSION: &str = "webm";

const AUDIO_TYPES: [(&str, &str); 8] = [
    ("wav", "audio/wav"),
    ("webm", "audio/webm"),
    ("ogg", "audio/ogg"),
    ("mp3", "audio/mpeg"),
    ("mp4", "audio/mp4"),
    ("m4a", "audio/x-m4a"),
    ("flac", "audio/flac"),
    ("aac", "audio/aac"),
];

/// Content type to send for an audio file, from its extension.
///
/// Extension matching is case-insensitive; unknown extensions fall back
/// to the generic streaming type.
pub fn audio_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    AUDIO_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// File extension for a downloaded audio content type.
///
/// Exact inverse of [`audio_content_type`] for every table entry;
/// unknown content types fall back to the generic container extension.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    AUDIO_TYPES
        .iter()
        .find(|(_, known)| *known == content_type)
        .map(|(ext, _)| *ext)
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Rough audio duration estimate from file size: ~1 MiB per minute.
///
/// Strictly a fallback for vendors that do not report a duration.
pub fn estimate_duration_minutes(file_size_bytes: u64) -> f64 {
    file_size_bytes as f64 / (1024.0 * 1024.0)
}
