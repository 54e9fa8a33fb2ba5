// Upload allow-list
//
// Filename extension and declared content type are both client controlled;
// this is a cheap pre-filter in front of the engine, not a content check.

use crate::models::UploadedFile;

/// Extensions accepted for uploads
pub const ALLOWED_AUDIO_EXTENSIONS: [&str; 6] = ["wav", "mp3", "m4a", "flac", "ogg", "webm"];

/// Non `audio/*` content types accepted anyway
pub const EXTRA_CONTENT_TYPES: [&str; 2] = ["video/webm", "application/octet-stream"];

/// Suffix used for staged uploads whose extension is not on the allow-list
pub const FALLBACK_SUFFIX: &str = ".tmp";

pub fn is_allowed_extension(ext: &str) -> bool {
    ALLOWED_AUDIO_EXTENSIONS.contains(&ext)
}

/// Checks an upload against the extension and content type allow-lists
pub fn is_allowed(file: Option<&UploadedFile>) -> bool {
    let Some(file) = file else {
        return false;
    };
    if file.filename.is_empty() {
        return false;
    }

    match file.extension() {
        Some(ext) if is_allowed_extension(&ext) => {}
        _ => return false,
    }

    let content_type = file.content_type.as_str();
    content_type.starts_with("audio/") || EXTRA_CONTENT_TYPES.contains(&content_type)
}

/// Temp file suffix for an upload, `.tmp` when the extension is not allowed
pub fn staging_suffix(file: &UploadedFile) -> String {
    match file.extension() {
        Some(ext) if is_allowed_extension(&ext) => format!(".{}", ext),
        _ => FALLBACK_SUFFIX.to_string(),
    }
}
