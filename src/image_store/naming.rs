/// Filename generation and validation for stored images
use crate::error::{ApiError, ApiResult};
use image::ImageFormat;
use rand::Rng;
use std::path::Path;

/// Extensions the registry lists (compared case-insensitively)
pub const LISTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Prefix marking a transform output
pub const PROCESSED_PREFIX: &str = "processed-";

/// Generate `<field>-<millis>-<random>.<ext>` for a new upload.
///
/// Timestamp plus a random draw in 0..=1e9; two uploads in the same
/// millisecond with the same draw would collide, which the backend reports
/// as a conflict instead of overwriting.
pub fn generate_filename(field_name: &str, original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random: u32 = rand::thread_rng().gen_range(0..=1_000_000_000);

    match original_extension(original_name) {
        Some(ext) => format!("{}-{}-{}.{}", field_name, millis, random, ext),
        None => format!("{}-{}-{}", field_name, millis, random),
    }
}

/// Extension of the client-supplied name, kept verbatim if it is plain ASCII alphanumeric
pub fn original_extension(original_name: &str) -> Option<String> {
    // Clients on Windows send backslash-separated paths
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or(original_name);

    Path::new(base)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(String::from)
}

/// Name of the transform output derived from a stored source name
pub fn processed_filename(source: &str) -> String {
    format!("{}{}", PROCESSED_PREFIX, source)
}

/// Reject names that could escape the storage directory
pub fn sanitize_filename(filename: &str) -> ApiResult<&str> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename.starts_with("..")
        || filename.contains(['/', '\\', '\0']);

    if invalid {
        tracing::warn!(filename = %filename, "Rejected unsafe filename");
        return Err(ApiError::BadRequest("Invalid filename".to_string()));
    }

    Ok(filename)
}

/// Whether the registry should list this file
pub fn has_listed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            LISTED_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Content-Type for serving a stored file, derived from its extension
pub fn content_type_for(filename: &str) -> &'static str {
    ImageFormat::from_path(filename)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}
