/// Image storage data models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Namespace under which the storage directory is served
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Public URL for a stored image
pub fn public_url(filename: &str) -> String {
    format!("{}/{}", UPLOADS_PREFIX, filename)
}

/// A file as the backend sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub filename: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// A file received from a multipart request, not yet persisted
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Multipart field the file arrived under (`image`, `images`)
    pub field_name: String,
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Registry listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<StoredImage> for ImageEntry {
    fn from(stored: StoredImage) -> Self {
        Self {
            url: public_url(&stored.filename),
            filename: stored.filename,
            size: stored.size,
            uploaded_at: stored.modified,
        }
    }
}

/// Upload response item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub size: u64,
    pub mimetype: String,
}

/// Transform response
///
/// `width`/`height` echo the submitted parameters, not the encoded dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedImage {
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub size: u64,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
}
