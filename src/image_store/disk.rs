/// Disk-based image storage backend
use crate::{
    error::{ApiError, ApiResult},
    image_store::{ImageBackend, StoredImage},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::{fs, io::AsyncWriteExt};

/// Disk storage backend
///
/// Stores every image flat in a single directory, named by its generated filename.
#[derive(Clone)]
pub struct DiskImageBackend {
    base_path: PathBuf,
}

impl DiskImageBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn image_path(&self, filename: &str) -> PathBuf {
        self.base_path.join(filename)
    }

    fn to_stored(filename: String, metadata: &std::fs::Metadata) -> StoredImage {
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        StoredImage {
            filename,
            size: metadata.len(),
            modified,
        }
    }
}

#[async_trait]
impl ImageBackend for DiskImageBackend {
    async fn ensure_ready(&self) -> ApiResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            ApiError::Storage(format!(
                "Failed to create directory {:?}: {}",
                self.base_path, e
            ))
        })
    }

    async fn put(&self, filename: &str, data: Vec<u8>) -> ApiResult<()> {
        let path = self.image_path(filename);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    ApiError::Conflict(format!("Image already exists: {}", filename))
                }
                _ => ApiError::Storage(format!("Failed to create image {}: {}", filename, e)),
            })?;

        let written = async {
            file.write_all(&data).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            // Don't leave a truncated file behind
            let _ = fs::remove_file(&path).await;
            return Err(ApiError::Storage(format!(
                "Failed to write image {}: {}",
                filename, e
            )));
        }

        Ok(())
    }

    async fn get(&self, filename: &str) -> ApiResult<Option<Vec<u8>>> {
        match fs::read(self.image_path(filename)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApiError::Storage(format!(
                "Failed to read image {}: {}",
                filename, e
            ))),
        }
    }

    async fn stat(&self, filename: &str) -> ApiResult<Option<StoredImage>> {
        match fs::metadata(self.image_path(filename)).await {
            Ok(metadata) if metadata.is_file() => {
                Ok(Some(Self::to_stored(filename.to_string(), &metadata)))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApiError::Storage(format!(
                "Failed to stat image {}: {}",
                filename, e
            ))),
        }
    }

    async fn list(&self) -> ApiResult<Vec<StoredImage>> {
        let mut entries = fs::read_dir(&self.base_path).await.map_err(|e| {
            ApiError::Storage(format!("Failed to read directory {:?}: {}", self.base_path, e))
        })?;

        let mut images = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };

            // A file deleted between read_dir and metadata is simply skipped
            match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => {
                    images.push(Self::to_stored(filename, &metadata));
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(images)
    }

    async fn delete(&self, filename: &str) -> ApiResult<bool> {
        match fs::remove_file(self.image_path(filename)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ApiError::Storage(format!(
                "Failed to delete image {}: {}",
                filename, e
            ))),
        }
    }
}
