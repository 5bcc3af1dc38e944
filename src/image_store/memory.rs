/// In-memory image storage backend, used by tests and ephemeral deployments
use crate::{
    error::{ApiError, ApiResult},
    image_store::{ImageBackend, StoredImage},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryImageBackend {
    files: RwLock<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
}

impl MemoryImageBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageBackend for MemoryImageBackend {
    async fn ensure_ready(&self) -> ApiResult<()> {
        Ok(())
    }

    async fn put(&self, filename: &str, data: Vec<u8>) -> ApiResult<()> {
        let mut files = self.files.write().await;
        if files.contains_key(filename) {
            return Err(ApiError::Conflict(format!(
                "Image already exists: {}",
                filename
            )));
        }
        files.insert(filename.to_string(), (data, Utc::now()));
        Ok(())
    }

    async fn get(&self, filename: &str) -> ApiResult<Option<Vec<u8>>> {
        Ok(self
            .files
            .read()
            .await
            .get(filename)
            .map(|(data, _)| data.clone()))
    }

    async fn stat(&self, filename: &str) -> ApiResult<Option<StoredImage>> {
        Ok(self
            .files
            .read()
            .await
            .get(filename)
            .map(|(data, modified)| StoredImage {
                filename: filename.to_string(),
                size: data.len() as u64,
                modified: *modified,
            }))
    }

    async fn list(&self) -> ApiResult<Vec<StoredImage>> {
        Ok(self
            .files
            .read()
            .await
            .iter()
            .map(|(name, (data, modified))| StoredImage {
                filename: name.clone(),
                size: data.len() as u64,
                modified: *modified,
            })
            .collect())
    }

    async fn delete(&self, filename: &str) -> ApiResult<bool> {
        Ok(self.files.write().await.remove(filename).is_some())
    }
}
