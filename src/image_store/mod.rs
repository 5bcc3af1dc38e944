/// Image Storage System
///
/// Persists uploaded and processed images, addressable by filename.
/// The backend listing is the source of truth; there is no index.

pub mod disk;
pub mod memory;
pub mod models;
pub mod naming;
pub mod store;
pub mod transform;

pub use models::*;
pub use store::ImageStore;

use crate::error::ApiResult;
use async_trait::async_trait;

/// Image storage backend trait
///
/// Implementations handle the actual storage and retrieval of image files.
/// Filenames reaching a backend have already been sanitised.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Prepare the backend (create the storage directory). Idempotent.
    async fn ensure_ready(&self) -> ApiResult<()>;

    /// Store a new file; fails with `Conflict` if the name is taken
    async fn put(&self, filename: &str, data: Vec<u8>) -> ApiResult<()>;

    /// Retrieve a file's bytes
    async fn get(&self, filename: &str) -> ApiResult<Option<Vec<u8>>>;

    /// Size and modification time of a file
    async fn stat(&self, filename: &str) -> ApiResult<Option<StoredImage>>;

    /// Every file in the backend, in backend order
    async fn list(&self) -> ApiResult<Vec<StoredImage>>;

    /// Remove a file; returns false if it did not exist
    async fn delete(&self, filename: &str) -> ApiResult<bool>;
}
