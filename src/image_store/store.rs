/// Image Store Manager
///
/// Applies upload policy (MIME type, size, naming) on top of a storage backend
use crate::{
    config::UploadConfig,
    error::{ApiError, ApiResult},
    image_store::{
        disk::DiskImageBackend,
        models::public_url,
        naming,
        transform::{self, ProcessParams, TransformPlan},
        ImageBackend, ImageEntry, IncomingFile, ProcessedImage, UploadedImage,
    },
};
use std::path::PathBuf;
use std::sync::Arc;

/// Main image store manager
#[derive(Clone)]
pub struct ImageStore {
    backend: Arc<dyn ImageBackend>,
    limits: UploadConfig,
}

impl ImageStore {
    /// Create an image store over an arbitrary backend
    pub fn new(backend: Arc<dyn ImageBackend>, limits: UploadConfig) -> Self {
        Self { backend, limits }
    }

    /// Create an image store over a directory on disk
    pub fn on_disk(directory: PathBuf, limits: UploadConfig) -> Self {
        Self::new(Arc::new(DiskImageBackend::new(directory)), limits)
    }

    pub fn limits(&self) -> &UploadConfig {
        &self.limits
    }

    /// Make sure the storage location exists
    pub async fn ensure_ready(&self) -> ApiResult<()> {
        self.backend.ensure_ready().await
    }

    /// Check MIME type and size of an incoming file
    pub fn validate(&self, file: &IncomingFile) -> ApiResult<()> {
        if !file.content_type.starts_with("image/") {
            return Err(ApiError::BadRequest("Only image files are allowed!".to_string()));
        }

        if file.data.len() > self.limits.max_file_size {
            return Err(ApiError::TooLarge {
                max_mb: self.limits.max_file_size_mb(),
            });
        }

        Ok(())
    }

    /// Validate and persist a single upload
    pub async fn save(&self, file: IncomingFile) -> ApiResult<UploadedImage> {
        self.validate(&file)?;
        self.persist(file).await
    }

    /// Validate every file first, then persist them all
    pub async fn save_all(&self, files: Vec<IncomingFile>) -> ApiResult<Vec<UploadedImage>> {
        for file in &files {
            self.validate(file)?;
        }

        futures::future::try_join_all(files.into_iter().map(|file| self.persist(file))).await
    }

    async fn persist(&self, file: IncomingFile) -> ApiResult<UploadedImage> {
        let filename = naming::generate_filename(&file.field_name, &file.original_name);
        let size = file.data.len() as u64;

        self.backend
            .put(&filename, file.data)
            .await
            .inspect_err(|e| {
                if matches!(e, ApiError::Conflict(_)) {
                    tracing::warn!(
                        filename = %filename,
                        "Generated filename collided with an existing image"
                    );
                }
            })?;

        tracing::info!(
            filename = %filename,
            original_name = %file.original_name,
            size,
            "Stored image"
        );
        crate::metrics::record_image_upload(&file.field_name, size);

        Ok(UploadedImage {
            url: public_url(&filename),
            filename,
            original_name: file.original_name,
            size,
            mimetype: file.content_type,
        })
    }

    /// Every stored file with a listed image extension
    pub async fn list(&self) -> ApiResult<Vec<ImageEntry>> {
        let stored = self.backend.list().await?;

        Ok(stored
            .into_iter()
            .filter(|image| naming::has_listed_extension(&image.filename))
            .map(ImageEntry::from)
            .collect())
    }

    /// Raw bytes and content type of a stored file
    pub async fn read(&self, filename: &str) -> ApiResult<(Vec<u8>, &'static str)> {
        let filename = naming::sanitize_filename(filename)?;

        let data = self
            .backend
            .get(filename)
            .await?
            .ok_or_else(|| ApiError::NotFound("Image not found".to_string()))?;

        Ok((data, naming::content_type_for(filename)))
    }

    /// Remove a stored file
    pub async fn delete(&self, filename: &str) -> ApiResult<()> {
        let filename = naming::sanitize_filename(filename)?;

        if !self.backend.delete(filename).await? {
            return Err(ApiError::NotFound("Image not found".to_string()));
        }

        tracing::info!(filename = %filename, "Deleted image");
        crate::metrics::record_image_delete();
        Ok(())
    }

    /// Store the source upload, then write a resized/re-encoded copy beside it
    pub async fn process(
        &self,
        file: IncomingFile,
        params: ProcessParams,
    ) -> ApiResult<ProcessedImage> {
        self.validate(&file)?;

        let data = file.data.clone();
        let source = self.persist(file).await?;

        let result = self.transform_source(&source, data, &params).await;
        let format_label = transform::OutputFormat::parse(&params.format)
            .map(|f| f.name())
            .unwrap_or("unsupported");
        crate::metrics::record_image_processed(
            format_label,
            if result.is_ok() { "success" } else { "failure" },
        );

        let (output_name, size) = result?;

        Ok(ProcessedImage {
            url: public_url(&output_name),
            filename: output_name,
            original_name: source.original_name,
            size,
            format: params.format,
            width: params.width,
            height: params.height,
        })
    }

    async fn transform_source(
        &self,
        source: &UploadedImage,
        data: Vec<u8>,
        params: &ProcessParams,
    ) -> ApiResult<(String, u64)> {
        let plan = TransformPlan::from_params(params)?;

        let encoded = tokio::task::spawn_blocking(move || transform::apply(&data, &plan))
            .await
            .map_err(|e| ApiError::Processing(format!("Transform task failed: {}", e)))??;

        let output_name = naming::processed_filename(&source.filename);
        self.backend.put(&output_name, encoded).await?;

        let size = self
            .backend
            .stat(&output_name)
            .await?
            .map(|stored| stored.size)
            .ok_or_else(|| {
                ApiError::Storage(format!("Processed image vanished: {}", output_name))
            })?;

        tracing::info!(
            source = %source.filename,
            output = %output_name,
            size,
            "Processed image"
        );

        Ok((output_name, size))
    }
}
