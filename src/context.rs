/// Application context and dependency injection
use crate::{
    catalog::CatalogClient,
    config::ServerConfig,
    error::ApiResult,
    image_store::{ImageBackend, ImageStore},
};
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub image_store: Arc<ImageStore>,
    pub catalog: Arc<CatalogClient>,
}

impl AppContext {
    /// Create a new application context backed by the configured storage directory
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        let image_store = ImageStore::on_disk(
            config.storage.uploads_directory.clone(),
            config.upload.clone(),
        );
        Self::build(config, image_store).await
    }

    /// Create a context over a caller-supplied backend (tests, alternative storage)
    pub async fn with_backend(
        config: ServerConfig,
        backend: Arc<dyn ImageBackend>,
    ) -> ApiResult<Self> {
        let image_store = ImageStore::new(backend, config.upload.clone());
        Self::build(config, image_store).await
    }

    async fn build(config: ServerConfig, image_store: ImageStore) -> ApiResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create the storage directory if it doesn't exist; failure is fatal
        image_store.ensure_ready().await?;

        let catalog = CatalogClient::new(&config.catalog)?;

        Ok(Self {
            config: Arc::new(config),
            image_store: Arc::new(image_store),
            catalog: Arc::new(catalog),
        })
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
