/// Configuration management for the catalog gateway
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default per-file upload limit (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Default number of files accepted by the batch upload endpoint
pub const DEFAULT_MAX_FILES: usize = 10;

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "catalog_gateway=debug,tower_http=debug";

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded and processed images
    pub uploads_directory: PathBuf,
    /// Directory holding the landing and demo pages
    pub public_directory: PathBuf,
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_file_size: usize,
    pub max_files: usize,
}

/// Catalog upstream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the music catalog API; catalog routes fail when unset
    pub upstream_url: Option<String>,
    /// Outbound proxy for catalog requests
    pub outbound_proxy: Option<String>,
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
}

impl UploadConfig {
    /// Per-file limit rounded down to whole MiB, as shown in error messages
    pub fn max_file_size_mb(&self) -> usize {
        self.max_file_size / (1024 * 1024)
    }

    /// Request body limit for upload routes: every file at full size plus multipart overhead
    pub fn body_limit(&self) -> usize {
        self.max_file_size
            .saturating_mul(self.max_files)
            .saturating_add(1024 * 1024)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                hostname: "0.0.0.0".to_string(),
                port: 3000,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            storage: StorageConfig {
                uploads_directory: PathBuf::from("./uploads"),
                public_directory: PathBuf::from("./public"),
            },
            upload: UploadConfig {
                max_file_size: DEFAULT_MAX_FILE_SIZE,
                max_files: DEFAULT_MAX_FILES,
            },
            catalog: CatalogConfig {
                upstream_url: None,
                outbound_proxy: None,
                timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: DEFAULT_LOG_FILTER.to_string(),
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let hostname = env::var("HOST").unwrap_or(defaults.service.hostname);
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ApiError::Config("Invalid port number".to_string()))?;

        let uploads_directory = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.uploads_directory);
        let public_directory = env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.public_directory);

        let max_file_size = env::var("UPLOAD_MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);
        let max_files = env::var("UPLOAD_MAX_FILES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_FILES);

        let upstream_url = env::var("CATALOG_UPSTREAM_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        // Kept apart from HTTP_PROXY so only catalog traffic is proxied
        let outbound_proxy = env::var("OUTBOUND_HTTP_PROXY")
            .or_else(|_| env::var("OUTBOUND_HTTPS_PROXY"))
            .ok()
            .filter(|s| !s.trim().is_empty());
        let timeout_secs = env::var("CATALOG_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let log_level = env::var("RUST_LOG")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.logging.level);

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version: defaults.service.version,
            },
            storage: StorageConfig {
                uploads_directory,
                public_directory,
            },
            upload: UploadConfig {
                max_file_size,
                max_files,
            },
            catalog: CatalogConfig {
                upstream_url,
                outbound_proxy,
                timeout_secs,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.upload.max_file_size == 0 {
            return Err(ApiError::Config(
                "Upload max file size must be greater than zero".to_string(),
            ));
        }

        if self.upload.max_files == 0 {
            return Err(ApiError::Config(
                "Upload max files must be greater than zero".to_string(),
            ));
        }

        if let Some(url) = &self.catalog.upstream_url {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| ApiError::Config(format!("Invalid catalog upstream URL: {}", e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ApiError::Config(
                    "Catalog upstream URL must use http or https".to_string(),
                ));
            }
        }

        Ok(())
    }
}
