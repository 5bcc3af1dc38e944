//! Catalog Gateway
//!
//! Relays a third-party music catalog API under `/api` and provides image
//! upload, listing, deletion and resize/convert endpoints backed by a local
//! storage directory.

pub mod api;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod image_store;
pub mod metrics;
pub mod server;

pub use config::ServerConfig;
pub use context::AppContext;
pub use error::{ApiError, ApiResult};
pub use server::build_router;
