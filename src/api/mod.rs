/// API routes and handlers
pub mod catalog;
pub mod health;
pub mod images;
pub mod pages;

use crate::{config::ServerConfig, context::AppContext};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

/// Success envelope shared by every JSON endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: None,
        })
    }
}

/// Build API routes
///
/// Catalog relay has no route of its own: it is reached through the
/// front-door fallback and the method fallback of the image routes.
pub fn routes(config: &ServerConfig) -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(pages::routes(&config.storage.public_directory))
        .merge(images::routes(&config.upload))
}
