/// Landing and demo pages
use crate::context::AppContext;
use axum::Router;
use std::path::Path;
use tower_http::services::ServeFile;

pub const INDEX_PAGE: &str = "index.html";
pub const DEMO_PAGE: &str = "image-demo.html";

/// Build page routes served from the public directory
pub fn routes(public_directory: &Path) -> Router<AppContext> {
    Router::new()
        .route_service("/", ServeFile::new(public_directory.join(INDEX_PAGE)))
        .route_service(
            "/image-demo",
            ServeFile::new(public_directory.join(DEMO_PAGE)),
        )
}
