/// Health check endpoints for liveness and readiness probes
use crate::context::AppContext;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/ready", get(readiness_probe))
}

/// Basic health check
///
/// Returns simple JSON with status and version
pub async fn health_basic(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": ctx.config.service.version
    }))
}

/// Readiness probe
///
/// Ready once the storage directory can be listed.
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Err(e) = ctx.image_store.list().await {
        tracing::warn!(error = %e, "readiness_probe_failed: storage check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(serde_json::json!({
        "status": "ready",
        "version": ctx.config.service.version,
        "catalogConfigured": ctx.catalog.base_url().is_some()
    })))
}
