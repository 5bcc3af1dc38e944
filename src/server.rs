/// HTTP server setup and routing
use crate::{
    api::{self, catalog},
    context::AppContext,
    error::{ApiError, ApiResult},
    metrics,
};
use axum::{
    extract::{Request, State},
    handler::{Handler, HandlerWithoutStateExt},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

/// Body of every response to an unknown path
pub const FALLBACK_TEXT: &str = "Nhập Sai Đường Dẫn! Vui Lòng Nhập Lại >.<";

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Missing uploads get the same plain-text reply as any unknown path
    let uploads = ServeDir::new(&ctx.config.storage.uploads_directory)
        .call_fallback_on_method_not_allowed(true)
        .fallback(unknown_path.into_service());

    Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .merge(api::routes(&ctx.config))
        .nest_service("/uploads", uploads)
        .fallback(front_door_fallback)
        // Provide state - converts Router<AppContext> to Router<()>
        .with_state(ctx)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(middleware::from_fn(metrics::track_http)),
        )
}

/// Anything under `/api` goes to the catalog; everything else gets the fixed text.
///
/// Only the catalog branch reads the body.
async fn front_door_fallback(State(ctx): State<AppContext>, req: Request) -> Response {
    if catalog::is_catalog_path(req.uri().path()) {
        return catalog::forward.call(req, ctx).await;
    }

    unknown_path().await.into_response()
}

/// Literal reply for unmatched paths, HTTP 200
async fn unknown_path() -> &'static str {
    FALLBACK_TEXT
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> ApiResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Starting catalog gateway on {}", addr);
    info!("   Service URL: {}", ctx.service_url());
    info!(
        "   Image storage: {}",
        ctx.config.storage.uploads_directory.display()
    );
    match ctx.catalog.base_url() {
        Some(url) => info!("   Catalog upstream: {}", url),
        None => info!("   Catalog upstream: not configured"),
    }

    let app = build_router(ctx);

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    // Axum 0.7: Router<()> can be passed directly to serve
    axum::serve(listener, app)
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
