/// Catalog relay handler
use crate::{context::AppContext, error::ApiResult};
use axum::{
    body::{Body, Bytes},
    extract::{OriginalUri, State},
    http::{HeaderMap, Method},
    response::Response,
};

/// Path prefix relayed to the catalog upstream
pub const CATALOG_PREFIX: &str = "/api";

/// Whether a request path belongs to the catalog namespace
pub fn is_catalog_path(path: &str) -> bool {
    path == CATALOG_PREFIX
        || path
            .strip_prefix(CATALOG_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Relay a request under `/api` to the catalog upstream and pass its reply through verbatim
pub async fn forward(
    State(ctx): State<AppContext>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let rest = uri.path().strip_prefix(CATALOG_PREFIX).unwrap_or(uri.path());

    let upstream = ctx
        .catalog
        .forward(method, rest, uri.query(), &headers, body)
        .await
        .inspect_err(|e| tracing::error!(path = %uri.path(), error = %e, "Catalog relay failed"))?;

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = upstream.headers;

    Ok(response)
}
