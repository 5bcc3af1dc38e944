/// Music catalog upstream client
///
/// Relays requests to the third-party catalog API, optionally through an
/// outbound proxy. One inbound request maps to exactly one upstream call;
/// there is no retry or caching.
use crate::{
    config::CatalogConfig,
    error::{ApiError, ApiResult},
};
use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
};
use reqwest::{Client, Proxy, Url};
use std::time::Duration;

/// Upstream reply, ready to be relayed
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Catalog upstream client
#[derive(Clone)]
pub struct CatalogClient {
    http_client: Client,
    base_url: Option<Url>,
}

impl CatalogClient {
    /// Build the client once at startup
    pub fn new(config: &CatalogConfig) -> ApiResult<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if let Some(proxy_url) = &config.outbound_proxy {
            let proxy = Proxy::all(proxy_url.as_str())
                .map_err(|e| ApiError::Config(format!("Invalid outbound proxy: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!(proxy = %proxy_url, "Catalog requests use outbound proxy");
        }

        let http_client = builder
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config
            .upstream_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| ApiError::Config(format!("Invalid catalog upstream URL: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Upstream URL for a path below the mount prefix plus the original query
    pub fn upstream_url(&self, rest: &str, query: Option<&str>) -> ApiResult<Url> {
        let base = self
            .base_url
            .as_ref()
            .ok_or_else(|| ApiError::Upstream("Catalog upstream is not configured".to_string()))?;

        let mut url = base.clone();
        let rest = rest.trim_start_matches('/');
        if !rest.is_empty() {
            let path = format!("{}/{}", base.path().trim_end_matches('/'), rest);
            url.set_path(&path);
        }
        url.set_query(query.filter(|q| !q.is_empty()));

        Ok(url)
    }

    /// Send one request upstream and buffer the reply
    pub async fn forward(
        &self,
        method: Method,
        rest: &str,
        query: Option<&str>,
        headers: &HeaderMap,
        body: Bytes,
    ) -> ApiResult<UpstreamResponse> {
        let url = self.upstream_url(rest, query)?;
        tracing::debug!(method = %method, url = %url, "Forwarding catalog request");

        let response = self
            .http_client
            .request(method.clone(), url.clone())
            .headers(forwardable_request_headers(headers))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                crate::metrics::record_catalog_request(method.as_str(), "error");
                ApiError::Upstream(format!("Request to {} failed: {}", url, e))
            })?;

        let status = response.status();
        let headers = relayable_response_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Upstream(format!("Failed to read upstream body: {}", e)))?;

        crate::metrics::record_catalog_request(method.as_str(), status.as_str());

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// Headers that describe a single hop and must not be forwarded
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Inbound headers minus host, length and hop-by-hop headers
pub fn forwardable_request_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| {
            !is_hop_by_hop(name) && *name != header::HOST && *name != header::CONTENT_LENGTH
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Upstream headers minus length and hop-by-hop headers (the body is re-framed)
pub fn relayable_response_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name) && *name != header::CONTENT_LENGTH)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
