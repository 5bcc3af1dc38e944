//! Server test utilities.

use super::fixtures::{multipart_body, Part, BOUNDARY};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog_gateway::{build_router, AppContext, ServerConfig};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with temporary storage.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub ctx: AppContext,
    _temp_dir: TempDir,
}

/// Status, headers and raw body of a response.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage and default limits.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after letting the caller adjust the config.
    pub async fn with_config(adjust: impl FnOnce(&mut ServerConfig)) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let mut config = ServerConfig::default();
        config.storage.uploads_directory = temp_dir.path().join("uploads");
        config.storage.public_directory = temp_dir.path().join("public");
        std::fs::create_dir_all(&config.storage.public_directory)
            .expect("Failed to create public directory");
        std::fs::write(
            config.storage.public_directory.join("index.html"),
            "<h1>landing</h1>",
        )
        .expect("Failed to write index page");
        adjust(&mut config);

        let ctx = AppContext::new(config)
            .await
            .expect("Failed to create app context");
        let router = build_router(ctx.clone());

        Self {
            router,
            ctx,
            _temp_dir: temp_dir,
        }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.ctx.config.storage.uploads_directory.clone()
    }

    /// Send a request and collect the full response.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    /// POST a multipart form.
    pub async fn post_multipart(&self, uri: &str, parts: Vec<Part<'_>>) -> TestResponse {
        let request = Request::post(uri)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }
}
