/// Image upload, registry and transform endpoints
use crate::{
    api::{catalog, ApiResponse},
    config::UploadConfig,
    context::AppContext,
    error::{ApiError, ApiResult},
    image_store::{transform::ProcessParams, IncomingFile},
};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::collections::HashMap;

/// Multipart field for single uploads and transforms
pub const SINGLE_FIELD: &str = "image";

/// Multipart field for batch uploads
pub const MULTIPLE_FIELD: &str = "images";

/// Build image routes
///
/// Methods not handled here fall through to the catalog relay, since the
/// whole `/api` namespace belongs to it otherwise.
pub fn routes(limits: &UploadConfig) -> Router<AppContext> {
    Router::new()
        .route("/api/images", get(list_images).fallback(catalog::forward))
        .route(
            "/api/images/upload",
            post(upload_image).fallback(catalog::forward),
        )
        .route(
            "/api/images/upload-multiple",
            post(upload_multiple).fallback(catalog::forward),
        )
        .route(
            "/api/images/process",
            post(process_image).fallback(catalog::forward),
        )
        .route(
            "/api/images/:filename",
            get(get_image)
                .delete(delete_image)
                .fallback(catalog::forward),
        )
        .layer(DefaultBodyLimit::max(limits.body_limit()))
}

/// Files and text fields pulled out of a multipart body
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<IncomingFile>,
    fields: HashMap<String, String>,
}

/// Read a multipart body, keeping files under `file_field` and every text field.
///
/// Enforces the per-file size limit while streaming and the file count.
async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
    file_field: &str,
    max_files: usize,
    limits: &UploadConfig,
) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    // Not multipart at all: treat as "no file", like an empty form
    let Ok(mut multipart) = multipart else {
        return Ok(form);
    };

    let too_large = || ApiError::TooLarge {
        max_mb: limits.max_file_size_mb(),
    };
    let read_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large()
        } else {
            ApiError::BadRequest(e.body_text())
        }
    };

    while let Some(mut field) = multipart.next_field().await.map_err(read_error)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(original_name) = field.file_name().map(String::from) else {
            let value = field.text().await.map_err(read_error)?;
            form.fields.insert(name, value);
            continue;
        };

        if name != file_field {
            tracing::debug!(field = %name, "Ignoring unexpected file field");
            continue;
        }

        if form.files.len() >= max_files {
            return Err(ApiError::BadRequest(format!(
                "Too many files. Maximum is {}",
                max_files
            )));
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::BadRequest("Only image files are allowed!".to_string()));
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(read_error)? {
            if data.len() + chunk.len() > limits.max_file_size {
                return Err(too_large());
            }
            data.extend_from_slice(&chunk);
        }

        form.files.push(IncomingFile {
            field_name: name,
            original_name,
            content_type,
            data,
        });
    }

    Ok(form)
}

/// List stored images
async fn list_images(State(ctx): State<AppContext>) -> ApiResult<impl IntoResponse> {
    let images = ctx
        .image_store
        .list()
        .await
        .map_err(|e| e.or_internal("Failed to get images"))?;

    Ok(ApiResponse::data(images))
}

/// Serve a stored image's bytes
async fn get_image(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let (data, content_type) = ctx
        .image_store
        .read(&filename)
        .await
        .map_err(|e| e.or_internal("Failed to get image"))?;

    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

/// Upload a single image under field `image`
async fn upload_image(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let limits = ctx.image_store.limits();
    let mut form = read_upload_form(multipart, SINGLE_FIELD, 1, limits).await?;

    let file = form
        .files
        .pop()
        .ok_or_else(|| ApiError::BadRequest("No image file provided".to_string()))?;

    let uploaded = ctx
        .image_store
        .save(file)
        .await
        .map_err(|e| e.or_internal("Failed to upload image"))?;

    Ok(ApiResponse::with_message(uploaded, "Image uploaded successfully"))
}

/// Upload up to `max_files` images under field `images`
async fn upload_multiple(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let limits = ctx.image_store.limits();
    let form = read_upload_form(multipart, MULTIPLE_FIELD, limits.max_files, limits).await?;

    if form.files.is_empty() {
        return Err(ApiError::BadRequest("No image files provided".to_string()));
    }

    let uploaded = ctx
        .image_store
        .save_all(form.files)
        .await
        .map_err(|e| e.or_internal("Failed to upload images"))?;

    let message = format!("{} images uploaded successfully", uploaded.len());
    Ok(ApiResponse::with_message(uploaded, message))
}

/// Delete a stored image
async fn delete_image(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
    ctx.image_store
        .delete(&filename)
        .await
        .map_err(|e| e.or_internal("Failed to delete image"))?;

    Ok(ApiResponse::message("Image deleted successfully"))
}

/// Upload an image and write a resized/re-encoded copy
async fn process_image(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let limits = ctx.image_store.limits();
    let mut form = read_upload_form(multipart, SINGLE_FIELD, 1, limits).await?;

    let file = form
        .files
        .pop()
        .ok_or_else(|| ApiError::BadRequest("No image file provided".to_string()))?;
    let params = ProcessParams::from_fields(&form.fields);

    let processed = ctx
        .image_store
        .process(file, params)
        .await
        .map_err(|e| e.or_internal("Failed to process image"))?;

    Ok(ApiResponse::with_message(processed, "Image processed successfully"))
}
