//! Integration tests for the image upload, registry and transform endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{multipart_body, png_part, small_png, test_image, Part, TestServer, BOUNDARY};
use image::{GenericImageView, ImageFormat};
use serde_json::Value;
use std::collections::HashSet;

async fn upload_one(server: &TestServer) -> Value {
    let response = server
        .post_multipart("/api/images/upload", vec![png_part("image", "cover.png")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    response.json()
}

fn listed_filenames(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["filename"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_upload_single_png() {
    let server = TestServer::new().await;
    let png = small_png();

    let response = server
        .post_multipart(
            "/api/images/upload",
            vec![Part::File {
                field: "image",
                filename: "cover.png",
                content_type: "image/png",
                data: png.clone(),
            }],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Image uploaded successfully");
    assert_eq!(body["data"]["mimetype"], "image/png");
    assert_eq!(body["data"]["originalName"], "cover.png");
    assert_eq!(body["data"]["size"], png.len() as u64);

    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/image-"));
    assert!(url.ends_with(".png"));

    let filename = body["data"]["filename"].as_str().unwrap();
    let on_disk = std::fs::read(server.uploads_dir().join(filename)).unwrap();
    assert_eq!(on_disk, png);

    // Static serving of the storage directory
    let served = server.get(url).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.body, png);
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let server = TestServer::new().await;

    let response = server
        .post_multipart(
            "/api/images/upload",
            vec![Part::File {
                field: "image",
                filename: "notes.txt",
                content_type: "text/plain",
                data: b"hello".to_vec(),
            }],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Only image files are allowed!");
    assert_eq!(std::fs::read_dir(server.uploads_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_rejects_oversized_file() {
    let server = TestServer::new().await;

    let response = server
        .post_multipart(
            "/api/images/upload",
            vec![Part::File {
                field: "image",
                filename: "huge.png",
                content_type: "image/png",
                data: vec![0u8; 10 * 1024 * 1024 + 1],
            }],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "File too large. Maximum size is 10MB");
}

#[tokio::test]
async fn test_upload_without_file_is_client_error() {
    let server = TestServer::new().await;

    let response = server
        .post_multipart(
            "/api/images/upload",
            vec![Part::Text {
                field: "caption",
                value: "no file here",
            }],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "No image file provided");

    // Not multipart at all
    let response = server
        .send(
            Request::post("/api/images/upload")
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["success"], false);
}

#[tokio::test]
async fn test_upload_ignores_other_file_fields() {
    let server = TestServer::new().await;

    let response = server
        .post_multipart("/api/images/upload", vec![png_part("avatar", "a.png")])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "No image file provided");
}

#[tokio::test]
async fn test_upload_multiple() {
    let server = TestServer::new().await;

    let response = server
        .post_multipart(
            "/api/images/upload-multiple",
            vec![
                png_part("images", "one.png"),
                png_part("images", "two.png"),
                Part::File {
                    field: "images",
                    filename: "three.jpg",
                    content_type: "image/jpeg",
                    data: test_image(4, 4, ImageFormat::Jpeg),
                },
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["message"], "3 images uploaded successfully");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    let names: HashSet<&str> = data
        .iter()
        .map(|d| d["filename"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|n| n.starts_with("images-")));
    assert_eq!(data[2]["mimetype"], "image/jpeg");
}

#[tokio::test]
async fn test_upload_multiple_limits() {
    let server = TestServer::new().await;

    let parts = (0..11).map(|_| png_part("images", "x.png")).collect();
    let response = server
        .post_multipart("/api/images/upload-multiple", parts)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Too many files. Maximum is 10");

    let response = server
        .post_multipart(
            "/api/images/upload-multiple",
            vec![Part::Text {
                field: "album",
                value: "empty",
            }],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "No image files provided");

    // One bad file rejects the whole batch before anything is written
    let response = server
        .post_multipart(
            "/api/images/upload-multiple",
            vec![
                png_part("images", "ok.png"),
                Part::File {
                    field: "images",
                    filename: "doc.pdf",
                    content_type: "application/pdf",
                    data: b"%PDF".to_vec(),
                },
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(server.uploads_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_uploaded_filenames_are_unique() {
    let server = TestServer::new().await;

    let mut names = HashSet::new();
    for _ in 0..25 {
        let body = upload_one(&server).await;
        names.insert(body["data"]["filename"].as_str().unwrap().to_string());
    }
    assert_eq!(names.len(), 25);
}

#[tokio::test]
async fn test_list_reflects_upload_and_delete() {
    let server = TestServer::new().await;
    let uploaded = upload_one(&server).await;
    let filename = uploaded["data"]["filename"].as_str().unwrap().to_string();

    // Non-image files in the directory are not listed
    std::fs::write(server.uploads_dir().join("notes.txt"), "x").unwrap();

    let response = server.get("/api/images").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(listed_filenames(&body), vec![filename.clone()]);

    let entry = &body["data"][0];
    assert_eq!(entry["url"], format!("/uploads/{}", filename));
    assert_eq!(entry["size"], uploaded["data"]["size"]);
    assert!(entry["uploadedAt"].as_str().is_some());

    let response = server.delete(&format!("/api/images/{}", filename)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "Image deleted successfully");

    let body = server.get("/api/images").await.json();
    assert!(listed_filenames(&body).is_empty());
}

#[tokio::test]
async fn test_delete_twice_then_not_found() {
    let server = TestServer::new().await;
    let uploaded = upload_one(&server).await;
    let uri = format!("/api/images/{}", uploaded["data"]["filename"].as_str().unwrap());

    assert_eq!(server.delete(&uri).await.status, StatusCode::OK);

    let second = server.delete(&uri).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    assert_eq!(second.json()["error"], "Image not found");

    let missing = server.delete("/api/images/never-existed.png").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_image_bytes() {
    let server = TestServer::new().await;
    let uploaded = upload_one(&server).await;
    let filename = uploaded["data"]["filename"].as_str().unwrap();

    let response = server.get(&format!("/api/images/{}", filename)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["content-type"], "image/png");
    assert_eq!(response.body, small_png());
}

#[tokio::test]
async fn test_get_missing_image() {
    let server = TestServer::new().await;

    let response = server.get("/api/images/does-not-exist.png").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.json(),
        serde_json::json!({"success": false, "error": "Image not found"})
    );
}

#[tokio::test]
async fn test_filename_routes_reject_traversal() {
    let server = TestServer::new().await;
    let outside = server.uploads_dir().parent().unwrap().join("secret.png");
    std::fs::write(&outside, "top secret").unwrap();

    let response = server.get("/api/images/..%2Fsecret.png").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Invalid filename");

    let response = server.delete("/api/images/..%2Fsecret.png").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(outside.exists());
}

#[tokio::test]
async fn test_process_resizes_within_box() {
    let server = TestServer::new().await;

    let response = server
        .post_multipart(
            "/api/images/process",
            vec![
                Part::File {
                    field: "image",
                    filename: "square.png",
                    content_type: "image/png",
                    data: test_image(500, 500, ImageFormat::Png),
                },
                Part::Text {
                    field: "width",
                    value: "100",
                },
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["message"], "Image processed successfully");

    let data = &body["data"];
    assert_eq!(data["format"], "jpeg");
    assert_eq!(data["width"], "100");
    assert!(data.get("height").is_none());
    assert_eq!(data["originalName"], "square.png");

    let filename = data["filename"].as_str().unwrap();
    assert!(filename.starts_with("processed-image-"));
    assert_eq!(data["url"], format!("/uploads/{}", filename));

    let output = std::fs::read(server.uploads_dir().join(filename)).unwrap();
    assert_eq!(data["size"], output.len() as u64);
    assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Jpeg);

    let (w, h) = image::load_from_memory(&output).unwrap().dimensions();
    assert!(w.max(h) <= 100);
    assert_eq!(w, h);

    // The source upload is kept next to the output
    let source = filename.trim_start_matches("processed-");
    assert!(server.uploads_dir().join(source).exists());
}

#[tokio::test]
async fn test_process_preserves_aspect_and_never_enlarges() {
    let server = TestServer::new().await;

    let response = server
        .post_multipart(
            "/api/images/process",
            vec![
                Part::File {
                    field: "image",
                    filename: "wide.png",
                    content_type: "image/png",
                    data: test_image(400, 100, ImageFormat::Png),
                },
                Part::Text {
                    field: "width",
                    value: "200",
                },
                Part::Text {
                    field: "height",
                    value: "200",
                },
                Part::Text {
                    field: "format",
                    value: "png",
                },
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let filename = response.json()["data"]["filename"].as_str().unwrap().to_string();
    let output = std::fs::read(server.uploads_dir().join(&filename)).unwrap();
    assert_eq!(image::load_from_memory(&output).unwrap().dimensions(), (200, 50));

    let response = server
        .post_multipart(
            "/api/images/process",
            vec![
                Part::File {
                    field: "image",
                    filename: "tiny.png",
                    content_type: "image/png",
                    data: test_image(50, 40, ImageFormat::Png),
                },
                Part::Text {
                    field: "width",
                    value: "100",
                },
                Part::Text {
                    field: "height",
                    value: "100",
                },
                Part::Text {
                    field: "format",
                    value: "webp",
                },
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["data"]["format"], "webp");
    let filename = body["data"]["filename"].as_str().unwrap();
    let output = std::fs::read(server.uploads_dir().join(filename)).unwrap();
    assert_eq!(image::load_from_memory(&output).unwrap().dimensions(), (50, 40));
}

async fn process_with_quality(server: &TestServer, quality: &str) -> common::TestResponse {
    server
        .post_multipart(
            "/api/images/process",
            vec![
                Part::File {
                    field: "image",
                    filename: "gradient.png",
                    content_type: "image/png",
                    data: test_image(256, 256, ImageFormat::Png),
                },
                Part::Text {
                    field: "format",
                    value: "jpeg",
                },
                Part::Text {
                    field: "quality",
                    value: quality,
                },
            ],
        )
        .await
}

#[tokio::test]
async fn test_process_honours_jpeg_quality() {
    let server = TestServer::new().await;

    let low = process_with_quality(&server, "10").await;
    let high = process_with_quality(&server, "95").await;
    assert_eq!(low.status, StatusCode::OK);
    assert_eq!(high.status, StatusCode::OK);

    let low_size = low.json()["data"]["size"].as_u64().unwrap();
    let high_size = high.json()["data"]["size"].as_u64().unwrap();
    assert!(low_size < high_size, "{} >= {}", low_size, high_size);

    let response = process_with_quality(&server, "0").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        serde_json::json!({"success": false, "error": "Failed to process image"})
    );
}

#[tokio::test]
async fn test_process_failures() {
    let server = TestServer::new().await;

    // Corrupt input
    let response = server
        .post_multipart(
            "/api/images/process",
            vec![Part::File {
                field: "image",
                filename: "broken.png",
                content_type: "image/png",
                data: b"not a png at all".to_vec(),
            }],
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        serde_json::json!({"success": false, "error": "Failed to process image"})
    );

    // Unsupported output format
    let response = server
        .post_multipart(
            "/api/images/process",
            vec![
                png_part("image", "ok.png"),
                Part::Text {
                    field: "format",
                    value: "bmp",
                },
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

    // Missing file
    let response = server
        .post_multipart(
            "/api/images/process",
            vec![Part::Text {
                field: "width",
                value: "10",
            }],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "No image file provided");
}

#[tokio::test]
async fn test_raw_multipart_body_shape() {
    // Fixture sanity: opening and closing boundaries
    let body = multipart_body(vec![png_part("image", "a.png")]);
    let text = String::from_utf8_lossy(&body);
    assert!(text.starts_with(&format!("--{}\r\n", BOUNDARY)));
    assert!(text.ends_with(&format!("--{}--\r\n", BOUNDARY)));
}
