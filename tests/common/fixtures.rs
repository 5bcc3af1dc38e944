//! Test fixtures: images and multipart bodies.

use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

#[allow(dead_code)]
pub const BOUNDARY: &str = "----gateway-test-boundary";

/// Encode a gradient image of the given size.
#[allow(dead_code)]
pub fn test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("Failed to encode fixture image");
    buf
}

/// A small PNG, a couple of hundred bytes.
#[allow(dead_code)]
pub fn small_png() -> Vec<u8> {
    test_image(8, 8, ImageFormat::Png)
}

/// One part of a multipart/form-data body.
#[allow(dead_code)]
pub enum Part<'a> {
    File {
        field: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: Vec<u8>,
    },
    Text {
        field: &'a str,
        value: &'a str,
    },
}

/// Build a multipart/form-data body using [`BOUNDARY`].
#[allow(dead_code)]
pub fn multipart_body(parts: Vec<Part<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                field,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        field, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(
                    format!("Content-Type: {}\r\n\r\n", content_type).as_bytes(),
                );
                body.extend_from_slice(&data);
                body.extend_from_slice(b"\r\n");
            }
            Part::Text { field, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// A single PNG file part.
#[allow(dead_code)]
pub fn png_part<'a>(field: &'a str, filename: &'a str) -> Part<'a> {
    Part::File {
        field,
        filename,
        content_type: "image/png",
        data: small_png(),
    }
}
