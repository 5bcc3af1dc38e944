/// Resize and format conversion for uploaded images
use crate::error::{ApiError, ApiResult};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat};
use std::collections::HashMap;
use std::io::Cursor;

pub const DEFAULT_FORMAT: &str = "jpeg";
pub const DEFAULT_QUALITY: u8 = 80;

/// Encodings the transform endpoint can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl OutputFormat {
    pub fn parse(name: &str) -> ApiResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "gif" => Ok(Self::Gif),
            other => Err(ApiError::Processing(format!(
                "Unsupported output format: {}",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }
}

/// Raw form parameters as submitted alongside the file
#[derive(Debug, Clone, Default)]
pub struct ProcessParams {
    pub width: Option<String>,
    pub height: Option<String>,
    pub format: String,
    pub quality: Option<String>,
}

impl ProcessParams {
    /// Pick the transform parameters out of multipart text fields
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let present = |key: &str| {
            fields
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            width: present("width"),
            height: present("height"),
            format: present("format").unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
            quality: present("quality"),
        }
    }
}

/// Validated transform: bounding box, output format and encoder quality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPlan {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub format: OutputFormat,
    pub quality: u8,
}

impl TransformPlan {
    pub fn from_params(params: &ProcessParams) -> ApiResult<Self> {
        let max_width = params
            .width
            .as_deref()
            .map(|w| parse_dimension("width", w))
            .transpose()?;
        let max_height = params
            .height
            .as_deref()
            .map(|h| parse_dimension("height", h))
            .transpose()?;

        let quality = match params.quality.as_deref() {
            None => DEFAULT_QUALITY,
            Some(raw) => parse_leading_int(raw)
                .filter(|q| (1..=100).contains(q))
                .map(|q| q as u8)
                .ok_or_else(|| ApiError::Processing(format!("Invalid quality: {}", raw)))?,
        };

        Ok(Self {
            max_width,
            max_height,
            format: OutputFormat::parse(&params.format)?,
            quality,
        })
    }
}

fn parse_dimension(name: &str, raw: &str) -> ApiResult<u32> {
    parse_leading_int(raw)
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| ApiError::Processing(format!("Invalid {}: {}", name, raw)))
}

/// Integer from the leading digits of a string, so `"120px"` reads as 120
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    digits[..end].parse::<i64>().ok().map(|v| v * sign)
}

/// Scale `(width, height)` down to fit inside the box, preserving aspect ratio.
///
/// Missing bounds are unconstrained. Never enlarges.
pub fn fit_inside(
    width: u32,
    height: u32,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let scale = [
        max_width.map(|w| w as f64 / width as f64),
        max_height.map(|h| h as f64 / height as f64),
    ]
    .into_iter()
    .flatten()
    .fold(1.0_f64, f64::min);

    if scale >= 1.0 {
        return (width, height);
    }

    let new_width = ((width as f64 * scale).round() as u32).clamp(1, width);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, height);
    (new_width, new_height)
}

/// Decode, resize and re-encode an image. CPU bound; call from a blocking task.
pub fn apply(data: &[u8], plan: &TransformPlan) -> ApiResult<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| ApiError::Processing(format!("Failed to decode image: {}", e)))?;

    let (width, height) = (img.width(), img.height());
    let (new_width, new_height) = fit_inside(width, height, plan.max_width, plan.max_height);

    let img = if (new_width, new_height) != (width, height) {
        tracing::debug!(width, height, new_width, new_height, "Resizing image");
        img.resize_exact(new_width, new_height, FilterType::Lanczos3)
    } else {
        img
    };

    let mut buf = Vec::new();
    let encoded = match plan.format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, plan.quality);
            // JPEG has no alpha channel
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        OutputFormat::Png => img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png),
        OutputFormat::WebP => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP),
        OutputFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Gif),
    };

    encoded.map_err(|e| {
        ApiError::Processing(format!("Failed to encode {}: {}", plan.format.name(), e))
    })?;

    Ok(buf)
}
