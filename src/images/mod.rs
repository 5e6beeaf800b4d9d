//! Slide image normalization.
//!
//! Uploaded screenshots are bounded to a maximum size and re-encoded as lossy
//! WebP before they are stored, so slides load quickly whatever the operator
//! drops into the editor.

use std::ops::Deref;

use image::{DynamicImage, GenericImageView, imageops::FilterType};
use webp::Encoder;

pub const WEBP_EXTENSION: &str = "webp";
pub const WEBP_CONTENT_TYPE: &str = "image/webp";

pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;
pub const DEFAULT_QUALITY: f32 = 0.85;

#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
    #[error("invalid image input: {0}")]
    InvalidInput(String),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Bounds applied to every normalized image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Lossy quality in `(0, 1]`.
    pub quality: f32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// A user-supplied file as received from the browser.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A bounded, WebP-encoded image ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl NormalizedImage {
    pub fn content_type(&self) -> &'static str {
        WEBP_CONTENT_TYPE
    }

    pub fn extension(&self) -> &'static str {
        WEBP_EXTENSION
    }
}

/// Compute output dimensions for an image of `width` x `height`.
///
/// Images inside the bounds keep their size. Larger ones are scaled by
/// `min(max_width / width, max_height / height)`, preserving aspect ratio.
pub fn scale_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    // Every dimension is at least one pixel
    let (max_width, max_height) = (max_width.max(1), max_height.max(1));
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = (f64::from(max_width) / f64::from(width))
        .min(f64::from(max_height) / f64::from(height));

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = |dim: u32, bound: u32| ((f64::from(dim) * scale).round() as u32).clamp(1, bound);

    (scaled(width, max_width), scaled(height, max_height))
}

/// Replace the file extension with `.webp`.
fn webp_file_name(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    };
    let stem = if stem.is_empty() { "image" } else { stem };
    format!("{stem}.{WEBP_EXTENSION}")
}

/// Decode, bound and re-encode an uploaded image.
pub fn normalize(raw: &RawImage, options: &NormalizeOptions) -> Result<NormalizedImage, NormalizeError> {
    if !raw.content_type.starts_with("image/") {
        return Err(NormalizeError::InvalidInput(format!(
            "expected an image, got '{}'",
            raw.content_type
        )));
    }
    if raw.bytes.is_empty() {
        return Err(NormalizeError::InvalidInput("empty file".to_string()));
    }
    if !(options.quality > 0.0 && options.quality <= 1.0) {
        return Err(NormalizeError::InvalidInput(format!(
            "quality must be in (0, 1], got {}",
            options.quality
        )));
    }
    if options.max_width == 0 || options.max_height == 0 {
        return Err(NormalizeError::InvalidInput("bounds must be non-zero".to_string()));
    }

    let mut img = image::load_from_memory(&raw.bytes)?;

    let (w, h) = img.dimensions();
    let (w_scaled, h_scaled) = scale_dimensions(w, h, options.max_width, options.max_height);
    if (w_scaled, h_scaled) != (w, h) {
        img = img.resize_exact(w_scaled, h_scaled, FilterType::Triangle);
    }

    // The WebP encoder only accepts 8-bit RGB or RGBA buffers
    let img = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let encoder = Encoder::from_image(&img).map_err(|reason| NormalizeError::Encode(reason.to_string()))?;
    let bytes = encoder.encode(options.quality * 100.0).deref().to_owned();
    if bytes.is_empty() {
        return Err(NormalizeError::Encode("encoder produced no output".to_string()));
    }

    log::debug!(
        "Normalized '{}' {}x{} -> {}x{} ({} bytes)",
        raw.file_name, w, h, w_scaled, h_scaled, bytes.len()
    );

    Ok(NormalizedImage {
        file_name: webp_file_name(&raw.file_name),
        width: w_scaled,
        height: h_scaled,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webp_file_name_replaces_extension() {
        assert_eq!(webp_file_name("screenshot.png"), "screenshot.webp");
        assert_eq!(webp_file_name("archive.tar.gz"), "archive.tar.webp");
        assert_eq!(webp_file_name("noext"), "noext.webp");
        assert_eq!(webp_file_name(".hidden"), ".hidden.webp");
        assert_eq!(webp_file_name(""), "image.webp");
    }

    #[test]
    fn scale_keeps_small_images() {
        assert_eq!(scale_dimensions(800, 600, 1920, 1080), (800, 600));
        assert_eq!(scale_dimensions(1920, 1080, 1920, 1080), (1920, 1080));
    }

    #[test]
    fn scale_treats_zero_bounds_as_one_pixel() {
        assert_eq!(scale_dimensions(800, 600, 0, 1080), (1, 1));
        assert_eq!(scale_dimensions(800, 600, 0, 0), (1, 1));
        assert_eq!(scale_dimensions(1, 1, 0, 0), (1, 1));
    }
}
