//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Fit resize | `image::DynamicImage::resize` with `Lanczos3` |
//! | Thumbnail crop | `image::DynamicImage::resize_to_fill` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with configured quality |
//! | Encode → PNG / WebP | `image` crate, format from the output extension |

use super::backend::{BackendError, ImageBackend};
use super::params::{ResizeParams, ThumbnailParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// In-process backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode by output extension. JPEG honors `quality`; JPEG cannot carry
/// alpha, so the image is flattened to RGB first.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => {
            let file = std::fs::File::create(path).map_err(BackendError::Io)?;
            let writer = std::io::BufWriter::new(file);
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality as u8);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
        }
        "png" => img
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e))),
        "webp" => img
            .save_with_format(path, ImageFormat::WebP)
            .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {}", e))),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            other
        ))),
    }
}

impl ImageBackend for RustBackend {
    fn name(&self) -> &str {
        "builtin"
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize(params.max_width, params.max_height, FilterType::Lanczos3);
        save_image(&resized, &params.output, params.quality.value())
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let filled = img.resize_to_fill(params.width, params.height, FilterType::Lanczos3);
        save_image(&filled, &params.output, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use image::{ImageEncoder, RgbImage};

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    #[test]
    fn resize_fits_within_bounds() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("IMG_1.JPG");
        create_test_jpeg(&source, 400, 300);
        let output = tmp.path().join("IMG_1_c.jpg");

        RustBackend::new()
            .resize(&ResizeParams {
                source,
                output: output.clone(),
                max_width: 200,
                max_height: 200,
                quality: Quality::new(85),
            })
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (200, 150));
    }

    #[test]
    fn thumbnail_is_exact_square() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("IMG_1.jpg");
        create_test_jpeg(&source, 600, 800);
        let output = tmp.path().join("IMG_1_t.jpg");

        RustBackend::new()
            .thumbnail(&ThumbnailParams {
                source,
                output: output.clone(),
                width: 150,
                height: 150,
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (150, 150));
    }

    #[test]
    fn resize_nonexistent_source_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = RustBackend::new().resize(&ResizeParams {
            source: tmp.path().join("missing.jpg"),
            output: tmp.path().join("out.jpg"),
            max_width: 10,
            max_height: 10,
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn unsupported_output_format_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        create_test_jpeg(&source, 20, 20);

        let result = RustBackend::new().resize(&ResizeParams {
            source,
            output: tmp.path().join("a.bmp"),
            max_width: 10,
            max_height: 10,
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }
}
