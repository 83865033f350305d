//! Image processing backend trait and shared error type.
//!
//! Two production backends implement [`ImageBackend`]:
//!
//! | Backend | Thumbnail | Fit |
//! |---|---|---|
//! | [`ConvertBackend`](super::convert_backend::ConvertBackend) | `convert -thumbnail WxH^ -gravity center -extent WxH` | `convert -resize WxH` |
//! | [`RustBackend`](super::rust_backend::RustBackend) | `resize_to_fill` (Lanczos3) | `resize` (Lanczos3) |

use super::params::{ResizeParams, ThumbnailParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("{program} exited with status {status:?}: {stderr}")]
    ToolFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Short label used in reports (`convert`, `builtin`).
    fn name(&self) -> &str;

    /// Fit the source inside the requested bounds, preserving aspect ratio.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Produce an exact-size, center-cropped thumbnail.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
