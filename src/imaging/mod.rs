//! Image processing backends for derived-variant generation.
//!
//! | Operation | External (`convert`) | Builtin (`image` crate) |
//! |---|---|---|
//! | **Thumbnail** | `-thumbnail WxH^ -gravity center -extent WxH` | `resize_to_fill` |
//! | **Fit** | `-resize WxH` | `resize` |
//!
//! The module is split into:
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`ConvertBackend`] + [`RustBackend`]

pub mod backend;
pub mod convert_backend;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use convert_backend::ConvertBackend;
pub use params::{Quality, ResizeParams, ThumbnailParams};
pub use rust_backend::RustBackend;

use crate::config::{BackendKind, ToolsConfig};

/// Build the backend selected by `[tools]`.
pub fn backend_from_config(tools: &ToolsConfig) -> Box<dyn ImageBackend> {
    match tools.backend {
        BackendKind::Convert => Box::new(ConvertBackend::new(tools.program.clone())),
        BackendKind::Builtin => Box::new(RustBackend::new()),
    }
}
