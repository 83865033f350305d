//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how*. The
//! [`materialize`](crate::materialize) module decides which variant to build;
//! a [`backend`](super::backend) does the pixel work. Swapping backends (an
//! external `convert`, the in-process `image` crate, or a recording mock in
//! tests) never touches the sizing logic.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Aspect-preserving resize that fits inside `max_width` × `max_height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

/// Fill-resize then center-crop to exactly `width` × `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
