//! Derived variant generation.
//!
//! Produces a derived asset from its resolved original. The size is keyed by
//! the derived name's suffix:
//!
//! | Variant | Operation |
//! |---|---|
//! | `_t.jpg` | 150×150 thumbnail, center-cropped |
//! | `_c.jpg` | fit within 750×750 |
//! | `_l.jpg` | fit within 1600×1600 |
//! | anything else | unknown size, skipped |
//!
//! Also hosts the staleness rule used when revalidating found variants: a
//! derived file is stale when its original was modified strictly after it.

use crate::imaging::{BackendError, ImageBackend, Quality, ResizeParams, ThumbnailParams};
use crate::resolve::Variant;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Destination directory is not writable: {0}")]
    NotWritable(PathBuf),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
}

/// Target geometry for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePolicy {
    /// Exact size, cropped around the center.
    Thumbnail { width: u32, height: u32 },
    /// Fit inside a square bounding box, preserving aspect ratio.
    Fit { max: u32 },
}

impl SizePolicy {
    pub fn for_variant(variant: Variant) -> Option<Self> {
        match variant {
            Variant::Thumbnail => Some(SizePolicy::Thumbnail {
                width: 150,
                height: 150,
            }),
            Variant::Medium => Some(SizePolicy::Fit { max: 750 }),
            Variant::Large => Some(SizePolicy::Fit { max: 1600 }),
            Variant::Exact => None,
        }
    }
}

/// Result of one materialization attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    Generated(Variant),
    /// No size policy for this name; nothing was written.
    UnknownVariant,
}

/// Generates derived variants through an [`ImageBackend`].
pub struct Materializer<'a> {
    backend: &'a dyn ImageBackend,
    quality: Quality,
}

impl<'a> Materializer<'a> {
    pub fn new(backend: &'a dyn ImageBackend, quality: Quality) -> Self {
        Self { backend, quality }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Write `derived` from `original`, creating its directory if needed.
    pub fn materialize(
        &self,
        original: &Path,
        derived: &Path,
    ) -> Result<Materialized, MaterializeError> {
        let variant = Variant::of(&derived.to_string_lossy());
        let Some(policy) = SizePolicy::for_variant(variant) else {
            tracing::warn!(derived = %derived.display(), "unknown variant size");
            return Ok(Materialized::UnknownVariant);
        };

        if let Some(dir) = derived.parent() {
            ensure_writable_dir(dir)?;
        }

        tracing::info!(
            original = %original.display(),
            derived = %derived.display(),
            backend = self.backend.name(),
            "generating"
        );
        match policy {
            SizePolicy::Thumbnail { width, height } => {
                self.backend.thumbnail(&ThumbnailParams {
                    source: original.to_path_buf(),
                    output: derived.to_path_buf(),
                    width,
                    height,
                    quality: self.quality,
                })?;
            }
            SizePolicy::Fit { max } => {
                self.backend.resize(&ResizeParams {
                    source: original.to_path_buf(),
                    output: derived.to_path_buf(),
                    max_width: max,
                    max_height: max,
                    quality: self.quality,
                })?;
            }
        }
        Ok(Materialized::Generated(variant))
    }
}

/// Create `dir` if absent; an existing directory this process cannot write
/// to is an error.
pub fn ensure_writable_dir(dir: &Path) -> Result<(), MaterializeError> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)?;
        return Ok(());
    }
    if !can_write(dir) {
        return Err(MaterializeError::NotWritable(dir.to_path_buf()));
    }
    Ok(())
}

/// Ask the kernel, so ownership and ACLs count and not just the mode bits.
#[cfg(unix)]
fn can_write(dir: &Path) -> bool {
    rustix::fs::access(dir, rustix::fs::Access::WRITE_OK).is_ok()
}

#[cfg(not(unix))]
fn can_write(dir: &Path) -> bool {
    fs::metadata(dir).is_ok_and(|m| !m.permissions().readonly())
}

/// Whether `original` was modified strictly after `derived`.
pub fn is_stale(original: &Path, derived: &Path) -> std::io::Result<bool> {
    let original = fs::metadata(original)?.modified()?;
    let derived = fs::metadata(derived)?.modified()?;
    Ok(original > derived)
}
