//! External-tool backend: shells out to an ImageMagick-compatible program.
//!
//! ```text
//! convert -thumbnail 150x150^ -gravity center -extent 150x150 SRC DST
//! convert -resize 750x750 SRC DST
//! ```
//!
//! The program's exit status is always checked; a nonzero exit becomes
//! [`BackendError::ToolFailed`] carrying the status and captured stderr.

use super::backend::{BackendError, ImageBackend};
use super::params::{ResizeParams, ThumbnailParams};
use std::ffi::OsString;
use std::process::Command;

/// Runs `convert` (or a configured substitute such as `magick`).
#[derive(Debug, Clone)]
pub struct ConvertBackend {
    program: String,
}

impl ConvertBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for a fit-within resize.
    pub fn resize_args(params: &ResizeParams) -> Vec<OsString> {
        vec![
            "-resize".into(),
            format!("{}x{}", params.max_width, params.max_height).into(),
            params.source.clone().into_os_string(),
            params.output.clone().into_os_string(),
        ]
    }

    /// Arguments for a fill-and-crop thumbnail.
    pub fn thumbnail_args(params: &ThumbnailParams) -> Vec<OsString> {
        let size = format!("{}x{}", params.width, params.height);
        vec![
            "-thumbnail".into(),
            format!("{size}^").into(),
            "-gravity".into(),
            "center".into(),
            "-extent".into(),
            size.into(),
            params.source.clone().into_os_string(),
            params.output.clone().into_os_string(),
        ]
    }

    fn run(&self, args: &[OsString]) -> Result<(), BackendError> {
        let printable: Vec<_> = args.iter().map(|a| a.to_string_lossy()).collect();
        tracing::info!(program = %self.program, args = %printable.join(" "), "invoking");

        let output = Command::new(&self.program).args(args).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(BackendError::ToolFailed {
                program: self.program.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl Default for ConvertBackend {
    fn default() -> Self {
        Self::new("convert")
    }
}

impl ImageBackend for ConvertBackend {
    fn name(&self) -> &str {
        &self.program
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        self.run(&Self::resize_args(params))
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        self.run(&Self::thumbnail_args(params))
    }
}
