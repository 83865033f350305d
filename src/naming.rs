//! Url-name derivation for source pages.
//!
//! Every markdown source maps to one published identifier, its *url name*:
//!
//! - `_posts/2013-11-27-foo-bar.markdown` → `foo-bar.html` (date prefix stripped)
//! - `foo-bar.markdown` → `foo-bar.html`
//! - `foo-bar/index.markdown` → `foo-bar.html` (index takes its directory's name)
//!
//! Posts carry a fixed-width `yyyy-mm-dd-` prefix on their basename; see
//! [`parse_date_prefix`].

use crate::config::LayoutConfig;
use std::path::Path;

/// Width of the `yyyy-mm-dd-` prefix on post filenames.
pub const DATE_PREFIX_LEN: usize = "yyyy-mm-dd-".len();

/// Derive the url name of a markdown source file.
pub fn get_url(path: &Path, layout: &LayoutConfig) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = if is_post(path, layout) {
        match parse_date_prefix(&stem) {
            Some(_) => stem[DATE_PREFIX_LEN..].to_string(),
            None => stem,
        }
    } else if stem == "index" {
        path.parent()
            .and_then(Path::file_name)
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or(stem)
    } else {
        stem
    };

    format!("{name}.{}", layout.published_extension)
}

/// Whether `path` lies under the dated-posts directory.
pub fn is_post(path: &Path, layout: &LayoutConfig) -> bool {
    path.parent()
        .is_some_and(|p| p.components().any(|c| c.as_os_str() == layout.posts_dir.as_str()))
}

/// Whether `name` ends in one of the recognized markdown extensions.
pub fn has_markdown_extension(name: &str, layout: &LayoutConfig) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| layout.markdown_extensions.iter().any(|m| m == e))
}

/// Parse the `yyyy-mm-dd` date from a `yyyy-mm-dd-name` basename.
///
/// Only the shape is checked (digits and dashes in the right places), not
/// calendar validity.
pub fn parse_date_prefix(basename: &str) -> Option<&str> {
    let prefix = basename.get(..DATE_PREFIX_LEN)?;
    let date = prefix.get(..DATE_PREFIX_LEN - 1)?;
    (is_date(date) && prefix.ends_with('-')).then_some(date)
}

/// `yyyy-mm-dd` shape check.
pub fn is_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
