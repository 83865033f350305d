//! Filesystem scanning.
//!
//! Walks the Jekyll source tree twice per run:
//!
//! 1. [`find_markdown_files`] discovers every page source.
//! 2. [`scan_tree`] lists the files under each asset directory, producing
//!    site-relative keys (`/_images/2013/11/IMG_1234_t.jpg`) directly
//!    comparable to reference-index keys.
//!
//! ## Layout
//!
//! ```text
//! source/                      # Source root
//! ├── _posts/                  # Dated posts (required)
//! │   └── 2013-11-27-foo.markdown
//! ├── _images/                 # Derived image variants (required)
//! │   └── 2013/11/IMG_1234_t.jpg
//! ├── assets/                  # Other referenced files
//! ├── images/                  # Loose originals (top level ignored)
//! └── about.markdown
//! ```
//!
//! ## Ignored files
//!
//! See [`is_ignored`]: OS metadata (`.DS_Store`), editor temp files (`.#name`,
//! `name~`, `.name.swp`), and loose files directly inside the legacy root
//! (`/images/` by default).
//!
//! Entries the walk cannot read (permission denied, dangling symlinks) are
//! logged and skipped; only the layout preconditions are fatal.

use crate::config::LayoutConfig;
use crate::naming::has_markdown_extension;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to determine source directory from {0}")]
    UnknownSourceDir(PathBuf),
    #[error("Source directory ({root}) is missing sub-directories: {}", .missing.join(", "))]
    MissingDirectories { root: PathBuf, missing: Vec<String> },
    #[error("Unable to find any markdown files from {0}")]
    NoMarkdown(PathBuf),
}

/// Platform metadata file written into every directory Finder opens.
const OS_METADATA: &str = ".DS_Store";

/// Locate the source root from a working directory.
///
/// - `…/_posts` or `…/_site` → its parent
/// - a directory containing `_posts` → itself
pub fn find_source_dir(dir: &Path, layout: &LayoutConfig) -> Result<PathBuf, ScanError> {
    let name = dir.file_name().map(|n| n.to_string_lossy());
    if let Some(name) = name
        && (name == layout.posts_dir.as_str() || name == "_site")
        && let Some(parent) = dir.parent()
    {
        return Ok(parent.to_path_buf());
    }
    if dir.join(&layout.posts_dir).is_dir() {
        return Ok(dir.to_path_buf());
    }
    Err(ScanError::UnknownSourceDir(dir.to_path_buf()))
}

/// Check that the posts directory and the scaled root both exist.
pub fn check_layout(root: &Path, layout: &LayoutConfig) -> Result<(), ScanError> {
    let missing: Vec<String> = [&layout.posts_dir, &layout.scaled_root]
        .into_iter()
        .filter(|d| !root.join(d.as_str()).is_dir())
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ScanError::MissingDirectories {
            root: root.to_path_buf(),
            missing,
        })
    }
}

/// Whether a site-relative key should never count as a found asset.
///
/// `legacy_prefix` is the slash-wrapped legacy root, e.g. `/images/`.
pub fn is_ignored(key: &str, legacy_prefix: &str) -> bool {
    let name = key.rsplit('/').next().unwrap_or(key);
    if key.ends_with(OS_METADATA) || key.contains("/.#") {
        return true;
    }
    if name.ends_with('~') || (name.starts_with('.') && name.ends_with(".swp")) {
        return true;
    }
    // Loose files at the top of the legacy root are originals, not variants.
    key.strip_prefix(legacy_prefix)
        .is_some_and(|rest| !rest.contains('/'))
}

/// Walk entries, logging and dropping the ones that cannot be read.
fn readable_entries(walk: WalkDir) -> impl Iterator<Item = walkdir::DirEntry> {
    walk.into_iter().filter_map(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!(path = ?e.path(), error = %e, "skipping unreadable entry");
            None
        }
    })
}

/// Convert a path under `root` into a `/`-separated site-relative key.
pub fn site_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(format!("/{}", parts.join("/")))
}

/// Recursively list files under `root/subdir` as site-relative keys.
///
/// Ignored files (see [`is_ignored`]) are dropped, then `keep` decides for
/// the rest. A missing `subdir` yields an empty set.
pub fn scan_tree<F, E>(
    root: &Path,
    layout: &LayoutConfig,
    subdir: &str,
    mut keep: F,
) -> Result<BTreeSet<String>, E>
where
    F: FnMut(&str) -> Result<bool, E>,
{
    let dir = root.join(subdir.trim_matches('/'));
    let legacy_prefix = layout.legacy_prefix();
    let mut found = BTreeSet::new();
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "asset directory absent");
        return Ok(found);
    }

    for entry in readable_entries(WalkDir::new(&dir).sort_by_file_name()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(key) = site_key(root, entry.path()) else {
            continue;
        };
        if is_ignored(&key, &legacy_prefix) || !keep(&key)? {
            continue;
        }
        found.insert(key);
    }

    tracing::debug!(subdir, count = found.len(), "scanned asset tree");
    Ok(found)
}

/// Find every markdown source under `root`, following symlinks.
///
/// A source's name starts with a digit or lowercase letter and ends in one of
/// the configured markdown extensions; editor backups and lock files fall out
/// of that rule naturally. Unreadable directories are skipped.
pub fn find_markdown_files(root: &Path, layout: &LayoutConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in readable_entries(WalkDir::new(root).follow_links(true).sort_by_file_name()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let starts_ok = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c.is_ascii_lowercase());
        if starts_ok && has_markdown_extension(&name, layout) {
            files.push(entry.into_path());
        }
    }
    files
}
