//! Shared test utilities for the site-assets test suite.
//!
//! [`SiteFixture`] builds a throwaway Jekyll source tree (with the required
//! `_posts/` and `_images/` directories) next to a separate originals
//! archive, so tests can lay out exactly the files they need.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = SiteFixture::new();
//! site.post("2013-11-27-foo.markdown", "2013-11-27", "![a](/images/a_t.jpg)\n");
//! site.file("_images/b_t.jpg");
//! site.original("IMG_1.jpg");
//!
//! let report = check(&site);
//! assert_eq!(waste_paths(&report), vec!["/_images/b_t.jpg"]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::policy::ReportOnly;
use crate::reconcile::{Report, Session};
use crate::repair::FsRenamer;

// =========================================================================
// Fixture setup
// =========================================================================

/// A temporary source root plus a temporary originals archive.
pub struct SiteFixture {
    site: TempDir,
    archive: TempDir,
}

impl SiteFixture {
    /// Empty site with `_posts/` and `_images/` in place.
    pub fn new() -> Self {
        let site = TempDir::new().unwrap();
        fs::create_dir_all(site.path().join("_posts")).unwrap();
        fs::create_dir_all(site.path().join("_images")).unwrap();
        Self {
            site,
            archive: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.site.path()
    }

    pub fn archive(&self) -> &Path {
        self.archive.path()
    }

    /// Write `_posts/<name>` with a single-quoted front-matter date.
    pub fn post(&self, name: &str, date: &str, body: &str) -> PathBuf {
        let text = format!("---\nlayout: post\ndate: '{date}'\n---\n{body}");
        write(&self.root().join("_posts").join(name), &text)
    }

    /// Write a page at `rel` (relative to the source root).
    pub fn page(&self, rel: &str, body: &str) -> PathBuf {
        write(&self.root().join(rel), &format!("---\nlayout: page\n---\n{body}"))
    }

    /// Create a placeholder asset at `rel` under the source root.
    pub fn file(&self, rel: &str) -> PathBuf {
        write(&self.root().join(rel), "x")
    }

    /// Create a placeholder original at `rel` under the archive.
    pub fn original(&self, rel: &str) -> PathBuf {
        write(&self.archive().join(rel), "o")
    }
}

fn write(path: &Path, contents: &str) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
    path.to_path_buf()
}

// =========================================================================
// Runs and report extractors
// =========================================================================

/// Scan and validate with the report-only strategy and default config.
pub fn check(site: &SiteFixture) -> Report {
    let mut session = Session::open(site.root(), SiteConfig::default()).unwrap();
    session.scan(&FsRenamer).unwrap();
    session.validate(&mut ReportOnly).unwrap()
}

pub fn waste_paths(report: &Report) -> Vec<&str> {
    report.waste.iter().map(|w| w.path.as_str()).collect()
}

pub fn missing_paths(report: &Report) -> Vec<&str> {
    report.missing.iter().map(|m| m.path.as_str()).collect()
}
