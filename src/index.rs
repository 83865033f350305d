//! Reference index: which pages reference which assets.
//!
//! Built from scratch on every run. Keys are normalized site-relative asset
//! paths; legacy `/images/...` references are rewritten onto the scaled root
//! before they are recorded, so `/images/2013/a.jpg` and
//! `/_images/2013/a.jpg` are the same key.
//!
//! [`UrlTable`] sits next to it and enforces that no two source files publish
//! under the same url name.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Found duplicate url {url} on following files: {}, {}", .first.display(), .second.display())]
pub struct DuplicateUrl {
    pub url: String,
    pub first: PathBuf,
    pub second: PathBuf,
}

/// Rewrites legacy-root references onto the scaled-images root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledRewrite {
    legacy_prefix: String,
    scaled_prefix: String,
}

impl ScaledRewrite {
    /// `legacy` and `scaled` are directory names relative to the site root,
    /// e.g. `images` and `_images`.
    pub fn new(legacy: &str, scaled: &str) -> Self {
        Self {
            legacy_prefix: format!("/{}/", legacy.trim_matches('/')),
            scaled_prefix: format!("/{}/", scaled.trim_matches('/')),
        }
    }

    /// `/images/2013/a.jpg` → `/_images/2013/a.jpg`; other paths unchanged.
    pub fn apply(&self, path: &str) -> String {
        match path.strip_prefix(&self.legacy_prefix) {
            Some(rest) => format!("{}{rest}", self.scaled_prefix),
            None => path.to_string(),
        }
    }
}

/// Asset path → url names of the pages referencing it.
///
/// Referrers keep first-appearance order; a page referencing the same asset
/// twice is listed twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceIndex {
    links: BTreeMap<String, Vec<String>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reference from `url_name` to `asset`.
    pub fn record(&mut self, asset: String, url_name: &str) {
        self.links.entry(asset).or_default().push(url_name.to_string());
    }

    /// Pages referencing `asset`, in the order they were recorded.
    pub fn referrers(&self, asset: &str) -> &[String] {
        self.links.get(asset).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.links.contains_key(asset)
    }

    /// Every referenced asset path.
    pub fn assets(&self) -> BTreeSet<String> {
        self.links.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.links.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Url name → the source file publishing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlTable {
    names: BTreeMap<String, PathBuf>,
}

impl UrlTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `url` for `source`. Claiming again from the same file is fine;
    /// a different file is a [`DuplicateUrl`].
    pub fn claim(&mut self, url: &str, source: &Path) -> Result<(), DuplicateUrl> {
        match self.names.entry(url.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(source.to_path_buf());
                Ok(())
            }
            Entry::Occupied(slot) if slot.get() == source => Ok(()),
            Entry::Occupied(slot) => Err(DuplicateUrl {
                url: url.to_string(),
                first: slot.get().clone(),
                second: source.to_path_buf(),
            }),
        }
    }

    pub fn source(&self, url: &str) -> Option<&Path> {
        self.names.get(url).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
