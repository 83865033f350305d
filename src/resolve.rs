//! Derived asset → original image resolution.
//!
//! Derived variants are named after their original with a size suffix:
//!
//! | Derived | Variant | Original stem |
//! |---|---|---|
//! | `/_images/2013/11/IMG_1234_t.jpg` | thumbnail (150×150 crop) | `2013/11/IMG_1234` |
//! | `/_images/2013/11/IMG_1234_c.jpg` | medium (fit 750) | `2013/11/IMG_1234` |
//! | `/_images/2013/11/IMG_1234_l.jpg` | large (fit 1600) | `2013/11/IMG_1234` |
//! | `/_images/2013/11/IMG_1234.jpg` | exact | `2013/11/IMG_1234` |
//!
//! The stem is looked up under each archive root in order with any
//! extension, first as-is and then with the file name's leading `IMG_`
//! lowercased to `img_`. The first hit wins.

use glob::{MatchOptions, Pattern};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Which size a derived asset is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// `_t.jpg`
    Thumbnail,
    /// `_c.jpg`
    Medium,
    /// `_l.jpg`
    Large,
    /// No size suffix.
    Exact,
}

impl Variant {
    const SUFFIXES: [(&'static str, Variant); 3] = [
        ("_t.jpg", Variant::Thumbnail),
        ("_c.jpg", Variant::Medium),
        ("_l.jpg", Variant::Large),
    ];

    /// Classify a derived path by its suffix.
    pub fn of(path: &str) -> Self {
        Self::SUFFIXES
            .iter()
            .find(|(suffix, _)| path.ends_with(suffix))
            .map(|(_, v)| *v)
            .unwrap_or(Variant::Exact)
    }

    pub fn suffix(self) -> Option<&'static str> {
        Self::SUFFIXES
            .iter()
            .find(|(_, v)| *v == self)
            .map(|(suffix, _)| *suffix)
    }
}

/// The archive-relative stem of a derived asset, e.g. `2013/11/IMG_1234`.
///
/// `scaled_prefix` is the site-relative scaled root (`/_images`). Paths
/// outside it have no original.
pub fn original_stem(derived: &str, scaled_prefix: &str) -> Option<String> {
    let rel = derived
        .strip_prefix(scaled_prefix.trim_end_matches('/'))?
        .strip_prefix('/')?;
    let stem = match Variant::of(rel).suffix() {
        Some(suffix) => rel.strip_suffix(suffix)?,
        None => {
            let name_start = rel.rfind('/').map(|i| i + 1).unwrap_or(0);
            match rel[name_start..].rfind('.') {
                Some(dot) if dot > 0 => &rel[..name_start + dot],
                _ => rel,
            }
        }
    };
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Looks up originals across an ordered list of archive roots.
#[derive(Debug, Clone)]
pub struct OriginalResolver {
    roots: Vec<PathBuf>,
    scaled_prefix: String,
}

impl OriginalResolver {
    pub fn new(roots: Vec<PathBuf>, scaled_prefix: impl Into<String>) -> Self {
        Self {
            roots,
            scaled_prefix: scaled_prefix.into(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Find the original for `derived`, or `None` if no archive has it.
    pub fn resolve(&self, derived: &str) -> Result<Option<PathBuf>, ResolveError> {
        let Some(stem) = original_stem(derived, &self.scaled_prefix) else {
            return Ok(None);
        };
        let mut candidates = vec![stem.clone()];
        candidates.extend(fold_camera_prefix(&stem));

        for root in &self.roots {
            for candidate in &candidates {
                if let Some(hit) = first_match(root, candidate)? {
                    tracing::debug!(derived, original = %hit.display(), "resolved original");
                    return Ok(Some(hit));
                }
            }
        }
        Ok(None)
    }
}

/// `2013/IMG_1` → `2013/img_1`. Only the basename's leading `IMG_` folds.
fn fold_camera_prefix(stem: &str) -> Option<String> {
    let (dir, name) = match stem.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, stem),
    };
    let rest = name.strip_prefix("IMG_")?;
    Some(match dir {
        Some(dir) => format!("{dir}/img_{rest}"),
        None => format!("img_{rest}"),
    })
}

/// First file matching `<root>/<stem>.*`, in glob's (sorted) order.
fn first_match(root: &std::path::Path, stem: &str) -> Result<Option<PathBuf>, ResolveError> {
    let pattern = format!(
        "{}/{}.*",
        Pattern::escape(&root.to_string_lossy()),
        Pattern::escape(stem)
    );
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let hit = glob::glob_with(&pattern, options)?
        .filter_map(Result::ok)
        .find(|p| p.is_file());
    Ok(hit)
}
