//! Reconciliation of page references against the asset tree.
//!
//! A [`Session`] owns the per-run state: the [`ReferenceIndex`] and the
//! [`UrlTable`]. It runs in two phases:
//!
//! ```text
//! open      check that the posts dir and scaled root exist
//! scan      every markdown source: repair filename → url name → extract → index
//! validate  found set (filtered by FoundPolicy) vs referenced set
//!           waste   = found − referenced  → WastePolicy
//!           missing = referenced − found  → MissingPolicy
//! ```
//!
//! What happens to each found, waste and missing entry is decided by the
//! policy passed to [`Session::validate`]; see [`crate::policy`] for the
//! report-only and remediating strategies. The set difference itself is the
//! pure function [`diff`].

use crate::config::SiteConfig;
use crate::extract::Extractor;
use crate::index::{DuplicateUrl, ReferenceIndex, ScaledRewrite, UrlTable};
use crate::materialize::MaterializeError;
use crate::naming::get_url;
use crate::repair::{RepairError, RepairOutcome, Renamer, fix_filename};
use crate::resolve::{ResolveError, Variant};
use crate::scan::{ScanError, check_layout, find_markdown_files, scan_tree};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    DuplicateUrl(#[from] DuplicateUrl),
    #[error(transparent)]
    Repair(#[from] RepairError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

/// The two sides of the set difference, each sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub waste: Vec<String>,
    pub missing: Vec<String>,
}

/// `waste = found − referenced`, `missing = referenced − found`.
pub fn diff(found: &BTreeSet<String>, referenced: &BTreeSet<String>) -> Reconciliation {
    Reconciliation {
        waste: found.difference(referenced).cloned().collect(),
        missing: referenced.difference(found).cloned().collect(),
    }
}

/// What to do with a file found in the asset tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoundVerdict {
    /// Counts as present.
    Keep,
    /// Never counted and never touched.
    Skip,
    /// Was out of date and has been removed; counts as absent.
    Stale { original: PathBuf },
}

/// Decides whether a found asset is still valid.
pub trait FoundPolicy {
    fn check_found(&mut self, key: &str) -> Result<FoundVerdict, ReconcileError>;
}

/// Handles a found asset no page references.
pub trait WastePolicy {
    fn on_waste(&mut self, key: &str) -> Result<WasteAction, ReconcileError>;
}

/// Handles a referenced asset that is not on disk.
pub trait MissingPolicy {
    fn on_missing(&mut self, key: &str, referrers: &[String])
    -> Result<MissingAction, ReconcileError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WasteAction {
    Reported,
    Deleted,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingAction {
    Reported,
    /// Listed in the skip list.
    Skipped,
    Generated { original: PathBuf, variant: Variant },
    UnknownVariant { original: PathBuf },
    OriginalMissing,
    Failed { original: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleEntry {
    pub path: String,
    pub original: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WasteEntry {
    pub path: String,
    pub action: WasteAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingEntry {
    pub path: String,
    pub referrers: Vec<String>,
    pub action: MissingAction,
}

/// Everything one run observed and did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub root: PathBuf,
    pub pages: usize,
    pub repairs: Vec<RepairOutcome>,
    pub stale: Vec<StaleEntry>,
    pub waste: Vec<WasteEntry>,
    pub missing: Vec<MissingEntry>,
}

impl Report {
    /// Missing entries whose original could not be found in any archive.
    pub fn originals_missing(&self) -> impl Iterator<Item = &MissingEntry> {
        self.missing
            .iter()
            .filter(|m| m.action == MissingAction::OriginalMissing)
    }

    /// Count of tool failures that were logged rather than raised.
    pub fn failures(&self) -> usize {
        let repairs = self
            .repairs
            .iter()
            .filter(|r| matches!(r, RepairOutcome::Failed { .. }))
            .count();
        let waste = self
            .waste
            .iter()
            .filter(|w| matches!(w.action, WasteAction::Failed { .. }))
            .count();
        let missing = self
            .missing
            .iter()
            .filter(|m| matches!(m.action, MissingAction::Failed { .. }))
            .count();
        repairs + waste + missing
    }
}

/// Per-run reconciliation state for one source root.
#[derive(Debug)]
pub struct Session {
    root: PathBuf,
    config: SiteConfig,
    extractor: Extractor,
    rewrite: ScaledRewrite,
    index: ReferenceIndex,
    urls: UrlTable,
    pages: usize,
    repairs: Vec<RepairOutcome>,
}

impl Session {
    /// Start a session; the source root must have the required layout.
    pub fn open(root: &Path, config: SiteConfig) -> Result<Self, ReconcileError> {
        check_layout(root, &config.layout)?;
        let layout = &config.layout;
        let mut roots = vec![layout.legacy_root.clone()];
        roots.extend(layout.asset_dirs.iter().cloned());
        roots.push(layout.scaled_root.clone());

        Ok(Self {
            root: root.to_path_buf(),
            extractor: Extractor::new(roots),
            rewrite: ScaledRewrite::new(&layout.legacy_root, &layout.scaled_root),
            index: ReferenceIndex::new(),
            urls: UrlTable::new(),
            pages: 0,
            repairs: Vec::new(),
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    pub fn urls(&self) -> &UrlTable {
        &self.urls
    }

    /// Index every markdown source under the root.
    pub fn scan(&mut self, renamer: &dyn Renamer) -> Result<(), ReconcileError> {
        let files = find_markdown_files(&self.root, &self.config.layout);
        if files.is_empty() {
            return Err(ScanError::NoMarkdown(self.root.clone()).into());
        }
        tracing::info!(root = %self.root.display(), count = files.len(), "scanning sources");
        for file in &files {
            self.scan_page(file, renamer)?;
        }
        tracing::info!(
            pages = self.pages,
            assets = self.index.len(),
            "reference index built"
        );
        Ok(())
    }

    /// Index one source: repair its name, claim its url, record its links.
    pub fn scan_page(&mut self, path: &Path, renamer: &dyn Renamer) -> Result<(), ReconcileError> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = text.lines().collect();

        let repaired = fix_filename(path, &lines, renamer, self.config.tools.on_failure)?;
        if repaired.outcome != RepairOutcome::Unchanged {
            self.repairs.push(repaired.outcome.clone());
        }

        let url = get_url(&repaired.path, &self.config.layout);
        self.urls.claim(&url, &repaired.path)?;
        self.pages += 1;

        for line in &lines {
            for asset in self.extractor.extract(line) {
                self.index.record(self.rewrite.apply(&asset), &url);
            }
        }
        Ok(())
    }

    /// Diff the asset tree against the index and hand each entry to `policy`.
    pub fn validate<P>(&self, policy: &mut P) -> Result<Report, ReconcileError>
    where
        P: FoundPolicy + WastePolicy + MissingPolicy,
    {
        let mut report = Report {
            root: self.root.clone(),
            pages: self.pages,
            repairs: self.repairs.clone(),
            ..Report::default()
        };

        let mut found = BTreeSet::new();
        for dir in self.config.layout.found_dirs() {
            let kept = scan_tree(&self.root, &self.config.layout, &dir, |key| {
                Ok::<_, ReconcileError>(match policy.check_found(key)? {
                    FoundVerdict::Keep => true,
                    FoundVerdict::Skip => false,
                    FoundVerdict::Stale { original } => {
                        report.stale.push(StaleEntry {
                            path: key.to_string(),
                            original,
                        });
                        false
                    }
                })
            })?;
            found.extend(kept);
        }

        let referenced = self.index.assets();
        let Reconciliation { waste, missing } = diff(&found, &referenced);
        tracing::info!(
            found = found.len(),
            referenced = referenced.len(),
            waste = waste.len(),
            missing = missing.len(),
            "reconciled"
        );

        for key in waste {
            let action = policy.on_waste(&key)?;
            report.waste.push(WasteEntry { path: key, action });
        }
        for key in missing {
            let referrers = self.index.referrers(&key).to_vec();
            let path = self.rewrite.apply(&key);
            let action = policy.on_missing(&path, &referrers)?;
            report.missing.push(MissingEntry {
                path,
                referrers,
                action,
            });
        }
        Ok(report)
    }
}
