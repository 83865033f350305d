//! Bundled reconciliation strategies.
//!
//! | Strategy | Found asset | Waste | Missing |
//! |---|---|---|---|
//! | [`ReportOnly`] | kept | reported | reported with referrers |
//! | [`Remediate`] | skip list dropped; stale variants deleted | deleted | original resolved, variant generated |
//!
//! [`Remediate`] applies the tool failure policy: with `log`, a failed delete
//! or generation is recorded in the report and the run carries on; with
//! `fatal`, it aborts the run. An unwritable destination directory always
//! aborts.

use crate::config::{FailurePolicy, SiteConfig};
use crate::imaging::{ImageBackend, Quality};
use crate::materialize::{MaterializeError, Materialized, Materializer, is_stale};
use crate::reconcile::{
    FoundPolicy, FoundVerdict, MissingAction, MissingPolicy, ReconcileError, WasteAction,
    WastePolicy,
};
use crate::resolve::OriginalResolver;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Reports waste and missing assets without touching anything.
#[derive(Debug, Default)]
pub struct ReportOnly;

impl FoundPolicy for ReportOnly {
    fn check_found(&mut self, _key: &str) -> Result<FoundVerdict, ReconcileError> {
        Ok(FoundVerdict::Keep)
    }
}

impl WastePolicy for ReportOnly {
    fn on_waste(&mut self, _key: &str) -> Result<WasteAction, ReconcileError> {
        Ok(WasteAction::Reported)
    }
}

impl MissingPolicy for ReportOnly {
    fn on_missing(
        &mut self,
        _key: &str,
        _referrers: &[String],
    ) -> Result<MissingAction, ReconcileError> {
        Ok(MissingAction::Reported)
    }
}

/// Deletes waste and stale variants, regenerates missing variants.
pub struct Remediate<'a> {
    root: PathBuf,
    scaled_prefix: String,
    resolver: OriginalResolver,
    materializer: Materializer<'a>,
    skip: BTreeSet<String>,
    validate_original: bool,
    convert_missing: bool,
    on_failure: FailurePolicy,
}

impl<'a> Remediate<'a> {
    pub fn new(root: &Path, config: &SiteConfig, backend: &'a dyn ImageBackend) -> Self {
        let scaled_prefix = config.layout.scaled_prefix();
        Self {
            root: root.to_path_buf(),
            resolver: OriginalResolver::new(
                config.originals.expanded_roots(),
                scaled_prefix.clone(),
            ),
            scaled_prefix,
            materializer: Materializer::new(backend, Quality::new(config.tools.quality)),
            skip: config.remediation.skip.iter().cloned().collect(),
            validate_original: config.remediation.validate_original,
            convert_missing: config.remediation.convert_missing,
            on_failure: config.tools.on_failure,
        }
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.root.join(key.trim_start_matches('/'))
    }

    fn is_scaled(&self, key: &str) -> bool {
        key.strip_prefix(&self.scaled_prefix)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl FoundPolicy for Remediate<'_> {
    fn check_found(&mut self, key: &str) -> Result<FoundVerdict, ReconcileError> {
        if self.skip.contains(key) {
            return Ok(FoundVerdict::Skip);
        }
        if !self.validate_original || !self.is_scaled(key) {
            return Ok(FoundVerdict::Keep);
        }
        let Some(original) = self.resolver.resolve(key)? else {
            return Ok(FoundVerdict::Keep);
        };
        let derived = self.path_of(key);
        if !is_stale(&original, &derived)? {
            return Ok(FoundVerdict::Keep);
        }

        tracing::info!(derived = %derived.display(), original = %original.display(), "unlink stale");
        match fs::remove_file(&derived) {
            Ok(()) => Ok(FoundVerdict::Stale { original }),
            Err(e) if self.on_failure == FailurePolicy::Log => {
                tracing::warn!(path = %derived.display(), error = %e, "unable to remove stale file");
                Ok(FoundVerdict::Keep)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl WastePolicy for Remediate<'_> {
    fn on_waste(&mut self, key: &str) -> Result<WasteAction, ReconcileError> {
        let path = self.path_of(key);
        tracing::info!(path = %path.display(), "unlink waste");
        match fs::remove_file(&path) {
            Ok(()) => Ok(WasteAction::Deleted),
            Err(e) if self.on_failure == FailurePolicy::Log => {
                tracing::warn!(path = %path.display(), error = %e, "unable to remove waste");
                Ok(WasteAction::Failed {
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl MissingPolicy for Remediate<'_> {
    fn on_missing(
        &mut self,
        key: &str,
        _referrers: &[String],
    ) -> Result<MissingAction, ReconcileError> {
        if self.skip.contains(key) {
            return Ok(MissingAction::Skipped);
        }
        if !self.convert_missing || !self.is_scaled(key) {
            return Ok(MissingAction::Reported);
        }
        let Some(original) = self.resolver.resolve(key)? else {
            return Ok(MissingAction::OriginalMissing);
        };

        match self.materializer.materialize(&original, &self.path_of(key)) {
            Ok(Materialized::Generated(variant)) => {
                Ok(MissingAction::Generated { original, variant })
            }
            Ok(Materialized::UnknownVariant) => Ok(MissingAction::UnknownVariant { original }),
            Err(MaterializeError::Backend(e)) if self.on_failure == FailurePolicy::Log => {
                tracing::warn!(
                    key,
                    backend = self.materializer.backend_name(),
                    error = %e,
                    "generation failed"
                );
                Ok(MissingAction::Failed {
                    original,
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
