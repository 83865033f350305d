//! CLI output formatting for reconciliation runs.
//!
//! # Line Contract
//!
//! Every entry is one line, tagged by category, with the site-relative path
//! single-quoted so it can be grepped and copy-pasted:
//!
//! ```text
//! RENAMED: '_posts/2013-11-27-foo.markdown' → '_posts/2013-12-01-foo.markdown'
//! STALE: '/_images/2013/11/IMG_1_t.jpg' (original: /home/u/kuvat/jpg/2013/11/IMG_1.jpg)
//! WASTE: '/_images/2013/11/IMG_9_t.jpg'
//! DELETED: '/_images/2013/11/IMG_9_t.jpg'
//! MISSING: '/_images/2013/11/IMG_2_c.jpg' (foo.html, bar.html)
//! GENERATED: '/_images/2013/11/IMG_2_c.jpg' (medium, from /home/u/kuvat/jpg/2013/11/IMG_2.jpg)
//! UNKNOWN SIZE: '/_images/2013/11/IMG_3.jpg'
//! FAILED: '/_images/2013/11/IMG_4_l.jpg' (convert exited with status Some(1): ...)
//! ```
//!
//! Originals that could not be found are held back and listed together at
//! the end, since they need a human to fix the archive:
//!
//! ```text
//! !!! Original image missing for:
//! !!! /_images/2013/11/IMG_5_t.jpg references: foo.html
//! ```
//!
//! # Architecture
//!
//! [`format_report`] returns `Vec<String>` for testability and
//! [`print_report`] writes to stdout. [`format_report_json`] renders the same
//! report for `--format json`.

use crate::reconcile::{MissingAction, MissingEntry, Report, WasteAction};
use crate::repair::RepairOutcome;
use crate::resolve::Variant;
use std::path::Path;

fn variant_label(variant: Variant) -> &'static str {
    match variant {
        Variant::Thumbnail => "thumbnail",
        Variant::Medium => "medium",
        Variant::Large => "large",
        Variant::Exact => "exact",
    }
}

/// Source paths are shown relative to the root when possible.
fn display_rel(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn format_repair(root: &Path, outcome: &RepairOutcome) -> Option<String> {
    match outcome {
        RepairOutcome::Unchanged => None,
        RepairOutcome::Renamed { from, to } => Some(format!(
            "RENAMED: '{}' → '{}'",
            display_rel(root, from),
            display_rel(root, to)
        )),
        RepairOutcome::Failed { from, to, reason } => Some(format!(
            "FAILED: '{}' → '{}' ({})",
            display_rel(root, from),
            display_rel(root, to),
            reason
        )),
    }
}

fn format_missing(entry: &MissingEntry) -> Option<String> {
    let path = &entry.path;
    match &entry.action {
        MissingAction::Reported => Some(format!(
            "MISSING: '{}' ({})",
            path,
            entry.referrers.join(", ")
        )),
        MissingAction::Skipped | MissingAction::OriginalMissing => None,
        MissingAction::Generated { original, variant } => Some(format!(
            "GENERATED: '{}' ({}, from {})",
            path,
            variant_label(*variant),
            original.display()
        )),
        MissingAction::UnknownVariant { .. } => Some(format!("UNKNOWN SIZE: '{}'", path)),
        MissingAction::Failed { reason, .. } => Some(format!("FAILED: '{}' ({})", path, reason)),
    }
}

/// Render a run as report lines, in run order.
pub fn format_report(report: &Report) -> Vec<String> {
    let mut lines = Vec::new();

    lines.extend(
        report
            .repairs
            .iter()
            .filter_map(|r| format_repair(&report.root, r)),
    );

    for stale in &report.stale {
        lines.push(format!(
            "STALE: '{}' (original: {})",
            stale.path,
            stale.original.display()
        ));
    }

    for waste in &report.waste {
        lines.push(match &waste.action {
            WasteAction::Reported => format!("WASTE: '{}'", waste.path),
            WasteAction::Deleted => format!("DELETED: '{}'", waste.path),
            WasteAction::Failed { reason } => format!("FAILED: '{}' ({})", waste.path, reason),
        });
    }

    lines.extend(report.missing.iter().filter_map(format_missing));

    let mut originals = report.originals_missing().peekable();
    if originals.peek().is_some() {
        lines.push("!!! Original image missing for:".to_string());
        for entry in originals {
            lines.push(format!(
                "!!! {} references: {}",
                entry.path,
                entry.referrers.join(", ")
            ));
        }
    }

    lines
}

/// One-line run summary, printed after the report.
pub fn format_summary(report: &Report) -> String {
    let originals = report.originals_missing().count();
    let mut summary = format!(
        "Checked {} pages: {} waste, {} missing",
        report.pages,
        report.waste.len(),
        report.missing.len()
    );
    if originals > 0 {
        summary.push_str(&format!(", {} without original", originals));
    }
    let failures = report.failures();
    if failures > 0 {
        summary.push_str(&format!(", {} failed", failures));
    }
    summary
}

pub fn print_report(report: &Report) {
    for line in format_report(report) {
        println!("{}", line);
    }
    println!("{}", format_summary(report));
}

pub fn format_report_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub fn print_report_json(report: &Report) -> Result<(), serde_json::Error> {
    println!("{}", format_report_json(report)?);
    Ok(())
}
