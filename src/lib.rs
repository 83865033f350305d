//! # Site Assets
//!
//! Keeps a Jekyll source tree and its image tree in agreement. Every page is
//! scanned for embedded asset references; every file under the asset
//! directories is listed; the two sets are diffed:
//!
//! ```text
//! waste   = found − referenced     files nobody links to
//! missing = referenced − found     links to files that are not there
//! ```
//!
//! `check` reports both. `fix` deletes waste, deletes derived variants whose
//! original has changed, and regenerates missing thumbnail/medium/large
//! variants from an external archive of full-resolution originals.
//!
//! # Pipeline
//!
//! ```text
//! 1. Open      source root       →  Session        (layout check, config)
//! 2. Scan      _posts/, pages    →  ReferenceIndex (repair → url name → extract)
//! 3. Validate  _images/, assets/ →  Report         (diff + per-entry policy)
//! ```
//!
//! Nothing is persisted between runs: the index is rebuilt from the sources
//! every time.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`extract`] | Pulls asset paths out of one markdown line |
//! | [`scan`] | Source-root detection, layout check, markdown discovery, asset tree listing |
//! | [`naming`] | Url-name derivation and `yyyy-mm-dd-` prefix parsing |
//! | [`repair`] | Renames posts whose date prefix disagrees with their front matter |
//! | [`index`] | Reference index and url-name uniqueness table |
//! | [`reconcile`] | `Session`, the set diff, and the found/waste/missing policy traits |
//! | [`policy`] | `ReportOnly` and `Remediate` strategies |
//! | [`resolve`] | Maps a derived variant back to its original in the archive |
//! | [`materialize`] | Size policy, directory checks and staleness for variant generation |
//! | [`imaging`] | `ImageBackend` trait with `convert` and pure-Rust implementations |
//! | [`config`] | `site-assets.toml` loading, merging over stock defaults, validation |
//! | [`output`] | Report formatting for the CLI |
//!
//! # Design Decisions
//!
//! ## Pattern Matching, Not Parsing
//!
//! Pages are never parsed as markdown. [`extract`] recognizes a handful of
//! shapes (bracket links, quote- or space-delimited paths, `slide`/`cover`
//! directives) line by line. Anything else is invisible to it, which keeps
//! false positives out of the waste report.
//!
//! ## Strategies Instead of Subclasses
//!
//! The finder and the fixer share the whole scan/diff pipeline and differ only
//! in what happens per entry. That difference is the
//! [`reconcile::FoundPolicy`], [`reconcile::WastePolicy`] and
//! [`reconcile::MissingPolicy`] traits, implemented by
//! [`policy::ReportOnly`] and [`policy::Remediate`].
//!
//! ## Checked External Tools
//!
//! `git mv` and `convert` run as child processes and their exit status is
//! always inspected. `tools.on_failure` chooses whether a failure is recorded
//! in the report (`log`) or ends the run (`fatal`).

pub mod config;
pub mod extract;
pub mod imaging;
pub mod index;
pub mod materialize;
pub mod naming;
pub mod output;
pub mod policy;
pub mod reconcile;
pub mod repair;
pub mod resolve;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
