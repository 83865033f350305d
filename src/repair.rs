//! Filename repair: keep a post's date prefix in sync with its front matter.
//!
//! A post's `yyyy-mm-dd-` prefix and its front-matter `date: '...'` field can
//! drift apart when a post is re-dated by hand. Before its url name is
//! derived, each source runs through [`fix_filename`], which renames the file
//! on disk to the date the front matter declares and returns the corrected
//! path. Running it again on the repaired file is a no-op.
//!
//! Only the single-quoted form is recognized:
//!
//! ```text
//! ---
//! date: '2013-11-27 10:00'
//! layout: post
//! ---
//! ```

use crate::config::{FailurePolicy, RenameMode};
use crate::naming::{DATE_PREFIX_LEN, is_date, parse_date_prefix};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepairError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{program} exited with status {status:?} renaming {from} → {to}")]
    ToolFailed {
        program: String,
        status: Option<i32>,
        from: PathBuf,
        to: PathBuf,
    },
}

/// Moves a file to a new name.
pub trait Renamer {
    fn rename(&self, from: &Path, to: &Path) -> Result<(), RepairError>;
}

/// Renames through `git mv -f`, keeping history attached to the new name.
#[derive(Debug, Default)]
pub struct GitRenamer;

impl Renamer for GitRenamer {
    fn rename(&self, from: &Path, to: &Path) -> Result<(), RepairError> {
        let mut cmd = Command::new("git");
        cmd.arg("mv").arg("-f").arg(from).arg(to);
        if let Some(dir) = from.parent().filter(|d| !d.as_os_str().is_empty()) {
            cmd.current_dir(dir);
        }
        tracing::info!(from = %from.display(), to = %to.display(), "git mv -f");
        let status = cmd.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(RepairError::ToolFailed {
                program: "git mv".to_string(),
                status: status.code(),
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            })
        }
    }
}

/// Renames directly on the filesystem.
#[derive(Debug, Default)]
pub struct FsRenamer;

impl Renamer for FsRenamer {
    fn rename(&self, from: &Path, to: &Path) -> Result<(), RepairError> {
        tracing::info!(from = %from.display(), to = %to.display(), "rename");
        std::fs::rename(from, to)?;
        Ok(())
    }
}

/// Build the renamer selected by `tools.rename`.
pub fn renamer_from_config(mode: RenameMode) -> Box<dyn Renamer> {
    match mode {
        RenameMode::Git => Box::new(GitRenamer),
        RenameMode::Fs => Box::new(FsRenamer),
    }
}

/// What the repair step did to one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepairOutcome {
    Unchanged,
    Renamed { from: PathBuf, to: PathBuf },
    /// The rename failed and the failure policy said to carry on.
    Failed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
}

/// A source path after repair, plus what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repaired {
    pub path: PathBuf,
    pub outcome: RepairOutcome,
}

/// The `yyyy-mm-dd` date declared by the front matter, if any.
///
/// Only lines between the opening and closing `---` are considered; the last
/// `date:` line wins.
pub fn front_matter_date<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    let mut lines = lines.iter().map(|l| l.as_ref().trim_end());
    if lines.next()? != "---" {
        return None;
    }

    let mut date = None;
    for line in lines.take_while(|l| *l != "---") {
        if let Some(value) = line.strip_prefix("date: '").and_then(|v| v.strip_suffix('\'')) {
            let day = value.split_whitespace().next().unwrap_or_default();
            if is_date(day) {
                date = Some(day.to_string());
            }
        }
    }
    date
}

/// The name `path` should have given its front matter, if it differs.
pub fn planned_rename<S: AsRef<str>>(path: &Path, lines: &[S]) -> Option<PathBuf> {
    let basename = path.file_name()?.to_str()?;
    let current = parse_date_prefix(basename)?;
    let declared = front_matter_date(lines)?;
    if current == declared {
        return None;
    }
    let fixed = format!("{declared}{}", &basename[DATE_PREFIX_LEN - 1..]);
    Some(path.with_file_name(fixed))
}

/// Rename `path` to match its front-matter date and return the path to use
/// from now on.
///
/// Under [`FailurePolicy::Log`] a failed rename leaves the file where it was
/// and is reported as [`RepairOutcome::Failed`]; under
/// [`FailurePolicy::Fatal`] it is returned as an error.
pub fn fix_filename<S: AsRef<str>>(
    path: &Path,
    lines: &[S],
    renamer: &dyn Renamer,
    on_failure: FailurePolicy,
) -> Result<Repaired, RepairError> {
    let Some(target) = planned_rename(path, lines) else {
        return Ok(Repaired {
            path: path.to_path_buf(),
            outcome: RepairOutcome::Unchanged,
        });
    };

    match renamer.rename(path, &target) {
        Ok(()) => Ok(Repaired {
            path: target.clone(),
            outcome: RepairOutcome::Renamed {
                from: path.to_path_buf(),
                to: target,
            },
        }),
        Err(e) if on_failure == FailurePolicy::Log => {
            tracing::warn!(path = %path.display(), error = %e, "rename failed");
            Ok(Repaired {
                path: path.to_path_buf(),
                outcome: RepairOutcome::Failed {
                    from: path.to_path_buf(),
                    to: target,
                    reason: e.to_string(),
                },
            })
        }
        Err(e) => Err(e),
    }
}
