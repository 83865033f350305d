//! Tool configuration module.
//!
//! Handles loading, validating, and merging `site-assets.toml`. The file is
//! optional and lives in the site source root; stock defaults are overridden
//! key by key by whatever the user file specifies.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [layout]
//! posts_dir = "_posts"                  # Dated posts directory
//! scaled_root = "_images"               # Where derived image variants live
//! legacy_root = "images"                # `/images/...` references map onto scaled_root
//! asset_dirs = ["assets"]               # Extra asset directories to reconcile
//! markdown_extensions = ["markdown", "md"]
//! published_extension = "html"
//!
//! [originals]
//! roots = ["~/kuvat/original_jpg", "~/kuvat/jpg"]   # Searched in order
//!
//! [remediation]
//! validate_original = true              # Delete derived files older than their original
//! convert_missing = true                # Generate missing variants
//! skip = []                             # Derived paths never touched
//!
//! [tools]
//! backend = "convert"                   # "convert" (external) or "builtin"
//! program = "convert"                   # External resize program
//! rename = "git"                        # "git" (git mv -f) or "fs"
//! on_failure = "log"                    # "log" or "fatal"
//! quality = 90                          # JPEG quality for the builtin backend
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional config file in the source root.
pub const CONFIG_FILENAME: &str = "site-assets.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `site-assets.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory layout of the Jekyll source tree.
    pub layout: LayoutConfig,
    /// External archive of full-resolution originals.
    pub originals: OriginalsConfig,
    /// Fixer behavior.
    pub remediation: RemediationConfig,
    /// External tool invocation.
    pub tools: ToolsConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.posts_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "layout.posts_dir must not be empty".into(),
            ));
        }
        if self.layout.scaled_root.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "layout.scaled_root must not be empty".into(),
            ));
        }
        if self.layout.markdown_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "layout.markdown_extensions must not be empty".into(),
            ));
        }
        if self.tools.quality == 0 || self.tools.quality > 100 {
            return Err(ConfigError::Validation("tools.quality must be 1-100".into()));
        }
        Ok(())
    }
}

/// Directory layout of the site source tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Dated posts directory; its basenames carry a `yyyy-mm-dd-` prefix.
    pub posts_dir: String,
    /// Directory (relative to the source root) holding derived image variants.
    pub scaled_root: String,
    /// Legacy reference root rewritten onto `scaled_root`.
    pub legacy_root: String,
    /// Additional asset directories whose files are reconciled verbatim.
    pub asset_dirs: Vec<String>,
    /// Recognized markdown extensions, without the dot.
    pub markdown_extensions: Vec<String>,
    /// Extension of a published page.
    pub published_extension: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            posts_dir: "_posts".to_string(),
            scaled_root: "_images".to_string(),
            legacy_root: "images".to_string(),
            asset_dirs: vec!["assets".to_string()],
            markdown_extensions: vec!["markdown".to_string(), "md".to_string()],
            published_extension: "html".to_string(),
        }
    }
}

impl LayoutConfig {
    /// The scaled root as a site-relative key prefix, e.g. `/_images`.
    pub fn scaled_prefix(&self) -> String {
        format!("/{}", self.scaled_root.trim_matches('/'))
    }

    /// The legacy root as a site-relative key prefix, e.g. `/images/`.
    pub fn legacy_prefix(&self) -> String {
        format!("/{}/", self.legacy_root.trim_matches('/'))
    }

    /// Every directory whose contents form the found set: asset dirs first,
    /// then the scaled root.
    pub fn found_dirs(&self) -> Vec<String> {
        let mut dirs = self.asset_dirs.clone();
        dirs.push(self.scaled_root.clone());
        dirs
    }
}

/// External archive roots, searched in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OriginalsConfig {
    pub roots: Vec<String>,
}

impl Default for OriginalsConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                "~/kuvat/original_jpg".to_string(),
                "~/kuvat/jpg".to_string(),
            ],
        }
    }
}

impl OriginalsConfig {
    /// Archive roots with `~` expanded.
    pub fn expanded_roots(&self) -> Vec<PathBuf> {
        self.roots
            .iter()
            .map(|r| PathBuf::from(shellexpand::tilde(r).into_owned()))
            .collect()
    }
}

/// Fixer behavior toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemediationConfig {
    /// Delete derived files whose original is newer, forcing regeneration.
    pub validate_original: bool,
    /// Generate missing variants; when false, missing entries are only reported.
    pub convert_missing: bool,
    /// Derived paths (site-relative) the fixer never touches.
    pub skip: Vec<String>,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            validate_original: true,
            convert_missing: true,
            skip: Vec::new(),
        }
    }
}

/// Which materialization backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// External ImageMagick-compatible program.
    Convert,
    /// In-process resize with the `image` crate.
    Builtin,
}

/// How the date repair renames files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameMode {
    Git,
    Fs,
}

/// What a failed rename or resize does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure in the report and keep going.
    Log,
    /// Abort the run.
    Fatal,
}

/// External tool invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub backend: BackendKind,
    /// Program invoked by the `convert` backend.
    pub program: String,
    pub rename: RenameMode,
    pub on_failure: FailurePolicy,
    /// JPEG quality used by the builtin backend.
    pub quality: u32,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Convert,
            program: "convert".to_string(),
            rename: RenameMode::Git,
            on_failure: FailurePolicy::Log,
            quality: 90,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site-assets.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from the source root, merged over stock defaults and validated.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `site-assets.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# site-assets configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Place this file in the site source root (next to _posts/).
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Source tree layout
# ---------------------------------------------------------------------------
[layout]
# Dated posts; file names carry a yyyy-mm-dd- prefix.
posts_dir = "_posts"

# Directory holding generated image variants (thumbnail/medium/large).
scaled_root = "_images"

# References to /images/... are rewritten onto the scaled root.
legacy_root = "images"

# Further directories whose files must all be referenced by some page.
asset_dirs = ["assets"]

# Extensions recognized as markdown sources.
markdown_extensions = ["markdown", "md"]

# Extension of a published page (used to build url names).
published_extension = "html"

# ---------------------------------------------------------------------------
# Archive of full-resolution originals, searched in order
# ---------------------------------------------------------------------------
[originals]
roots = ["~/kuvat/original_jpg", "~/kuvat/jpg"]

# ---------------------------------------------------------------------------
# Remediation (the `fix` command)
# ---------------------------------------------------------------------------
[remediation]
# Delete derived images older than their original so they get regenerated.
validate_original = true

# Generate missing derived images from their originals.
convert_missing = true

# Derived paths that are never deleted or generated.
skip = []

# ---------------------------------------------------------------------------
# External tools
# ---------------------------------------------------------------------------
[tools]
# "convert" runs an ImageMagick-compatible program, "builtin" resizes in-process.
backend = "convert"
program = "convert"

# "git" renames with `git mv -f`, "fs" renames directly.
rename = "git"

# "log" records tool failures and continues, "fatal" aborts the run.
on_failure = "log"

# JPEG quality for the builtin backend (1-100).
quality = 90
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_layout() {
        let config = SiteConfig::default();
        assert_eq!(config.layout.posts_dir, "_posts");
        assert_eq!(config.layout.scaled_prefix(), "/_images");
        assert_eq!(config.layout.legacy_prefix(), "/images/");
        assert_eq!(config.layout.found_dirs(), vec!["assets", "_images"]);
    }

    #[test]
    fn default_config_tools() {
        let config = SiteConfig::default();
        assert_eq!(config.tools.backend, BackendKind::Convert);
        assert_eq!(config.tools.rename, RenameMode::Git);
        assert_eq!(config.tools.on_failure, FailurePolicy::Log);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[layout]
scaled_root = "../_images"

[tools]
on_failure = "fatal"
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.layout.scaled_root, "../_images");
        assert_eq!(config.tools.on_failure, FailurePolicy::Fatal);
        // Defaults preserved
        assert_eq!(config.layout.posts_dir, "_posts");
        assert!(config.remediation.convert_missing);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[layout]
scaled_rot = "_images"
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn expanded_roots_resolve_tilde() {
        let config = OriginalsConfig {
            roots: vec!["/abs/originals".to_string(), "~/kuvat".to_string()],
        };
        let roots = config.expanded_roots();
        assert_eq!(roots[0], PathBuf::from("/abs/originals"));
        assert!(!roots[1].to_string_lossy().starts_with('~'));
    }

    #[test]
    fn merge_toml_overrides_nested_keys() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[tools]\nquality = 70\n").unwrap();
        let merged: SiteConfig = merge_toml(base, overlay).try_into().unwrap();
        assert_eq!(merged.tools.quality, 70);
        assert_eq!(merged.tools.program, "convert");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[originals]\nroots = [\"/srv/originals\"]\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.originals.roots, vec!["/srv/originals"]);
        assert_eq!(config.layout.scaled_root, "_images");
    }

    #[test]
    fn load_config_rejects_bad_quality() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[tools]\nquality = 0\n").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_config_rejects_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[layout\n").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }
}
