//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user config file only needs the keys it overrides, and
//! command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Release builds"
//! # commit_url = "https://github.com/owner/repo/commit/{id}"
//!
//! [pagination]
//! items_per_page = 10       # Builds per download page
//!
//! [history]
//! first_parent = false      # Follow only first parents in changelogs
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Page titles and links.
    pub site: SiteInfo,
    /// Download listing pagination.
    pub pagination: PaginationConfig,
    /// Changelog history queries.
    pub history: HistoryConfig,
    /// Parallel assembly settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.items_per_page == 0 {
            return Err(ConfigError::Validation(
                "pagination.items_per_page must be a positive integer".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be a positive integer".into(),
            ));
        }
        if let Some(url) = &self.site.commit_url
            && !url.contains("{id}")
        {
            return Err(ConfigError::Validation(
                "site.commit_url must contain the {id} placeholder".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Title shown in page headers.
    pub title: String,
    /// Link template for commits; `{id}` is replaced by the full commit id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_url: Option<String>,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "Release builds".to_string(),
            commit_url: None,
        }
    }
}

impl SiteInfo {
    /// Commit link for `id`, if a template is configured.
    pub fn commit_link(&self, id: &str) -> Option<String> {
        self.commit_url.as_ref().map(|url| url.replace("{id}", id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Builds per download page.
    pub items_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { items_per_page: 10 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Only follow the first parent of merges when listing commits.
    pub first_parent: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel assembly workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
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

/// Merge an optional overlay onto the stock defaults, deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file, or stock defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Release Site Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Title shown at the top of every page.
title = "Release builds"

# Link template for changelog entries. {id} is replaced by the full commit id.
# commit_url = "https://github.com/owner/repo/commit/{id}"

# ---------------------------------------------------------------------------
# Download listing
# ---------------------------------------------------------------------------
[pagination]
# Builds per download page. Must be a positive integer.
items_per_page = 10

# ---------------------------------------------------------------------------
# Changelog history
# ---------------------------------------------------------------------------
[history]
# Follow only the first parent of merge commits when listing the commits
# between two releases.
first_parent = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers used to assemble releases.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
