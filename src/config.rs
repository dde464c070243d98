//! Configuration loading
//!
//! Looks for `.stack-pr.toml` at the repository root first, then
//! `<config dir>/stack-pr/config.toml`. Missing files mean defaults.

use crate::error::{Error, Result};
use crate::merge::ReadinessGates;
use crate::types::MergeMethod;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Repo-local config filename
pub const REPO_CONFIG_FILE: &str = ".stack-pr.toml";

/// Directory name under the user config dir
const CONFIG_DIR: &str = "stack-pr";

/// Global config filename
const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Remote to push to and fetch from
    pub remote: String,
    /// Branch the stack lands on
    pub target: String,
    /// Reviewers requested on newly created PRs
    pub reviewers: Vec<String>,
    /// Create new PRs as drafts
    pub draft: bool,
    /// Push settings
    pub push: PushConfig,
    /// Merge settings
    pub merge: MergeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            target: "main".to_string(),
            reviewers: Vec::new(),
            draft: false,
            push: PushConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

/// Push settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PushConfig {
    /// Use a single atomic multi-ref push
    pub atomic: bool,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self { atomic: true }
    }
}

/// Merge settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct MergeConfig {
    /// Merge strategy
    pub method: MergeMethod,
    /// Only merge approved PRs
    pub require_approval: bool,
    /// Only merge PRs with green checks
    pub require_checks: bool,
    /// Ask before merging a PR whose readiness is uncertain
    pub confirm: bool,
    /// Seconds to wait after retargeting before merging
    pub settle_secs: u64,
    /// Delete the head branch after merging
    pub delete_branch: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            method: MergeMethod::Rebase,
            require_approval: true,
            require_checks: true,
            confirm: true,
            settle_secs: 5,
            delete_branch: false,
        }
    }
}

impl MergeConfig {
    /// Readiness gates derived from this config
    pub const fn gates(&self) -> ReadinessGates {
        ReadinessGates {
            require_checks: self.require_checks,
            require_approval: self.require_approval,
        }
    }

    /// Settle delay as a duration
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

/// Path of the global config file, if a config dir exists
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load config for a repository
///
/// Repo-local config wins over the global file; neither existing yields defaults.
pub fn load_config(repo_root: &Path) -> Result<Config> {
    let repo_path = repo_root.join(REPO_CONFIG_FILE);
    if repo_path.exists() {
        return load_config_file(&repo_path);
    }

    if let Some(global) = global_config_path()
        && global.exists()
    {
        return load_config_file(&global);
    }

    debug!("no config file found, using defaults");
    Ok(Config::default())
}

/// Load and parse a single config file
pub fn load_config_file(path: &Path) -> Result<Config> {
    debug!(path = %path.display(), "loading config");
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}
