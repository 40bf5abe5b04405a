use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::cache::CacheSettings;
use crate::keys::DEFAULT_EVICTION_PRIORITY;
use crate::purge::PurgePlan;
use crate::quota::QuotaBudget;

/// Directory under the project root holding all tidemark state.
pub const TIDEMARK_DIR: &str = ".tidemark";

/// `<root>/.tidemark`
#[must_use]
pub fn state_dir(project_root: &Path) -> PathBuf {
    project_root.join(TIDEMARK_DIR)
}

/// `<root>/.tidemark/store.json`
#[must_use]
pub fn store_path(project_root: &Path) -> PathBuf {
    state_dir(project_root).join("store.json")
}

/// `<root>/.tidemark/archive.sqlite3`
#[must_use]
pub fn archive_path(project_root: &Path) -> PathBuf {
    state_dir(project_root).join("archive.sqlite3")
}

/// `<root>/.tidemark/config.toml`
#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    state_dir(project_root).join("config.toml")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub quota: QuotaBudget,
    #[serde(default)]
    pub eviction: EvictionConfig,
    #[serde(default)]
    pub purge: PurgePlan,
    #[serde(default)]
    pub store: StoreConfig,
}

impl ProjectConfig {
    /// Settings for a [`crate::cache::LocalCache`].
    #[must_use]
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            budget: self.quota,
            eviction_priority: self.eviction.priority.clone(),
            purge: self.purge.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionConfig {
    #[serde(default = "default_priority")]
    pub priority: Vec<String>,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            priority: default_priority(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Platform-style hard quota enforced by the on-disk store.
    #[serde(default)]
    pub hard_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Load `<root>/.tidemark/config.toml`, falling back to defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if its
/// `[quota]` section violates `safe_limit < report_limit`.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    config
        .quota
        .validate()
        .with_context(|| format!("Invalid [quota] in {}", path.display()))?;

    Ok(config)
}

/// Load `<config_dir>/tidemark/config.toml`, falling back to defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("tidemark/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project config, user config, and environment.
///
/// # Errors
///
/// Propagates project or user config load failures.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// Resolve the output mode: `--json` > `FORMAT` > user config > TTY.
#[must_use]
pub fn resolve_output(
    cli_json: bool,
    user_output: Option<&str>,
    env_format: Option<&str>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_priority() -> Vec<String> {
    DEFAULT_EVICTION_PRIORITY
        .iter()
        .map(ToString::to_string)
        .collect()
}
