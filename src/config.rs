//! Engine configuration stored as TOML.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Directory name for cherry-pick-bot within the user config directory.
const CONFIG_DIR: &str = "cherry-pick-bot";

/// Filename for the configuration.
const CONFIG_FILE: &str = "config.toml";

/// What to do when a scratch branch already exists at an unexpected commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleRefPolicy {
    /// Delete the leftover ref and create it again at the expected commit.
    #[default]
    Recreate,
    /// Refuse to touch it and report `AlreadyExists`.
    Fail,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// API base URL, e.g. `https://github.example.com/api/v3`.
    pub api_url: Option<String>,
    /// Handling of scratch refs left behind by a crashed run.
    pub stale_ref_policy: StaleRefPolicy,
    /// Open a pull request instead when a direct target requires reviews.
    pub fallback_to_pull_request: bool,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            stale_ref_policy: StaleRefPolicy::Recreate,
            fallback_to_pull_request: true,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<()> {
        if let Some(api_url) = &self.api_url {
            let url = Url::parse(api_url)
                .map_err(|e| Error::Config(format!("invalid api_url '{api_url}': {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "api_url must be http(s), got '{api_url}'"
                )));
            }
        }
        Ok(())
    }
}

/// Default config file location, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration from `path`, or the default location when `None`.
///
/// Returns defaults if the file doesn't exist.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        return Ok(EngineConfig::default());
    };

    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let config: EngineConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

    config.validate()?;
    Ok(config)
}

/// Save configuration to `path`, creating parent directories.
pub fn save_config(path: &Path, config: &EngineConfig) -> Result<()> {
    config.validate()?;

    if let Some(dir) = path.parent()
        && !dir.exists()
    {
        fs::create_dir_all(dir)
            .map_err(|e| Error::Config(format!("failed to create {}: {e}", dir.display())))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;

    fs::write(path, format!("# cherry-pick-bot configuration\n\n{content}"))
        .map_err(|e| Error::Config(format!("failed to write {}: {e}", path.display())))?;

    Ok(())
}
