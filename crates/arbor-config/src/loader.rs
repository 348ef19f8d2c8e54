//! Loading `arbor.toml` layers: embedded defaults, user file, project file, env.
//!
//! 1. Parse embedded `defaults.toml` → base
//! 2. Apply environment fallbacks (`ARBOR_BASE_URL`, `ARBOR_LOG`)
//! 3. Merge the user config (`{config_dir}/arbor/config.toml`)
//! 4. Merge the explicit `--config` file
//! 5. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::Config;
use crate::validate;

/// Baseline values compiled into the binary.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Files larger than this are refused (1 MiB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Environment variable overriding `server.base_url`.
pub const ENV_BASE_URL: &str = "ARBOR_BASE_URL";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG: &str = "ARBOR_LOG";

/// Inputs to [`load`].
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// File given on the command line. Must exist if set.
    pub explicit_file: Option<PathBuf>,
    /// User config file. Skipped when missing.
    pub user_file: Option<PathBuf>,
    /// Environment snapshot.
    pub env: HashMap<String, String>,
}

impl ConfigSources {
    /// Sources for the running process: the standard user config location
    /// and the `ARBOR_*` environment variables.
    #[must_use]
    pub fn discover(explicit_file: Option<PathBuf>) -> Self {
        Self {
            explicit_file,
            user_file: user_config_path(),
            env: std::env::vars()
                .filter(|(key, _)| key.starts_with("ARBOR_"))
                .collect(),
        }
    }

    /// Set one environment entry.
    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_owned(), value.to_owned());
        self
    }
}

/// Location of the user config file, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "arbor").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Fully resolved configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Files that contributed, lowest precedence first.
    pub loaded_files: Vec<String>,
}

/// Load the configuration with layered precedence.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file cannot be read or parsed, the
/// explicit file is missing, or the merged configuration fails validation.
pub fn load(sources: &ConfigSources) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut loaded_files = Vec::new();

    let env_count = apply_env_fallbacks(&mut merged, &sources.env);
    if env_count > 0 {
        debug!(count = env_count, "ARBOR_* overrides applied");
    }

    if let Some(path) = &sources.user_file {
        if let Some(overlay) = try_load_file(path)? {
            deep_merge(&mut merged, &overlay);
            loaded_files.push(path.display().to_string());
            info!(path = %path.display(), "user config merged");
        }
    }

    if let Some(path) = &sources.explicit_file {
        let overlay = read_file(path)?;
        deep_merge(&mut merged, &overlay);
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded config file");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_files,
    })
}

fn set_string(root: &mut toml::Value, section: &str, key: &str, value: &str) {
    if let Some(table) = root.get_mut(section).and_then(toml::Value::as_table_mut) {
        table.insert(key.to_owned(), toml::Value::String(value.to_owned()));
    }
}

/// Apply `ARBOR_*` variables on top of the defaults. Returns how many applied.
fn apply_env_fallbacks(merged: &mut toml::Value, env: &HashMap<String, String>) -> usize {
    let mut applied = 0_usize;
    for (var, section, key) in [
        (ENV_BASE_URL, "server", "base_url"),
        (ENV_LOG, "logging", "level"),
    ] {
        if let Some(value) = env.get(var).filter(|v| !v.trim().is_empty()) {
            set_string(merged, section, key, value.trim());
            applied = applied.saturating_add(1);
        }
    }
    applied
}

fn parse_content(path: &Path, content: &str) -> ConfigResult<toml::Value> {
    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Read a file that must exist.
fn read_file(path: &Path) -> ConfigResult<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_content(path, &content)
}

/// Try to load a file, returning `None` if it doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_content(path, &content).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file here");
            Ok(None)
        },
        Err(e) => Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        }),
    }
}
