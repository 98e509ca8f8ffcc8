//! Runtime configuration shared by the `recent` binaries.
//!
//! Values come from an optional `recent.toml`, then `RECENT_*` environment
//! variables on top. The environment is passed in as a lookup function so
//! tests and callers control exactly what is seen.

use std::path::{Path, PathBuf};

use recent_core::filter::{DEFAULT_CHAR_LIMIT, DEFAULT_LIMIT};
use serde::{Deserialize, Serialize};

pub use recent_paths::CONFIG_FILE_NAME;

pub const ENV_DB: &str = "RECENT_DB";
pub const ENV_ENV_VARS: &str = "RECENT_ENV_VARS";
pub const ENV_CUSTOM_PROMPT: &str = "RECENT_CUSTOM_PROMPT";
pub const ENV_IMPORT_MARKER: &str = "RECENT_IMPORT_MARKER";
/// Older name of [`ENV_IMPORT_MARKER`], still honored.
pub const ENV_IMPORT_MARKER_COMPAT: &str = "RECENT_TEST_IMPORT_FILE";
pub const ENV_HISTFILE: &str = "HISTFILE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration (persisted as `recent.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RecentConfig {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub import: ImportSettings,
    #[serde(default)]
    pub query: QuerySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoreSettings {
    /// Database file; `~/.recent.db` when unset.
    #[serde(default)]
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CaptureSettings {
    /// Extra env var globs captured with each command (`RECENT_*` always is).
    #[serde(default)]
    pub env_vars: Vec<String>,
    /// Skip the `PROMPT_COMMAND` check in `recent`.
    #[serde(default)]
    pub custom_prompt: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ImportSettings {
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub histfile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuerySettings {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_char_limit")]
    pub char_limit: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            char_limit: default_char_limit(),
        }
    }
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}
fn default_char_limit() -> usize {
    DEFAULT_CHAR_LIMIT
}

impl RecentConfig {
    /// Read the config file at `path` (if it exists) and apply env overrides.
    pub fn load<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path.filter(|p| p.exists()) {
            Some(p) => {
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: p.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        config.apply_env(lookup);
        Ok(config)
    }

    /// Overlay environment variables. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(db) = get(ENV_DB) {
            self.store.db_path = Some(db);
        }
        if let Some(list) = get(ENV_ENV_VARS) {
            self.capture.env_vars = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if get(ENV_CUSTOM_PROMPT).is_some() {
            self.capture.custom_prompt = true;
        }
        if let Some(marker) = get(ENV_IMPORT_MARKER).or_else(|| get(ENV_IMPORT_MARKER_COMPAT)) {
            self.import.marker = Some(marker);
        }
        if let Some(histfile) = get(ENV_HISTFILE) {
            self.import.histfile = Some(histfile);
        }
    }

    pub fn db_path(&self, home: &Path) -> PathBuf {
        resolve(self.store.db_path.as_deref(), home)
            .unwrap_or_else(|| recent_paths::default_db_path(home))
    }

    pub fn import_marker(&self, home: &Path) -> PathBuf {
        resolve(self.import.marker.as_deref(), home)
            .unwrap_or_else(|| recent_paths::default_import_marker(home))
    }

    pub fn histfile(&self, home: &Path) -> PathBuf {
        resolve(self.import.histfile.as_deref(), home)
            .unwrap_or_else(|| recent_paths::default_histfile(home))
    }
}

// `~` expansion plus making relative paths home-relative.
fn resolve(raw: Option<&str>, home: &Path) -> Option<PathBuf> {
    let raw = raw?;
    let expanded = shellexpand::tilde_with_context(raw, || Some(home.to_string_lossy()));
    let path = PathBuf::from(expanded.as_ref());
    Some(if path.is_absolute() {
        path
    } else {
        home.join(path)
    })
}
