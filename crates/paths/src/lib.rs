//! Default on-disk locations used by the `recent` binaries.

use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};

pub const CONFIG_FILE_NAME: &str = "recent.toml";

const DB_FILE_NAME: &str = ".recent.db";
const IMPORT_MARKER_FILE_NAME: &str = ".recent_imported_bash_history";
const BASH_HISTORY_FILE_NAME: &str = ".bash_history";

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("could not determine home directory")]
    NoHomeDir,
    #[error("could not determine config directory")]
    NoConfigDir,
}

pub fn home_dir() -> Result<PathBuf, PathError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(PathError::NoHomeDir)
}

/// `~/.recent.db`
pub fn default_db_path(home: &Path) -> PathBuf {
    home.join(DB_FILE_NAME)
}

/// `~/.recent_imported_bash_history`, touched after a history import.
pub fn default_import_marker(home: &Path) -> PathBuf {
    home.join(IMPORT_MARKER_FILE_NAME)
}

/// `~/.bash_history`
pub fn default_histfile(home: &Path) -> PathBuf {
    home.join(BASH_HISTORY_FILE_NAME)
}

/// Platform config directory, e.g. `~/.config/recent/` on Linux.
pub fn config_dir() -> Result<PathBuf, PathError> {
    ProjectDirs::from("", "", "recent")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(PathError::NoConfigDir)
}

pub fn config_path() -> Result<PathBuf, PathError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}
