//! Data and configuration locations.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DATA_DIR_ENV: &str = "JOTIN_DATA_DIR";
const APP_DIR_NAME: &str = "jotin";
const CONFIG_FILE_NAME: &str = "config.json";

/// Resolve the data directory: explicit override, then `JOTIN_DATA_DIR`,
/// then the platform data directory.
pub fn resolve_data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    resolve_data_dir_with(override_dir, |key| std::env::var(key).ok())
}

pub fn resolve_data_dir_with(
    override_dir: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }

    if let Some(dir) = lookup(DATA_DIR_ENV).filter(|value| !value.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(Error::NoDataDir)
}

/// `<config dir>/jotin/config.json`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
