// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated model.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML and applies defaults.
/// - Checks job bodies (`cmd` / `output`, progress patterns).
/// - Checks `after` references and dependency cycles, and fixes the
///   submission order.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Batchpool.toml")
}
