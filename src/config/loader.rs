// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a workflow file without semantic checks.
///
/// Use [`load_and_validate`] for the checked [`ConfigFile`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), steps = config.step.len(), "loaded workflow file");

    Ok(config)
}

/// Read a workflow file and validate it.
///
/// Checks that there is at least one step, that every `after` entry names
/// another existing step, and that each step has the fields its kind needs.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `Stepdag.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Stepdag.toml")
}
