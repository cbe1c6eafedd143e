// src/config/mod.rs

//! Workflow file loading and validation.
//!
//! - `model.rs`: TOML data model and the validated [`ConfigFile`].
//! - `loader.rs`: reading from disk.
//! - `validate.rs`: field and `after` checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, StepConfig, StepKind};
