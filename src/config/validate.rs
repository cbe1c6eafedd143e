// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, StepConfig, StepKind};
use crate::errors::{Result, StepdagError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = StepdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.step))
    }
}

/// Cycles are left to the graph, which reports them in detail.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_steps(cfg)?;
    validate_global_config(cfg)?;
    validate_step_dependencies(cfg)?;
    for (id, step) in cfg.step.iter() {
        validate_step_fields(id, step)?;
    }
    Ok(())
}

fn ensure_has_steps(cfg: &RawConfigFile) -> Result<()> {
    if cfg.step.is_empty() {
        return Err(StepdagError::ConfigError(
            "config must contain at least one [step.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.max_workers == Some(0) {
        return Err(StepdagError::ConfigError(
            "[config].max_workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_step_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (id, step) in cfg.step.iter() {
        for dep in step.after.iter() {
            if dep == id {
                return Err(StepdagError::ConfigError(format!(
                    "step '{id}' cannot depend on itself in `after`"
                )));
            }
            if !cfg.step.contains_key(dep) {
                return Err(StepdagError::ConfigError(format!(
                    "step '{id}' has unknown dependency '{dep}' in `after`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_step_fields(id: &str, step: &StepConfig) -> Result<()> {
    let missing = |field: &str| {
        StepdagError::ConfigError(format!(
            "step '{id}' of kind {:?} requires `{field}`",
            step.kind
        ))
    };

    match step.kind {
        StepKind::Shell => {
            if step.cmd.is_empty() {
                return Err(missing("cmd"));
            }
        }
        kind => {
            if step.path.as_deref().is_none_or(str::is_empty) {
                return Err(missing("path"));
            }
            if kind.file_op().is_some_and(|op| op.needs_destination()) && step.dst.is_none() {
                return Err(missing("dst"));
            }
            if kind == StepKind::Write && step.content.is_none() {
                return Err(missing("content"));
            }
        }
    }
    Ok(())
}
