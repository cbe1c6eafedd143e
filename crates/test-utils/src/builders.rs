#![allow(dead_code)]

use std::collections::BTreeMap;

use stepdag::config::{ConfigFile, ConfigSection, RawConfigFile, StepConfig, StepKind};
use stepdag::types::ExecutionMode;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                step: BTreeMap::new(),
            },
        }
    }

    pub fn with_step(mut self, id: &str, step: StepConfig) -> Self {
        self.config.step.insert(id.to_string(), step);
        self
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.config.config.mode = mode;
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.config.max_workers = Some(n);
        self
    }

    pub fn infer_resource_dependencies(mut self, val: bool) -> Self {
        self.config.config.infer_resource_dependencies = val;
        self
    }

    /// The raw file, for exercising validation errors.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StepConfig`.
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    fn blank(kind: StepKind) -> Self {
        Self {
            step: StepConfig {
                kind,
                cmd: vec![],
                cwd: None,
                path: None,
                dst: None,
                content: None,
                after: vec![],
                allow_failure: false,
                creates_files: vec![],
                creates_dirs: vec![],
                reads_files: vec![],
                requires_dirs: vec![],
            },
        }
    }

    pub fn shell(cmd: &[&str]) -> Self {
        let mut b = Self::blank(StepKind::Shell);
        b.step.cmd = cmd.iter().map(|s| s.to_string()).collect();
        b
    }

    pub fn file(kind: StepKind, path: &str) -> Self {
        let mut b = Self::blank(kind);
        b.step.path = Some(path.to_string());
        b
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.step.after.push(dep.to_string());
        self
    }

    pub fn dst(mut self, dst: &str) -> Self {
        self.step.dst = Some(dst.to_string());
        self
    }

    pub fn content(mut self, content: &str) -> Self {
        self.step.content = Some(content.to_string());
        self
    }

    pub fn allow_failure(mut self, val: bool) -> Self {
        self.step.allow_failure = val;
        self
    }

    pub fn creates_file(mut self, path: &str) -> Self {
        self.step.creates_files.push(path.to_string());
        self
    }

    pub fn creates_dir(mut self, path: &str) -> Self {
        self.step.creates_dirs.push(path.to_string());
        self
    }

    pub fn reads_file(mut self, path: &str) -> Self {
        self.step.reads_files.push(path.to_string());
        self
    }

    pub fn requires_dir(mut self, path: &str) -> Self {
        self.step.requires_dirs.push(path.to_string());
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}
