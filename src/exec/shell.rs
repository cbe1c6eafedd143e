// src/exec/shell.rs

//! Shell steps: run an argument vector as a child process and capture output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::exec::driver::Driver;
use crate::exec::request::{OperationResult, Request};
use crate::types::OperationType;

/// Runs processes for [`ShellRequest`]s.
#[derive(Debug, Clone, Default)]
pub struct ShellDriver {
    /// Working directory used when a request doesn't set its own.
    pub default_cwd: Option<PathBuf>,
    /// Extra environment variables for every process.
    pub env: Vec<(String, String)>,
}

impl ShellDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_cwd = Some(dir.into());
        self
    }

    /// Working directory for a request. A relative `cwd` is taken from
    /// `default_cwd`.
    pub fn resolve_cwd(&self, cwd: Option<&Path>) -> Option<PathBuf> {
        match (cwd, self.default_cwd.as_deref()) {
            (Some(dir), Some(base)) if dir.is_relative() => Some(base.join(dir)),
            (Some(dir), _) => Some(dir.to_path_buf()),
            (None, base) => base.map(Path::to_path_buf),
        }
    }

    /// Spawn `argv[0]` with the remaining arguments and wait for it.
    pub fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<Output> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("empty command"))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = self.resolve_cwd(cwd) {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd.output()
            .with_context(|| format!("spawning process {:?}", program))
    }
}

/// A command line to run through a [`ShellDriver`].
#[derive(Debug, Clone)]
pub struct ShellRequest {
    pub cmd: Vec<String>,
    pub cwd: Option<String>,
    pub allow_failure: bool,
    pub name: Option<String>,
}

impl ShellRequest {
    pub fn new<I, S>(cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into_iter().map(Into::into).collect(),
            cwd: None,
            allow_failure: false,
            name: None,
        }
    }

    pub fn cwd(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn allow_failure(mut self, allow: bool) -> Self {
        self.allow_failure = allow;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn run(&self, driver: &Driver) -> Result<OperationResult> {
        let shell = driver
            .downcast_ref::<ShellDriver>()
            .ok_or_else(|| anyhow!("shell request requires a ShellDriver, got {:?}", driver))?;

        let line = self.cmd.join(" ");
        info!(cmd = %line, "running shell command");

        let output = shell.run(&self.cmd, self.cwd.as_deref().map(Path::new))?;
        let code = output.status.code().unwrap_or(-1);
        debug!(cmd = %line, exit_code = code, "shell command exited");

        let mut result = if output.status.success() {
            OperationResult::success()
        } else {
            OperationResult::failure(format!("command exited with status {code}"))
        };
        result.returncode = Some(code);
        result.stdout = Some(String::from_utf8_lossy(&output.stdout).into_owned());
        result.stderr = Some(String::from_utf8_lossy(&output.stderr).into_owned());
        result.cmd = Some(line);
        Ok(result)
    }
}

impl Request for ShellRequest {
    fn execute(&self, driver: &Driver) -> OperationResult {
        self.run(driver)
            .unwrap_or_else(|e| OperationResult::failure(format!("{e:#}")))
            .with_operation_type(OperationType::Shell)
    }

    fn operation_type(&self) -> OperationType {
        OperationType::Shell
    }

    fn allow_failure(&self) -> bool {
        self.allow_failure
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn substitution_fields(&mut self) -> Vec<&mut String> {
        self.cmd.iter_mut().chain(self.cwd.as_mut()).collect()
    }
}
