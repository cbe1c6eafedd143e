// src/exec/file.rs

//! File steps: directory creation, writes, copies, moves and removals.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::debug;

use crate::exec::driver::Driver;
use crate::exec::request::{OperationResult, Request};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::OperationType;

/// Performs [`FileRequest`]s against a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct FileDriver {
    fs: Arc<dyn FileSystem>,
    /// Base for relative request paths. `None` leaves them as given.
    root: Option<PathBuf>,
}

impl FileDriver {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs, root: None }
    }

    pub fn real() -> Self {
        Self::new(Arc::new(RealFileSystem))
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Join a relative `path` onto the root, if one is set.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOp {
    Mkdir,
    Touch,
    Write,
    Copy,
    Move,
    Remove,
    Exists,
}

impl FileOp {
    /// Whether the operation needs a destination path.
    pub fn needs_destination(self) -> bool {
        matches!(self, FileOp::Copy | FileOp::Move)
    }
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileOp::Mkdir => "mkdir",
            FileOp::Touch => "touch",
            FileOp::Write => "write",
            FileOp::Copy => "copy",
            FileOp::Move => "move",
            FileOp::Remove => "remove",
            FileOp::Exists => "exists",
        };
        f.write_str(s)
    }
}

/// One filesystem mutation or check.
#[derive(Debug, Clone)]
pub struct FileRequest {
    pub op: FileOp,
    pub path: String,
    /// Destination for `copy` and `move`.
    pub dst_path: Option<String>,
    /// Content for `write`.
    pub content: Option<String>,
    pub allow_failure: bool,
    pub name: Option<String>,
}

impl FileRequest {
    pub fn new(op: FileOp, path: impl Into<String>) -> Self {
        Self {
            op,
            path: path.into(),
            dst_path: None,
            content: None,
            allow_failure: false,
            name: None,
        }
    }

    pub fn mkdir(path: impl Into<String>) -> Self {
        Self::new(FileOp::Mkdir, path)
    }

    pub fn write(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(FileOp::Write, path).content(content)
    }

    pub fn copy(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(FileOp::Copy, from).dst(to)
    }

    pub fn dst(mut self, dst: impl Into<String>) -> Self {
        self.dst_path = Some(dst.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
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

    fn destination(&self, driver: &FileDriver) -> Result<PathBuf> {
        self.dst_path
            .as_deref()
            .map(|dst| driver.resolve(Path::new(dst)))
            .ok_or_else(|| anyhow!("{} of {:?} requires a destination path", self.op, self.path))
    }

    fn run(&self, driver: &Driver) -> Result<OperationResult> {
        let file = driver
            .downcast_ref::<FileDriver>()
            .ok_or_else(|| anyhow!("file request requires a FileDriver, got {:?}", driver))?;
        let fs = file.fs();
        let resolved = file.resolve(Path::new(&self.path));
        let path = resolved.as_path();

        debug!(op = %self.op, path = %self.path, dst = ?self.dst_path, "file operation");

        let mut result = OperationResult::success().with_path(self.path.clone());
        match self.op {
            FileOp::Mkdir => fs.create_dir_all(path)?,
            FileOp::Touch => {
                if !fs.exists(path) {
                    fs.write(path, b"")?;
                }
            }
            FileOp::Write => {
                let content = self.content.as_deref().unwrap_or_default();
                fs.write(path, content.as_bytes())?;
                result.content = Some(content.to_string());
            }
            FileOp::Copy => fs.copy(path, &self.destination(file)?)?,
            FileOp::Move => fs.rename(path, &self.destination(file)?)?,
            FileOp::Remove => {
                if fs.is_dir(path) {
                    fs.remove_dir_all(path)?;
                } else if fs.exists(path) {
                    fs.remove_file(path)?;
                }
            }
            FileOp::Exists => result.exists = Some(fs.exists(path)),
        }
        Ok(result)
    }
}

impl Request for FileRequest {
    fn execute(&self, driver: &Driver) -> OperationResult {
        self.run(driver)
            .unwrap_or_else(|e| OperationResult::failure(format!("{e:#}")).with_path(self.path.clone()))
            .with_operation_type(OperationType::File)
    }

    fn operation_type(&self) -> OperationType {
        OperationType::File
    }

    fn allow_failure(&self) -> bool {
        self.allow_failure
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn substitution_fields(&mut self) -> Vec<&mut String> {
        std::iter::once(&mut self.path)
            .chain(self.dst_path.as_mut())
            .collect()
    }
}
