// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dag::ResourceInfo;
use crate::exec::{FileOp, FileRequest, Request, ShellRequest};
use crate::types::ExecutionMode;

/// Workflow file exactly as read from TOML.
///
/// ```toml
/// [config]
/// mode = "parallel"
/// max_workers = 4
///
/// [step.prepare]
/// kind = "mkdir"
/// path = "build"
/// creates_dirs = ["build"]
///
/// [step.compile]
/// kind = "shell"
/// cmd = ["sh", "-c", "echo build/out.txt"]
/// requires_dirs = ["build"]
///
/// [step.show]
/// kind = "shell"
/// cmd = ["cat", "{{step_compile.stdout}}"]
/// after = ["compile"]
/// ```
///
/// Use [`ConfigFile::try_from`] to validate it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All steps from `[step.<id>]`, keyed by step id.
    #[serde(default)]
    pub step: BTreeMap<String, StepConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"sequential"` (default) or `"parallel"`.
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Worker pool size for parallel mode. `None` means one per CPU.
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Add edges from `creates_*` to matching `reads_files`/`requires_dirs`.
    #[serde(default = "default_infer_resource_dependencies")]
    pub infer_resource_dependencies: bool,
}

fn default_infer_resource_dependencies() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            max_workers: None,
            infer_resource_dependencies: default_infer_resource_dependencies(),
        }
    }
}

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Shell,
    Mkdir,
    Touch,
    Write,
    Copy,
    Move,
    Remove,
    Exists,
}

impl StepKind {
    /// The file operation behind this kind, or `None` for shell steps.
    pub fn file_op(self) -> Option<FileOp> {
        match self {
            StepKind::Shell => None,
            StepKind::Mkdir => Some(FileOp::Mkdir),
            StepKind::Touch => Some(FileOp::Touch),
            StepKind::Write => Some(FileOp::Write),
            StepKind::Copy => Some(FileOp::Copy),
            StepKind::Move => Some(FileOp::Move),
            StepKind::Remove => Some(FileOp::Remove),
            StepKind::Exists => Some(FileOp::Exists),
        }
    }
}

/// `[step.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    pub kind: StepKind,

    /// Argument vector for shell steps. May contain result placeholders.
    #[serde(default)]
    pub cmd: Vec<String>,

    /// Working directory for shell steps.
    #[serde(default)]
    pub cwd: Option<String>,

    /// Target of file steps.
    #[serde(default)]
    pub path: Option<String>,

    /// Destination of `copy` and `move`.
    #[serde(default)]
    pub dst: Option<String>,

    /// Body of `write`.
    #[serde(default)]
    pub content: Option<String>,

    /// Steps that must finish before this one starts.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub allow_failure: bool,

    #[serde(default)]
    pub creates_files: Vec<String>,
    #[serde(default)]
    pub creates_dirs: Vec<String>,
    #[serde(default)]
    pub reads_files: Vec<String>,
    #[serde(default)]
    pub requires_dirs: Vec<String>,
}

impl StepConfig {
    /// Build the request this step runs. `id` becomes the request name.
    pub fn to_request(&self, id: &str) -> Box<dyn Request> {
        match self.kind.file_op() {
            None => {
                let mut req = ShellRequest::new(self.cmd.iter().cloned())
                    .allow_failure(self.allow_failure)
                    .named(id);
                req.cwd = self.cwd.clone();
                Box::new(req)
            }
            Some(op) => {
                let mut req = FileRequest::new(op, self.path.clone().unwrap_or_default())
                    .allow_failure(self.allow_failure)
                    .named(id);
                req.dst_path = self.dst.clone();
                req.content = self.content.clone();
                Box::new(req)
            }
        }
    }

    /// Declared resources, used for dependency inference.
    pub fn resources(&self) -> ResourceInfo {
        ResourceInfo {
            creates_files: self.creates_files.iter().cloned().collect(),
            creates_dirs: self.creates_dirs.iter().cloned().collect(),
            reads_files: self.reads_files.iter().cloned().collect(),
            requires_dirs: self.requires_dirs.iter().cloned().collect(),
        }
    }
}

/// A validated workflow file.
///
/// Only obtainable through [`TryFrom<RawConfigFile>`] (or
/// [`ConfigFile::new_unchecked`] for callers that validated already).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    step: BTreeMap<String, StepConfig>,
}

impl ConfigFile {
    pub fn new_unchecked(config: ConfigSection, step: BTreeMap<String, StepConfig>) -> Self {
        Self { config, step }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    /// Steps sorted by id.
    pub fn steps(&self) -> impl Iterator<Item = (&String, &StepConfig)> {
        self.step.iter()
    }

    pub fn step(&self, id: &str) -> Option<&StepConfig> {
        self.step.get(id)
    }

    pub fn len(&self) -> usize {
        self.step.len()
    }

    pub fn is_empty(&self) -> bool {
        self.step.is_empty()
    }
}
