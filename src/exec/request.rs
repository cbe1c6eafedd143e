// src/exec/request.rs

//! The contract every executable step fulfils, and the result it produces.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

use crate::exec::driver::Driver;
use crate::types::OperationType;

/// Message attached to the synthetic result of a skipped node.
pub const SKIPPED_MESSAGE: &str = "Skipped due to dependency failure";

/// A unit of work owned by a graph node.
///
/// `execute` is a blocking call. It reports failure through
/// [`OperationResult::success`]; a panic inside it is caught by the engine and
/// converted into a failed result.
pub trait Request: Send + Debug {
    /// Perform the side effect using the driver resolved for
    /// [`Request::operation_type`].
    fn execute(&self, driver: &Driver) -> OperationResult;

    /// Which class of driver this request needs.
    fn operation_type(&self) -> OperationType;

    /// If true, a failure of this request does not skip its dependents.
    fn allow_failure(&self) -> bool {
        false
    }

    /// Optional human-readable name for logs.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Short type name shown in diagnostics and `visualize()`.
    fn request_type(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// String fields that may contain `{{step_<id>.<field>}}` placeholders.
    ///
    /// The engine rewrites them in place right before `execute`.
    fn substitution_fields(&mut self) -> Vec<&mut String> {
        Vec::new()
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Outcome of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationResult {
    pub success: bool,
    pub returncode: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    /// File content for read-like file operations.
    pub content: Option<String>,
    /// Answer of existence checks.
    pub exists: Option<bool>,
    pub path: Option<String>,
    /// The command line that was run, if any.
    pub cmd: Option<String>,
    pub error_message: Option<String>,
    pub operation_type: Option<OperationType>,
    pub elapsed: Option<Duration>,
    /// True only for the synthetic results of skipped nodes.
    pub skipped: bool,
    pub metadata: BTreeMap<String, String>,
}

impl OperationResult {
    pub fn success() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// The result reported for a node that never ran because of an upstream
    /// failure.
    pub fn skipped_due_to_dependency() -> Self {
        Self {
            success: false,
            skipped: true,
            error_message: Some(SKIPPED_MESSAGE.to_string()),
            ..Self::default()
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = Some(stderr.into());
        self
    }

    pub fn with_returncode(mut self, code: i32) -> Self {
        self.returncode = Some(code);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_operation_type(mut self, op: OperationType) -> Self {
        self.operation_type = Some(op);
        self
    }

    /// Look up a field by name for placeholder substitution.
    ///
    /// Returns `None` when the result has no such field, and `Some("")` when
    /// the field exists but holds no value.
    pub fn field(&self, name: &str) -> Option<String> {
        fn text(v: &Option<String>) -> String {
            v.clone().unwrap_or_default()
        }

        let value = match name {
            "success" => self.success.to_string(),
            "returncode" | "return_code" => {
                self.returncode.map(|c| c.to_string()).unwrap_or_default()
            }
            "stdout" => text(&self.stdout),
            "stderr" => text(&self.stderr),
            "content" => text(&self.content),
            "exists" => self.exists.map(|e| e.to_string()).unwrap_or_default(),
            "path" => text(&self.path),
            "cmd" => text(&self.cmd),
            "error_message" => text(&self.error_message),
            "operation_type" => self
                .operation_type
                .map(|op| op.to_string())
                .unwrap_or_default(),
            "elapsed_time" => self
                .elapsed
                .map(|d| d.as_secs_f64().to_string())
                .unwrap_or_default(),
            "skipped" => self.skipped.to_string(),
            _ => return None,
        };
        Some(value)
    }
}
