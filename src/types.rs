// src/types.rs

//! Small enums shared by the graph, the executors and the config layer.

use std::fmt;

use serde::Deserialize;

/// Run state of a single node.
///
/// Transitions only move forward:
/// `Pending -> Running -> {Completed | Failed}` or `Pending -> Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    /// Never executed because an upstream node failed critically.
    Skipped,
}

impl NodeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NodeStatus::Completed | NodeStatus::Failed | NodeStatus::Skipped
        )
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        matches!(
            (self, next),
            (NodeStatus::Pending, NodeStatus::Running)
                | (NodeStatus::Pending, NodeStatus::Skipped)
                | (NodeStatus::Running, NodeStatus::Completed)
                | (NodeStatus::Running, NodeStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Running => "running",
            NodeStatus::Completed => "completed",
            NodeStatus::Failed => "failed",
            NodeStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one node has to wait for another.
///
/// Only used for diagnostics; ordering treats every kind the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// `from` creates a file that `to` reads.
    FileCreation,
    /// `from` creates a directory that `to` requires.
    DirectoryCreation,
    /// `from` and `to` touch the same resource.
    ResourceAccess,
    /// Plain "run after" ordering.
    ExecutionOrder,
}

impl DependencyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyKind::FileCreation => "file_creation",
            DependencyKind::DirectoryCreation => "dir_creation",
            DependencyKind::ResourceAccess => "resource_access",
            DependencyKind::ExecutionOrder => "exec_order",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The class of driver a request needs in order to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Shell,
    File,
    Docker,
    Python,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Shell => "shell",
            OperationType::File => "file",
            OperationType::Docker => "docker",
            OperationType::Python => "python",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a whole graph is executed.
///
/// - `Sequential`: one node at a time in topological order (default).
/// - `Parallel`: layer by layer, nodes of a layer run on a bounded pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => f.write_str("sequential"),
            ExecutionMode::Parallel => f.write_str("parallel"),
        }
    }
}
