// src/engine/mod.rs

//! Execution engine for request graphs.
//!
//! - [`sequential`] runs nodes one at a time in topological order.
//! - [`parallel`] runs one layer at a time on a bounded worker pool.
//! - [`core`] holds the coordinator-side state transitions both share.
//! - [`runner`] executes a single request behind a panic boundary.
//! - [`substitution`] stores results and rewrites `{{step_<id>.<field>}}`
//!   placeholders before a node runs.

use std::num::NonZeroUsize;

use crate::dag::NodeId;
use crate::exec::OperationResult;
use crate::types::NodeStatus;

pub mod core;
pub mod parallel;
pub mod runner;
pub mod sequential;
pub mod substitution;

pub use substitution::{ResultStore, apply_substitutions, substitute_placeholders};

/// Outcome of one node as reported to the caller of an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeResult {
    pub node_id: NodeId,
    pub status: NodeStatus,
    /// Copied from the node's request so callers can judge overall success.
    pub allow_failure: bool,
    pub result: OperationResult,
}

impl NodeResult {
    /// A failure that is not allowed, or a skip caused by one.
    pub fn is_critical_failure(&self) -> bool {
        match self.status {
            NodeStatus::Skipped => true,
            NodeStatus::Failed => !self.allow_failure,
            _ => false,
        }
    }
}

/// True when no node failed critically.
pub fn workflow_succeeded(results: &[NodeResult]) -> bool {
    !results.iter().any(NodeResult::is_critical_failure)
}

/// Worker count used when none is configured: available CPUs, at least 1.
pub fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
