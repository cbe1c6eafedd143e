// src/engine/core.rs

//! Coordinator-side state transitions shared by both executors.
//!
//! Everything here runs on the coordinating task only. Workers never touch
//! the graph; they receive a [`NodeJob`] and hand back a [`NodeCompletion`].

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, warn};

use crate::dag::{NodeId, RequestGraph, RequestNode};
use crate::engine::NodeResult;
use crate::engine::runner::{NodeCompletion, NodeJob};
use crate::engine::substitution::apply_substitutions;
use crate::errors::{Result, StepdagError};
use crate::exec::{Driver, DriverResolver, OperationResult};
use crate::types::NodeStatus;

impl RequestGraph {
    /// Check that the graph may run and compute its execution order.
    ///
    /// Nothing is marked as executed when this fails, so a cyclic or
    /// dangling graph can be fixed and retried.
    pub(crate) fn begin_execution(&mut self) -> Result<Vec<NodeId>> {
        if self.executed {
            return Err(StepdagError::AlreadyExecuted);
        }
        self.validate()?;
        let order = self.execution_order()?;
        self.executed = true;
        Ok(order)
    }

    /// Detach the request of a pending node and resolve its driver.
    ///
    /// Placeholders are substituted first, then the node moves to `Running`.
    /// Returns `None` for nodes that must not run (already skipped).
    pub(crate) fn prepare(&mut self, id: &str, resolver: &dyn DriverResolver) -> Option<NodeJob> {
        let results = self.results.clone();
        let node = self.node_mut(id)?;
        if node.status() != NodeStatus::Pending {
            debug!(node = %id, status = %node.status(), "not executing node");
            return None;
        }

        if let Some(request) = node.request_mut() {
            let changed = apply_substitutions(request, &results);
            if changed > 0 {
                debug!(node = %id, fields = changed, "applied result substitutions");
            }
        }

        node.transition(NodeStatus::Running);
        let Some(request) = node.take_request() else {
            node.finish(OperationResult::failure("node has no request to execute"));
            return None;
        };

        let op = request.operation_type();
        let driver = resolver.resolve(op).unwrap_or_else(|| {
            debug!(node = %id, operation = %op, "no driver registered; passing an empty driver");
            Driver::none()
        });

        Some(NodeJob {
            id: id.to_string(),
            request,
            driver,
        })
    }

    /// Put a finished request back on its node and record the result.
    pub(crate) fn complete(&mut self, completion: NodeCompletion) -> NodeStatus {
        let NodeCompletion {
            id,
            request,
            result,
        } = completion;

        self.results.insert(id.clone(), result.clone());

        let Some(node) = self.node_mut(&id) else {
            warn!(node = %id, "completion for unknown node");
            return NodeStatus::Failed;
        };
        node.restore_request(request);
        node.finish(result);

        let status = node.status();
        match status {
            NodeStatus::Completed => info!(node = %id, "step completed"),
            _ if node.allow_failure() => warn!(
                node = %id,
                error = node.result().and_then(|r| r.error_message.as_deref()).unwrap_or(""),
                "step failed (failure allowed)"
            ),
            _ => warn!(
                node = %id,
                error = node.result().and_then(|r| r.error_message.as_deref()).unwrap_or(""),
                "step failed"
            ),
        }
        status
    }

    /// Fail a running node whose worker never reported back.
    pub(crate) fn fail_unreported(&mut self, id: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(node = %id, error = %message, "worker lost");
        let result = OperationResult::failure(message);
        self.results.insert(id, result.clone());
        if let Some(node) = self.node_mut(id) {
            node.finish(result);
        }
    }

    /// Mark every pending node reachable from `id` as skipped.
    ///
    /// Walks the dependents index with an explicit worklist. Returns the ids
    /// that changed, in visit order.
    pub(crate) fn mark_dependents_skipped(&mut self, id: &str) -> Vec<NodeId> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<NodeId> = self.dependents_of(id).iter().cloned().collect();
        let mut skipped = Vec::new();

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(node) = self.node_mut(&next) {
                if node.status() == NodeStatus::Pending && node.transition(NodeStatus::Skipped) {
                    skipped.push(next.clone());
                }
            }
            queue.extend(self.dependents_of(&next).iter().cloned());
        }

        if !skipped.is_empty() {
            warn!(failed = %id, skipped = ?skipped, "skipping dependents of failed step");
        }
        skipped
    }

    /// True when a direct dependency failed critically or was skipped.
    pub(crate) fn has_failed_dependency(&self, id: &str) -> bool {
        self.dependencies_of(id).iter().any(|dep| {
            self.node(dep)
                .is_some_and(|n| n.status() == NodeStatus::Skipped || n.is_critical_failure())
        })
    }

    /// Build the caller-facing result list in `order`.
    pub(crate) fn collect_results(&self, order: &[NodeId]) -> Vec<NodeResult> {
        order
            .iter()
            .filter_map(|id| self.node(id))
            .map(|node| NodeResult {
                node_id: node.id().to_string(),
                status: node.status(),
                allow_failure: node.allow_failure(),
                result: reported_result(node),
            })
            .collect()
    }
}

fn reported_result(node: &RequestNode) -> OperationResult {
    match (node.result(), node.status()) {
        (Some(result), _) => result.clone(),
        (None, NodeStatus::Skipped) => OperationResult::skipped_due_to_dependency(),
        (None, status) => OperationResult::failure(format!("step did not run (status: {status})")),
    }
}
