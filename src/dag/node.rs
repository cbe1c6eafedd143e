// src/dag/node.rs

//! Graph vertices: one request plus declared resources and run state.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::exec::{OperationResult, Request};
use crate::types::NodeStatus;

/// Node identifier, unique within a graph.
pub type NodeId = String;

/// Files and directories a node declares it touches.
///
/// The scheduler never interprets these; they feed
/// [`RequestGraph::infer_resource_dependencies`](crate::dag::RequestGraph::infer_resource_dependencies)
/// and external planners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceInfo {
    pub creates_files: BTreeSet<String>,
    pub creates_dirs: BTreeSet<String>,
    pub reads_files: BTreeSet<String>,
    pub requires_dirs: BTreeSet<String>,
}

impl ResourceInfo {
    pub fn is_empty(&self) -> bool {
        self.creates_files.is_empty()
            && self.creates_dirs.is_empty()
            && self.reads_files.is_empty()
            && self.requires_dirs.is_empty()
    }
}

/// A graph vertex wrapping exactly one [`Request`].
///
/// Identity is the `id`: inserting another node with the same id replaces
/// this one.
#[derive(Debug)]
pub struct RequestNode {
    id: NodeId,
    /// `None` only while the request is out on a worker.
    request: Option<Box<dyn Request>>,
    status: NodeStatus,
    result: Option<OperationResult>,
    pub resources: ResourceInfo,
    pub metadata: BTreeMap<String, String>,
}

impl RequestNode {
    pub fn new(id: impl Into<NodeId>, request: impl Request + 'static) -> Self {
        Self::from_boxed(id, Box::new(request))
    }

    pub fn from_boxed(id: impl Into<NodeId>, request: Box<dyn Request>) -> Self {
        Self {
            id: id.into(),
            request: Some(request),
            status: NodeStatus::Pending,
            result: None,
            resources: ResourceInfo::default(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn creates_file(mut self, path: impl Into<String>) -> Self {
        self.resources.creates_files.insert(path.into());
        self
    }

    pub fn creates_dir(mut self, path: impl Into<String>) -> Self {
        self.resources.creates_dirs.insert(path.into());
        self
    }

    pub fn reads_file(mut self, path: impl Into<String>) -> Self {
        self.resources.reads_files.insert(path.into());
        self
    }

    pub fn requires_dir(mut self, path: impl Into<String>) -> Self {
        self.resources.requires_dirs.insert(path.into());
        self
    }

    pub fn with_resources(mut self, resources: ResourceInfo) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    /// The result recorded when the node finished executing.
    ///
    /// Stays `None` for pending and skipped nodes.
    pub fn result(&self) -> Option<&OperationResult> {
        self.result.as_ref()
    }

    pub fn request(&self) -> Option<&dyn Request> {
        self.request.as_deref()
    }

    /// Request type name for diagnostics.
    pub fn request_type(&self) -> &'static str {
        self.request
            .as_deref()
            .map(|r| r.request_type())
            .unwrap_or("<detached>")
    }

    pub fn allow_failure(&self) -> bool {
        self.request.as_deref().is_some_and(|r| r.allow_failure())
    }

    /// True when this node failed and its failure must skip dependents.
    pub fn is_critical_failure(&self) -> bool {
        self.status == NodeStatus::Failed && !self.allow_failure()
    }

    pub(crate) fn request_mut(&mut self) -> Option<&mut (dyn Request + 'static)> {
        self.request.as_deref_mut()
    }

    pub(crate) fn take_request(&mut self) -> Option<Box<dyn Request>> {
        self.request.take()
    }

    pub(crate) fn restore_request(&mut self, request: Box<dyn Request>) {
        self.request = Some(request);
    }

    /// Move to `next` if the transition is legal. Returns whether it happened.
    pub(crate) fn transition(&mut self, next: NodeStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            warn!(
                node = %self.id,
                from = %self.status,
                to = %next,
                "ignoring illegal status transition"
            );
            false
        }
    }

    /// Record the execution result and the matching terminal status.
    pub(crate) fn finish(&mut self, result: OperationResult) {
        if self.result.is_some() {
            warn!(node = %self.id, "result already recorded; keeping the first one");
            return;
        }
        let next = if result.success {
            NodeStatus::Completed
        } else {
            NodeStatus::Failed
        };
        if self.transition(next) {
            self.result = Some(result);
        }
    }
}
