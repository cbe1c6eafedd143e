// src/dag/edge.rs

use crate::dag::node::NodeId;
use crate::types::DependencyKind;

/// Directed dependency: `to` may only run after `from` has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: DependencyKind,
    /// Resource that caused the dependency, if any. Diagnostics only.
    pub resource_path: Option<String>,
    pub description: String,
}

impl DependencyEdge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, kind: DependencyKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            resource_path: None,
            description: String::new(),
        }
    }

    /// Shorthand for a plain [`DependencyKind::ExecutionOrder`] edge.
    pub fn order(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self::new(from, to, DependencyKind::ExecutionOrder)
    }

    pub fn with_resource(mut self, path: impl Into<String>) -> Self {
        self.resource_path = Some(path.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
