// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::config::model::ConfigFile;
use crate::dag::edge::DependencyEdge;
use crate::dag::node::{NodeId, RequestNode};
use crate::engine::substitution::ResultStore;
use crate::errors::{Result, StepdagError};
use crate::types::DependencyKind;

/// Summary numbers about a graph's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    /// Number of layers, or 0 when the graph has a cycle.
    pub parallel_group_count: usize,
    pub has_cycles: bool,
}

/// Dependency graph of requests.
///
/// Owns the nodes and the declared edges, and keeps two indexes in sync with
/// the edge list:
/// - `adjacency[from]`: nodes that depend on `from` (its dependents)
/// - `reverse[to]`: nodes that `to` depends on (its dependencies)
///
/// Index entries behave as sets: a repeated edge appears once in the indexes
/// even though it stays in the edge list. Node and index iteration follows
/// declaration order, which makes every derived ordering deterministic.
///
/// A graph is built once, executed once, and then discarded.
#[derive(Debug, Default)]
pub struct RequestGraph {
    nodes: HashMap<NodeId, RequestNode>,
    /// Node ids in first-insertion order.
    order: Vec<NodeId>,
    edges: Vec<DependencyEdge>,
    adjacency: HashMap<NodeId, Vec<NodeId>>,
    reverse: HashMap<NodeId, Vec<NodeId>>,
    pub(crate) results: ResultStore,
    pub(crate) executed: bool,
}

impl RequestGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a validated [`ConfigFile`].
    ///
    /// Every step becomes a node; each `after = [...]` entry becomes an
    /// [`DependencyKind::ExecutionOrder`] edge. When the config asks for it,
    /// resource-based edges are inferred afterwards.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut graph = Self::new();

        for (id, step) in cfg.steps() {
            graph.add_node(
                RequestNode::from_boxed(id.clone(), step.to_request(id))
                    .with_resources(step.resources()),
            );
        }

        for (id, step) in cfg.steps() {
            for dep in &step.after {
                graph.add_dependency(
                    DependencyEdge::order(dep.clone(), id.clone())
                        .with_description(format!("{id} declares after = [\"{dep}\"]")),
                );
            }
        }

        if cfg.config().infer_resource_dependencies {
            let added = graph.infer_resource_dependencies();
            debug!(added, "inferred resource dependencies from step declarations");
        }

        graph
    }

    /// Insert a node, replacing any node with the same id.
    pub fn add_node(&mut self, node: RequestNode) {
        let id = node.id().to_string();
        if self.nodes.insert(id.clone(), node).is_some() {
            debug!(node = %id, "replacing existing node with the same id");
        } else {
            self.order.push(id.clone());
        }
        self.adjacency.entry(id.clone()).or_default();
        self.reverse.entry(id).or_default();
    }

    /// Declare that `edge.to` depends on `edge.from`.
    ///
    /// Endpoints are not checked here; [`RequestGraph::validate`] (run by the
    /// executors) rejects edges that reference unknown nodes.
    pub fn add_dependency(&mut self, edge: DependencyEdge) {
        push_unique(self.adjacency.entry(edge.from.clone()).or_default(), &edge.to);
        push_unique(self.reverse.entry(edge.to.clone()).or_default(), &edge.from);
        self.edges.push(edge);
    }

    /// Remove every edge `from -> to`. Removing a missing edge is a no-op.
    pub fn remove_dependency(&mut self, from: &str, to: &str) {
        let before = self.edges.len();
        self.edges.retain(|e| !(e.from == from && e.to == to));

        if let Some(dependents) = self.adjacency.get_mut(from) {
            dependents.retain(|n| n != to);
        }
        if let Some(deps) = self.reverse.get_mut(to) {
            deps.retain(|n| n != from);
        }

        if self.edges.len() == before {
            debug!(from = %from, to = %to, "remove_dependency: no such edge");
        }
    }

    /// Direct dependencies of a node (what it waits for).
    pub fn dependencies_of(&self, id: &str) -> &[NodeId] {
        self.reverse.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct dependents of a node (what waits for it).
    pub fn dependents_of(&self, id: &str) -> &[NodeId] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node(&self, id: &str) -> Option<&RequestNode> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut RequestNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node ids in declaration order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &RequestNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Results recorded so far, keyed by node id.
    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Check that every edge endpoint is a known node.
    pub fn validate(&self) -> Result<()> {
        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !self.nodes.contains_key(endpoint) {
                    return Err(StepdagError::DanglingEdge {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Drop repeated edges with the same `(from, to, kind)`, keeping the first.
    ///
    /// Returns the number of edges removed. Indexes are unaffected because
    /// they already hold each pair once.
    pub fn dedup_edges(&mut self) -> usize {
        let before = self.edges.len();
        let mut seen: HashSet<(NodeId, NodeId, DependencyKind)> = HashSet::new();
        self.edges
            .retain(|e| seen.insert((e.from.clone(), e.to.clone(), e.kind)));
        before - self.edges.len()
    }

    /// Add edges implied by declared resources:
    /// - a node creating file `f` runs before every node reading `f`
    /// - a node creating directory `d` runs before every node requiring `d`
    ///
    /// Pairs that are already connected (in that direction) are left alone.
    /// Returns the number of edges added.
    pub fn infer_resource_dependencies(&mut self) -> usize {
        let mut inferred = Vec::new();

        for creator in self.nodes() {
            for reader in self.nodes() {
                if creator.id() == reader.id() {
                    continue;
                }
                let res_c = &creator.resources;
                let res_r = &reader.resources;

                for file in res_c.creates_files.intersection(&res_r.reads_files) {
                    inferred.push(
                        DependencyEdge::new(creator.id(), reader.id(), DependencyKind::FileCreation)
                            .with_resource(file.clone())
                            .with_description(format!(
                                "File {file} must be created before being read"
                            )),
                    );
                }
                for dir in res_c.creates_dirs.intersection(&res_r.requires_dirs) {
                    inferred.push(
                        DependencyEdge::new(
                            creator.id(),
                            reader.id(),
                            DependencyKind::DirectoryCreation,
                        )
                        .with_resource(dir.clone())
                        .with_description(format!(
                            "Directory {dir} must be created before being used"
                        )),
                    );
                }
            }
        }

        let mut added = 0;
        for edge in inferred {
            if self.dependents_of(&edge.from).contains(&edge.to) {
                continue;
            }
            debug!(
                from = %edge.from,
                to = %edge.to,
                kind = %edge.kind,
                resource = ?edge.resource_path,
                "adding inferred dependency"
            );
            self.add_dependency(edge);
            added += 1;
        }
        added
    }

    pub fn metrics(&self) -> GraphMetrics {
        let degree = |index: &HashMap<NodeId, Vec<NodeId>>| {
            self.order
                .iter()
                .map(|id| index.get(id).map_or(0, Vec::len))
                .max()
                .unwrap_or(0)
        };

        let groups = self.parallel_groups();
        if groups.is_err() {
            warn!("metrics requested for a cyclic graph");
        }

        GraphMetrics {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            max_in_degree: degree(&self.reverse),
            max_out_degree: degree(&self.adjacency),
            parallel_group_count: groups.as_ref().map_or(0, Vec::len),
            has_cycles: groups.is_err(),
        }
    }

    /// Position of each node in declaration order.
    pub(crate) fn declaration_rank(&self) -> HashMap<&str, usize> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect()
    }
}

fn push_unique(list: &mut Vec<NodeId>, id: &str) {
    if !list.iter().any(|n| n == id) {
        list.push(id.to_string());
    }
}
