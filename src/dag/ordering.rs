// src/dag/ordering.rs

//! Topological ordering and layering (Kahn's algorithm).

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::dag::graph::RequestGraph;
use crate::dag::node::NodeId;
use crate::errors::{Result, StepdagError};

impl RequestGraph {
    /// A topological order of all nodes.
    ///
    /// For every edge `u -> v`, `u` comes before `v`. Ready nodes are taken
    /// in declaration order, so the result is deterministic. Fails with
    /// [`StepdagError::Cycle`] when some nodes can never become ready.
    pub fn execution_order(&self) -> Result<Vec<NodeId>> {
        let mut in_degree = self.in_degrees();
        let mut queue: VecDeque<&str> = self
            .node_ids()
            .iter()
            .map(String::as_str)
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(id) = queue.pop_front() {
            order.push(id.to_string());
            for next in self.dependents_of(id) {
                if let Some(deg) = in_degree.get_mut(next.as_str()) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }

        if order.len() != self.len() {
            return Err(self.cycle_error());
        }
        Ok(order)
    }

    /// Nodes grouped into layers that can run concurrently.
    ///
    /// Layer `k` holds every node whose dependencies all sit in layers
    /// `< k`; nodes inside a layer keep declaration order. Concatenating the
    /// layers yields a valid topological order. Fails like
    /// [`RequestGraph::execution_order`] on cycles.
    pub fn parallel_groups(&self) -> Result<Vec<Vec<NodeId>>> {
        let mut in_degree = self.in_degrees();
        let rank = self.declaration_rank();

        let mut current: Vec<&str> = self
            .node_ids()
            .iter()
            .map(String::as_str)
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();

        let mut groups: Vec<Vec<NodeId>> = Vec::new();
        let mut placed = 0;

        while !current.is_empty() {
            let mut next_layer: Vec<&str> = Vec::new();
            for id in &current {
                for dep in self.dependents_of(id) {
                    if let Some(deg) = in_degree.get_mut(dep.as_str()) {
                        *deg -= 1;
                        if *deg == 0 {
                            next_layer.push(dep);
                        }
                    }
                }
            }
            next_layer.sort_by_key(|id| rank.get(id).copied().unwrap_or(usize::MAX));

            placed += current.len();
            groups.push(current.iter().map(|s| s.to_string()).collect());
            current = next_layer;
        }

        if placed != self.len() {
            return Err(self.cycle_error());
        }

        debug!(layers = groups.len(), nodes = placed, "computed parallel groups");
        Ok(groups)
    }

    /// Number of known predecessors of every known node.
    ///
    /// Edges from unknown nodes are ignored so that they don't block ordering.
    fn in_degrees(&self) -> HashMap<&str, usize> {
        self.node_ids()
            .iter()
            .map(|id| {
                let known = self
                    .dependencies_of(id)
                    .iter()
                    .filter(|dep| self.contains(dep))
                    .count();
                (id.as_str(), known)
            })
            .collect()
    }

    fn cycle_error(&self) -> StepdagError {
        let message = self.format_cycle_error();
        if message.is_empty() {
            StepdagError::Cycle("graph could not be ordered: unresolved dependencies remain".into())
        } else {
            StepdagError::Cycle(message)
        }
    }
}
