// src/dag/cycles.rs

//! Cycle detection and human-readable cycle diagnostics.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::dag::graph::RequestGraph;
use crate::dag::node::NodeId;
use crate::types::DependencyKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// One dependency edge that is part of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleDependency {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: DependencyKind,
    pub resource_path: Option<String>,
    pub description: String,
}

/// A single cycle: its members in path order and the edges joining them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub nodes: Vec<NodeId>,
    pub length: usize,
    pub dependencies: Vec<CycleDependency>,
}

/// Every cycle found in a graph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CycleAnalysis {
    pub cycles: Vec<CycleReport>,
}

impl CycleAnalysis {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }
}

impl RequestGraph {
    /// Find cycles with a three-colour depth-first search.
    ///
    /// Each time the search meets a node that is still on the current path,
    /// the path segment from that node to the current one is reported as a
    /// cycle. Afterwards any node that sits on a cycle but was not part of a
    /// reported one gets its shortest cycle added, so the union of reported
    /// nodes is exactly the set of nodes on some cycle.
    pub fn detect_cycles(&self) -> Vec<Vec<NodeId>> {
        let mut color: HashMap<&str, Color> = self
            .node_ids()
            .iter()
            .map(|id| (id.as_str(), Color::White))
            .collect();
        let mut cycles: Vec<Vec<NodeId>> = Vec::new();

        for start in self.node_ids() {
            let start = start.as_str();
            if color.get(start) != Some(&Color::White) {
                continue;
            }

            let mut path: Vec<&str> = vec![start];
            let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
            color.insert(start, Color::Gray);

            while let Some(&(node, idx)) = stack.last() {
                let dependents = self.dependents_of(node);
                let Some(next) = dependents.get(idx).map(String::as_str) else {
                    color.insert(node, Color::Black);
                    path.pop();
                    stack.pop();
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }

                match color.get(next) {
                    Some(Color::Gray) => {
                        if let Some(pos) = path.iter().position(|n| *n == next) {
                            cycles.push(path[pos..].iter().map(|s| s.to_string()).collect());
                        }
                    }
                    Some(Color::White) => {
                        color.insert(next, Color::Gray);
                        path.push(next);
                        stack.push((next, 0));
                    }
                    Some(Color::Black) | None => {}
                }
            }
        }

        self.cover_remaining_cycle_nodes(&mut cycles);
        cycles
    }

    /// Detailed report of every cycle, including the edges that form it.
    pub fn analyze_cycles(&self) -> CycleAnalysis {
        let cycles = self
            .detect_cycles()
            .into_iter()
            .map(|nodes| {
                let dependencies = nodes
                    .iter()
                    .enumerate()
                    .filter_map(|(i, from)| {
                        let to = &nodes[(i + 1) % nodes.len()];
                        self.edges()
                            .iter()
                            .find(|e| &e.from == from && &e.to == to)
                            .map(|e| CycleDependency {
                                from: e.from.clone(),
                                to: e.to.clone(),
                                kind: e.kind,
                                resource_path: e.resource_path.clone(),
                                description: e.description.clone(),
                            })
                    })
                    .collect();
                CycleReport {
                    length: nodes.len(),
                    nodes,
                    dependencies,
                }
            })
            .collect();

        CycleAnalysis { cycles }
    }

    /// Multi-line explanation of every cycle, or an empty string for a DAG.
    pub fn format_cycle_error(&self) -> String {
        let analysis = self.analyze_cycles();
        if !analysis.has_cycles() {
            return String::new();
        }

        let mut lines = vec![
            "Circular dependency detected in the workflow graph!".to_string(),
            String::new(),
            format!(
                "Found {} circular dependency chain(s):",
                analysis.cycle_count()
            ),
            String::new(),
        ];

        for (i, cycle) in analysis.cycles.iter().enumerate() {
            lines.push(format!("Cycle {} ({} nodes):", i + 1, cycle.length));

            let names: Vec<String> = cycle
                .nodes
                .iter()
                .map(|id| match self.node(id) {
                    Some(node) => format!("{id} ({})", node.request_type()),
                    None => id.clone(),
                })
                .collect();
            let first = names.first().cloned().unwrap_or_default();
            lines.push(format!("  {} -> {first}", names.join(" -> ")));
            lines.push(String::new());

            if !cycle.dependencies.is_empty() {
                lines.push("  Dependencies in this cycle:".to_string());
                for dep in &cycle.dependencies {
                    let mut line = format!("    {} -> {} ({})", dep.from, dep.to, dep.kind);
                    if let Some(resource) = &dep.resource_path {
                        line.push_str(&format!(" [resource: {resource}]"));
                    }
                    if !dep.description.is_empty() {
                        line.push_str(&format!(" - {}", dep.description));
                    }
                    lines.push(line);
                }
                lines.push(String::new());
            }
        }

        lines.extend(
            [
                "Resolution suggestions:",
                "1. Remove or relax one of the dependencies in each cycle",
                "2. Merge the steps of a cycle into a single step",
                "3. Reorder the step declarations so producers come before consumers",
                "4. Check whether every dependency is actually necessary",
            ]
            .map(String::from),
        );

        lines.join("\n")
    }

    fn cover_remaining_cycle_nodes(&self, cycles: &mut Vec<Vec<NodeId>>) {
        let mut covered: HashSet<NodeId> = cycles.iter().flatten().cloned().collect();

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for id in self.node_ids() {
            graph.add_node(id);
        }
        for id in self.node_ids() {
            for next in self.dependents_of(id) {
                if self.contains(next) {
                    graph.add_edge(id, next, ());
                }
            }
        }

        let rank = self.declaration_rank();
        for component in tarjan_scc(&graph) {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|n| graph.contains_edge(*n, *n));
            if !cyclic {
                continue;
            }

            let members: HashSet<&str> = component.iter().copied().collect();
            let mut ordered: Vec<&str> = component;
            ordered.sort_by_key(|id| rank.get(id).copied().unwrap_or(usize::MAX));

            for node in ordered {
                if covered.contains(node) {
                    continue;
                }
                if let Some(cycle) = self.shortest_cycle_through(node, &members) {
                    covered.extend(cycle.iter().cloned());
                    cycles.push(cycle);
                }
            }
        }
    }

    /// Breadth-first search from `start` back to itself, staying inside
    /// `members`.
    fn shortest_cycle_through(&self, start: &str, members: &HashSet<&str>) -> Option<Vec<NodeId>> {
        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            for next in self.dependents_of(node) {
                let next = next.as_str();
                if !members.contains(next) {
                    continue;
                }
                if next == start {
                    let mut path = vec![node.to_string()];
                    let mut cur = node;
                    while cur != start {
                        cur = *parent.get(cur)?;
                        path.push(cur.to_string());
                    }
                    path.reverse();
                    return Some(path);
                }
                if !parent.contains_key(next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }
}
