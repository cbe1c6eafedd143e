// src/dag/visualize.rs

use crate::dag::graph::RequestGraph;

impl RequestGraph {
    /// Human-readable dump of nodes, edges and parallel layers.
    ///
    /// On a cyclic graph the layer listing is replaced by the cycle report.
    pub fn visualize(&self) -> String {
        let mut lines = vec![
            "Request Execution Graph:".to_string(),
            format!("Nodes: {}", self.len()),
            format!("Edges: {}", self.edges().len()),
            String::new(),
            "Nodes:".to_string(),
        ];

        for node in self.nodes() {
            lines.push(format!(
                "  {}: {} (status: {})",
                node.id(),
                node.request_type(),
                node.status()
            ));
        }

        lines.push(String::new());
        lines.push("Dependencies:".to_string());
        for edge in self.edges() {
            lines.push(format!("  {} -> {} ({})", edge.from, edge.to, edge.kind));
        }

        lines.push(String::new());
        match self.parallel_groups() {
            Ok(groups) => {
                lines.push("Parallel Execution Groups:".to_string());
                for (i, group) in groups.iter().enumerate() {
                    lines.push(format!("  Group {}: {}", i + 1, group.join(", ")));
                }
            }
            Err(err) => lines.push(format!("Error: {err}")),
        }

        lines.join("\n")
    }
}
