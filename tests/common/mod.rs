#![allow(dead_code)]

use std::sync::Arc;

use stepdag::dag::{DependencyEdge, RequestGraph, RequestNode};
use stepdag::exec::DriverRegistry;

#[allow(unused_imports)]
pub use stepdag_test_utils::{
    ConfigFileBuilder, ExecutionLog, ScriptedRequest, StepConfigBuilder, init_tracing,
    with_timeout,
};

/// Graph of succeeding scripted requests, one per id, plus `edges`.
pub fn scripted_graph(
    ids: &[&str],
    edges: &[(&str, &str)],
    log: &Arc<ExecutionLog>,
) -> RequestGraph {
    let mut graph = RequestGraph::new();
    for id in ids {
        graph.add_node(RequestNode::new(*id, ScriptedRequest::succeed(id, log)));
    }
    add_edges(&mut graph, edges);
    graph
}

pub fn add_edges(graph: &mut RequestGraph, edges: &[(&str, &str)]) {
    for (from, to) in edges {
        graph.add_dependency(DependencyEdge::order(*from, *to));
    }
}

/// Resolver without any drivers; scripted requests don't need one.
pub fn no_drivers() -> DriverRegistry {
    DriverRegistry::new()
}

/// Position of every id in `order`.
pub fn positions(order: &[String]) -> std::collections::HashMap<&str, usize> {
    order
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect()
}
