// tests/graph_construction.rs

mod common;
use crate::common::{ExecutionLog, ScriptedRequest, add_edges, init_tracing, scripted_graph};

use stepdag::dag::{DependencyEdge, GraphMetrics, RequestGraph, RequestNode};
use stepdag::errors::StepdagError;
use stepdag::types::{DependencyKind, NodeStatus};

#[test]
fn add_dependency_updates_both_indexes() {
    init_tracing();
    let log = ExecutionLog::new();
    let graph = scripted_graph(&["a", "b", "c"], &[("a", "b"), ("a", "c"), ("b", "c")], &log);

    assert_eq!(graph.dependents_of("a"), ["b", "c"]);
    assert_eq!(graph.dependencies_of("c"), ["a", "b"]);
    assert!(graph.dependencies_of("a").is_empty());
    assert_eq!(graph.edges().len(), 3);
}

#[test]
fn remove_dependency_updates_indexes_and_ignores_missing_edges() {
    let log = ExecutionLog::new();
    let mut graph = scripted_graph(&["a", "b"], &[("a", "b")], &log);

    graph.remove_dependency("b", "a");
    assert_eq!(graph.edges().len(), 1);

    graph.remove_dependency("a", "b");
    assert!(graph.edges().is_empty());
    assert!(graph.dependents_of("a").is_empty());
    assert!(graph.dependencies_of("b").is_empty());
}

#[test]
fn adding_a_node_twice_replaces_it_in_place() {
    let log = ExecutionLog::new();
    let mut graph = scripted_graph(&["a", "b"], &[], &log);

    graph.add_node(RequestNode::new("a", ScriptedRequest::fail("a", &log)).with_metadata("v", "2"));

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.node_ids(), ["a", "b"]);
    let node = graph.node("a").expect("node a");
    assert_eq!(node.metadata.get("v").map(String::as_str), Some("2"));
    assert_eq!(node.status(), NodeStatus::Pending);
    assert!(node.result().is_none());
}

#[test]
fn validate_reports_dangling_edges() {
    let log = ExecutionLog::new();
    let mut graph = scripted_graph(&["a"], &[], &log);
    add_edges(&mut graph, &[("a", "ghost")]);

    match graph.validate() {
        Err(StepdagError::DanglingEdge { from, to, missing }) => {
            assert_eq!((from.as_str(), to.as_str(), missing.as_str()), ("a", "ghost", "ghost"));
        }
        other => panic!("expected DanglingEdge, got {other:?}"),
    }
}

#[test]
fn duplicate_edges_stay_single_in_indexes_and_can_be_deduped() {
    let log = ExecutionLog::new();
    let mut graph = scripted_graph(&["a", "b"], &[("a", "b"), ("a", "b")], &log);

    assert_eq!(graph.edges().len(), 2);
    assert_eq!(graph.dependents_of("a"), ["b"]);

    assert_eq!(graph.dedup_edges(), 1);
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.execution_order().unwrap(), ["a", "b"]);
}

#[test]
fn resource_declarations_produce_inferred_edges() {
    let log = ExecutionLog::new();
    let mut graph = RequestGraph::new();
    graph.add_node(RequestNode::new("reader", ScriptedRequest::succeed("reader", &log)).reads_file("out/a.txt"));
    graph.add_node(
        RequestNode::new("mk", ScriptedRequest::succeed("mk", &log))
            .creates_dir("out")
            .creates_file("out/a.txt"),
    );
    graph.add_node(RequestNode::new("user", ScriptedRequest::succeed("user", &log)).requires_dir("out"));

    assert_eq!(graph.infer_resource_dependencies(), 2);
    // Running it again finds nothing new.
    assert_eq!(graph.infer_resource_dependencies(), 0);

    let file_edge = graph
        .edges()
        .iter()
        .find(|e| e.kind == DependencyKind::FileCreation)
        .expect("file edge");
    assert_eq!((file_edge.from.as_str(), file_edge.to.as_str()), ("mk", "reader"));
    assert_eq!(file_edge.resource_path.as_deref(), Some("out/a.txt"));

    let dir_edge = graph
        .edges()
        .iter()
        .find(|e| e.kind == DependencyKind::DirectoryCreation)
        .expect("dir edge");
    assert_eq!((dir_edge.from.as_str(), dir_edge.to.as_str()), ("mk", "user"));

    assert_eq!(graph.execution_order().unwrap(), ["mk", "reader", "user"]);
}

#[test]
fn inference_skips_pairs_that_are_already_connected() {
    let log = ExecutionLog::new();
    let mut graph = RequestGraph::new();
    graph.add_node(RequestNode::new("w", ScriptedRequest::succeed("w", &log)).creates_file("f"));
    graph.add_node(RequestNode::new("r", ScriptedRequest::succeed("r", &log)).reads_file("f"));
    graph.add_dependency(DependencyEdge::order("w", "r"));

    assert_eq!(graph.infer_resource_dependencies(), 0);
    assert_eq!(graph.edges().len(), 1);
}

#[test]
fn metrics_describe_the_shape() {
    let log = ExecutionLog::new();
    let graph = scripted_graph(
        &["a", "b", "c", "d"],
        &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        &log,
    );

    assert_eq!(
        graph.metrics(),
        GraphMetrics {
            node_count: 4,
            edge_count: 4,
            max_in_degree: 2,
            max_out_degree: 2,
            parallel_group_count: 3,
            has_cycles: false,
        }
    );

    let cyclic = scripted_graph(&["x", "y"], &[("x", "y"), ("y", "x")], &log);
    let m = cyclic.metrics();
    assert!(m.has_cycles);
    assert_eq!(m.parallel_group_count, 0);
}
