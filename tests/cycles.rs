// tests/cycles.rs

mod common;
use crate::common::{ExecutionLog, init_tracing, scripted_graph};

use std::collections::BTreeSet;

use stepdag::dag::{DependencyEdge, RequestGraph};
use stepdag::types::DependencyKind;

fn is_real_cycle(graph: &RequestGraph, cycle: &[String]) -> bool {
    !cycle.is_empty()
        && (0..cycle.len()).all(|i| {
            let next = &cycle[(i + 1) % cycle.len()];
            graph.dependents_of(&cycle[i]).contains(next)
        })
}

#[test]
fn acyclic_graph_has_no_cycles_and_no_report() {
    init_tracing();
    let log = ExecutionLog::new();
    let graph = scripted_graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")], &log);

    assert!(graph.detect_cycles().is_empty());
    assert!(!graph.analyze_cycles().has_cycles());
    assert_eq!(graph.format_cycle_error(), "");
}

#[test]
fn two_node_cycle_is_found() {
    let log = ExecutionLog::new();
    let graph = scripted_graph(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("b", "c")], &log);

    assert_eq!(graph.detect_cycles(), vec![vec!["a".to_string(), "b".to_string()]]);
}

#[test]
fn self_loop_is_a_cycle_of_one() {
    let log = ExecutionLog::new();
    let graph = scripted_graph(&["a"], &[("a", "a")], &log);

    assert_eq!(graph.detect_cycles(), vec![vec!["a".to_string()]]);
    assert!(graph.execution_order().is_err());
}

#[test]
fn every_node_on_a_cycle_is_reported() {
    let log = ExecutionLog::new();
    // a <-> b, plus a -> c -> d -> b which closes a second cycle through c, d.
    let graph = scripted_graph(
        &["a", "b", "c", "d", "e"],
        &[("a", "b"), ("b", "a"), ("a", "c"), ("c", "d"), ("d", "b"), ("d", "e")],
        &log,
    );

    let cycles = graph.detect_cycles();
    for cycle in &cycles {
        assert!(is_real_cycle(&graph, cycle), "not a cycle: {cycle:?}");
    }

    let covered: BTreeSet<&str> = cycles.iter().flatten().map(String::as_str).collect();
    assert_eq!(covered, BTreeSet::from(["a", "b", "c", "d"]));
}

#[test]
fn analysis_lists_the_edges_of_each_cycle() {
    let log = ExecutionLog::new();
    let mut graph = scripted_graph(&["mk", "use"], &[("use", "mk")], &log);
    graph.add_dependency(
        DependencyEdge::new("mk", "use", DependencyKind::DirectoryCreation)
            .with_resource("build")
            .with_description("Directory build must be created before being used"),
    );

    let analysis = graph.analyze_cycles();
    assert_eq!(analysis.cycle_count(), 1);

    let cycle = &analysis.cycles[0];
    assert_eq!(cycle.length, 2);
    assert_eq!(cycle.nodes, ["mk", "use"]);
    assert_eq!(cycle.dependencies.len(), 2);
    assert_eq!(cycle.dependencies[0].kind, DependencyKind::DirectoryCreation);
    assert_eq!(cycle.dependencies[0].resource_path.as_deref(), Some("build"));
    assert_eq!(cycle.dependencies[1].kind, DependencyKind::ExecutionOrder);
}

#[test]
fn cycle_error_names_nodes_with_their_request_type() {
    let log = ExecutionLog::new();
    let graph = scripted_graph(&["a", "b"], &[("a", "b"), ("b", "a")], &log);

    let msg = graph.format_cycle_error();
    assert!(msg.starts_with("Circular dependency detected in the workflow graph!"));
    assert!(msg.contains("Found 1 circular dependency chain(s):"));
    assert!(msg.contains("Cycle 1 (2 nodes):"));
    assert!(msg.contains("a (ScriptedRequest) -> b (ScriptedRequest) -> a (ScriptedRequest)"));
    assert!(msg.contains("    a -> b (exec_order)"));
    assert!(msg.contains("Resolution suggestions:"));
    assert!(msg.contains("Merge the steps"));
}

#[test]
fn visualize_lists_nodes_edges_and_groups() {
    let log = ExecutionLog::new();
    let graph = scripted_graph(&["a", "b", "c"], &[("a", "c"), ("b", "c")], &log);

    let text = graph.visualize();
    assert_eq!(text, graph.visualize());
    assert!(text.starts_with("Request Execution Graph:\nNodes: 3\nEdges: 2\n"));
    assert!(text.contains("  a: ScriptedRequest (status: pending)"));
    assert!(text.contains("  b -> c (exec_order)"));
    assert!(text.contains("Parallel Execution Groups:\n  Group 1: a, b\n  Group 2: c"));
}

#[test]
fn visualize_shows_the_cycle_error_instead_of_groups() {
    let log = ExecutionLog::new();
    let graph = scripted_graph(&["a", "b"], &[("a", "b"), ("b", "a")], &log);

    let text = graph.visualize();
    assert!(!text.contains("Parallel Execution Groups:"));
    assert!(text.contains("Error: Circular dependency detected"));
}
