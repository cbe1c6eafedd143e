// tests/ordering.rs

mod common;
use crate::common::{ExecutionLog, init_tracing, positions, scripted_graph};

use stepdag::dag::RequestGraph;
use stepdag::errors::StepdagError;

#[test]
fn execution_order_respects_every_edge() {
    init_tracing();
    let log = ExecutionLog::new();
    let edges = [("a", "b"), ("a", "c"), ("c", "d"), ("b", "d"), ("e", "d")];
    let graph = scripted_graph(&["d", "c", "b", "a", "e"], &edges, &log);

    let order = graph.execution_order().unwrap();
    assert_eq!(order.len(), 5);

    let pos = positions(&order);
    for (from, to) in edges {
        assert!(pos[from] < pos[to], "{from} must come before {to} in {order:?}");
    }
}

#[test]
fn ties_follow_declaration_order() {
    let log = ExecutionLog::new();
    let graph = scripted_graph(&["z", "y", "x"], &[], &log);

    assert_eq!(graph.execution_order().unwrap(), ["z", "y", "x"]);
    assert_eq!(graph.parallel_groups().unwrap(), vec![vec!["z", "y", "x"]]);
}

#[test]
fn parallel_groups_are_kahn_layers() {
    let log = ExecutionLog::new();
    let graph = scripted_graph(
        &["a", "b", "c", "d", "e"],
        &[("a", "c"), ("b", "c"), ("c", "d"), ("a", "e")],
        &log,
    );

    let groups = graph.parallel_groups().unwrap();
    assert_eq!(groups, vec![vec!["a", "b"], vec!["c", "e"], vec!["d"]]);
}

#[test]
fn empty_graph_orders_to_nothing() {
    let graph = RequestGraph::new();
    assert!(graph.execution_order().unwrap().is_empty());
    assert!(graph.parallel_groups().unwrap().is_empty());
}

#[test]
fn cycles_fail_ordering_with_the_formatted_report() {
    let log = ExecutionLog::new();
    let graph = scripted_graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "b")], &log);

    let expected = graph.format_cycle_error();
    assert!(!expected.is_empty());

    match graph.execution_order() {
        Err(StepdagError::Cycle(msg)) => assert_eq!(msg, expected),
        other => panic!("expected a cycle error, got {other:?}"),
    }
    match graph.parallel_groups() {
        Err(StepdagError::Cycle(msg)) => assert_eq!(msg, expected),
        other => panic!("expected a cycle error, got {other:?}"),
    }
}
