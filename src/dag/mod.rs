// src/dag/mod.rs

//! Request dependency graph.
//!
//! - [`node`] and [`edge`] are the vertices and dependency edges.
//! - [`graph`] holds [`RequestGraph`] with its adjacency indexes.
//! - [`cycles`] finds and explains cycles.
//! - [`ordering`] computes topological orders and parallel layers.
//! - [`visualize`] renders a textual dump.
//!
//! Execution lives in [`crate::engine`].

pub mod cycles;
pub mod edge;
pub mod graph;
pub mod node;
pub mod ordering;
pub mod visualize;

pub use cycles::{CycleAnalysis, CycleDependency, CycleReport};
pub use edge::DependencyEdge;
pub use graph::{GraphMetrics, RequestGraph};
pub use node::{NodeId, RequestNode, ResourceInfo};
