// src/dag/mod.rs

//! DAG representation.
//!
//! - [`graph`] holds the adjacency of vertices (dependencies and dependents)
//!   that the orchestrator wires signals along.

pub mod graph;

pub use graph::DagGraph;
