// src/engine/mod.rs

//! Orchestration of one DAG execution.
//!
//! The engine owns everything the per-vertex core does not:
//! - building one [`VertexContext`](crate::vertex::VertexContext) per vertex
//!   and wiring one signal per dependency edge ([`execution`]),
//! - launching one Tokio task per vertex,
//! - reading each vertex's completion exactly once and assembling the
//!   [`ExecutionReport`] ([`report`]),
//! - bounding the execution with an optional timeout.

use std::time::Duration;

use crate::config::ConfigSection;
use crate::vertex::DEFAULT_HEARTBEAT;

/// Options shared by every vertex of one execution.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionOptions {
    /// Interval of the "still waiting on dependency" heartbeat.
    pub heartbeat: Duration,
    /// Deadline for the whole execution; `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            heartbeat: DEFAULT_HEARTBEAT,
            timeout: None,
        }
    }
}

impl ExecutionOptions {
    pub fn from_config(section: &ConfigSection) -> Self {
        Self {
            heartbeat: section.heartbeat(),
            timeout: section.timeout(),
        }
    }
}

pub mod execution;
pub mod report;

pub use execution::{Execution, ExecutionBuilder};
pub use report::ExecutionReport;
