// src/engine/report.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{DagwalkError, Result};
use crate::vertex::VertexResult;

/// Whole-execution outcome assembled by the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub execution: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `true` iff every vertex reported success.
    pub success: bool,
    /// Whether the execution's cancellation token fired (Ctrl-C or timeout).
    pub cancelled: bool,
    /// Outcome record per vertex, keyed by vertex name.
    pub vertices: BTreeMap<String, VertexResult>,
}

impl ExecutionReport {
    pub fn result(&self, vertex: &str) -> Option<&VertexResult> {
        self.vertices.get(vertex)
    }

    /// Vertices whose outcome is failure (including skipped ones).
    pub fn failed(&self) -> Vec<&str> {
        self.vertices
            .values()
            .filter(|r| !r.success)
            .map(|r| r.vertex.as_str())
            .collect()
    }

    /// Vertices whose work function never ran.
    pub fn skipped(&self) -> Vec<&str> {
        self.vertices
            .values()
            .filter(|r| !r.was_run())
            .map(|r| r.vertex.as_str())
            .collect()
    }

    /// Turn a failed execution into [`DagwalkError::ExecutionFailed`].
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(DagwalkError::ExecutionFailed {
                failed: self.failed().into_iter().map(str::to_string).collect(),
                execution: self.execution,
            })
        }
    }
}
