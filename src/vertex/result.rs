// src/vertex/result.rs

//! Per-vertex outcome types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Why a vertex ended the way it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VertexOutcome {
    /// The work function ran and reported success.
    Succeeded,
    /// The work function ran and reported failure.
    WorkFailed,
    /// A dependency reported failure (or vanished); the work function never ran.
    DependencyFailed { dependency: String },
    /// The execution was cancelled while this vertex was still waiting.
    Cancelled,
    /// The run sequence itself broke (wiring bug, panicking work function).
    Internal(String),
}

impl VertexOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, VertexOutcome::Succeeded)
    }

    /// Free-text reason stored in the [`VertexResult`].
    pub fn reason(&self) -> String {
        match self {
            VertexOutcome::Succeeded => "succeeded".to_string(),
            VertexOutcome::WorkFailed => "work function reported failure".to_string(),
            VertexOutcome::DependencyFailed { dependency } => {
                format!("dependency '{dependency}' failed")
            }
            VertexOutcome::Cancelled => "cancelled before running".to_string(),
            VertexOutcome::Internal(detail) => format!("internal error: {detail}"),
        }
    }
}

/// Outcome record of one vertex in one execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VertexResult {
    pub vertex: String,
    /// When the work function was invoked; `None` if it never ran.
    pub start: Option<DateTime<Utc>>,
    pub finish: DateTime<Utc>,
    pub success: bool,
    pub reason: String,
    pub input: Option<Value>,
    pub output: Option<Value>,
}

impl VertexResult {
    /// Whether the work function was actually invoked.
    pub fn was_run(&self) -> bool {
        self.start.is_some()
    }
}
