// src/vertex/completion.rs

//! Completion signal protocol (fan-out).

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{DagwalkError, Result};
use crate::vertex::context::VertexContext;
use crate::vertex::result::{VertexOutcome, VertexResult};

impl<D> VertexContext<D>
where
    D: Serialize,
{
    /// Mark the vertex finished and propagate `outcome`.
    ///
    /// In order:
    /// 1. stamp `finished_at` (exactly once; a second call is a
    ///    [`DagwalkError::SignalMisuse`]),
    /// 2. append the [`VertexResult`] to the execution's record list,
    /// 3. send the outcome to every dependent, in name order,
    /// 4. report the outcome to the orchestrator.
    pub fn complete(&self, outcome: VertexOutcome) -> Result<()> {
        let success = outcome.is_success();

        let (dependents, completion, started_at, finished_at) = {
            let mut state = self.state.write();
            if state.finished_at.is_some() {
                return Err(DagwalkError::signal_misuse(
                    &self.vertex_name,
                    "completion fan-out attempted twice",
                ));
            }
            let now = Utc::now();
            state.finished_at = Some(now);
            (
                std::mem::take(&mut state.dependents),
                state.completion.take(),
                state.started_at,
                now,
            )
        };

        self.results.add(VertexResult {
            vertex: self.vertex_name.clone(),
            start: started_at,
            finish: finished_at,
            success,
            reason: outcome.reason(),
            input: self.input_payload(),
            output: self.outputs.get_value(&self.vertex_name),
        });

        for (dependent, tx) in dependents {
            if tx.send(success) {
                info!(
                    execution = %self.execution_name,
                    from = %self.vertex_name,
                    to = %dependent,
                    success,
                    "sent completion to dependent"
                );
            } else {
                warn!(
                    execution = %self.execution_name,
                    from = %self.vertex_name,
                    to = %dependent,
                    "dependent no longer listening; completion dropped"
                );
            }
        }

        let Some(completion) = completion else {
            return Err(DagwalkError::signal_misuse(
                &self.vertex_name,
                "own completion signal missing",
            ));
        };
        if !completion.send(success) {
            warn!(
                execution = %self.execution_name,
                vertex = %self.vertex_name,
                "orchestrator no longer listening for this vertex"
            );
        }
        info!(
            execution = %self.execution_name,
            vertex = %self.vertex_name,
            success,
            reason = %outcome.reason(),
            "own completion reported"
        );

        Ok(())
    }

    fn input_payload(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self.data())
            .ok()
            .filter(|v| !v.is_null())
    }
}
