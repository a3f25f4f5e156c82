// src/vertex/wait.rs

//! Dependency wait protocol (fan-in).

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{DagwalkError, Result};
use crate::signal::Signal;
use crate::vertex::context::VertexContext;

/// Result of waiting on all dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every dependency reported success; the work function may run.
    Proceed,
    /// `dependency` reported failure (or dropped its signal unsent).
    DependencyFailed { dependency: String },
    /// The execution was cancelled before all dependencies reported.
    Cancelled,
}

impl<D> VertexContext<D> {
    /// Block until every dependency reported, one dependency at a time in
    /// name order.
    ///
    /// A dependency that stays silent for longer than the heartbeat interval
    /// does not abort the wait; it only produces a "still waiting" log line
    /// and bumps [`heartbeats_for`](Self::heartbeats_for). The wait ends on
    /// the first failure, on cancellation, or once all dependencies
    /// succeeded.
    ///
    /// Waiting one dependency at a time loses nothing: every signal has its
    /// own buffered slot, so an outcome sent while we are busy with another
    /// dependency is simply picked up later.
    pub async fn wait_dependencies(&self, cancel: &CancellationToken) -> Result<WaitOutcome> {
        let dependencies = {
            let mut state = self.state.write();
            if state.waited {
                return Err(DagwalkError::signal_misuse(
                    &self.vertex_name,
                    "dependency wait started twice",
                ));
            }
            state.waited = true;
            std::mem::take(&mut state.dependencies)
        };

        info!(
            execution = %self.execution_name,
            vertex = %self.vertex_name,
            deps = ?dependencies.keys().collect::<Vec<_>>(),
            "waiting on dependencies"
        );

        for (dependency, mut rx) in dependencies {
            loop {
                let received = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        info!(
                            execution = %self.execution_name,
                            vertex = %self.vertex_name,
                            dependency = %dependency,
                            "cancelled while waiting on dependency"
                        );
                        return Ok(WaitOutcome::Cancelled);
                    }
                    r = tokio::time::timeout(self.heartbeat, rx.recv()) => r,
                };

                match received {
                    Ok(Signal::Value(true)) => {
                        debug!(
                            from = %dependency,
                            to = %self.vertex_name,
                            success = true,
                            "received completion"
                        );
                        break;
                    }
                    Ok(Signal::Value(false)) => {
                        debug!(
                            from = %dependency,
                            to = %self.vertex_name,
                            success = false,
                            "received completion"
                        );
                        return Ok(WaitOutcome::DependencyFailed { dependency });
                    }
                    Ok(Signal::Abandoned) => {
                        warn!(
                            from = %dependency,
                            to = %self.vertex_name,
                            "dependency dropped its signal without reporting; treating as failure"
                        );
                        return Ok(WaitOutcome::DependencyFailed { dependency });
                    }
                    Ok(Signal::Closed) => {
                        return Err(DagwalkError::signal_misuse(
                            &self.vertex_name,
                            format!("signal from dependency '{dependency}' was already consumed"),
                        ));
                    }
                    Err(_elapsed) => {
                        self.record_heartbeat(&dependency);
                        info!(
                            execution = %self.execution_name,
                            vertex = %self.vertex_name,
                            dependency = %dependency,
                            interval = ?self.heartbeat,
                            "still waiting on dependency"
                        );
                    }
                }
            }
        }

        self.state.write().cleared = true;
        info!(
            execution = %self.execution_name,
            vertex = %self.vertex_name,
            "finished waiting on dependencies"
        );
        Ok(WaitOutcome::Proceed)
    }

    fn record_heartbeat(&self, dependency: &str) {
        let mut state = self.state.write();
        *state.heartbeats.entry(dependency.to_string()).or_insert(0) += 1;
    }
}
