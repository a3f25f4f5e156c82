// src/vertex/context.rs

//! Vertex execution context: state, registration and the run sequence.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::{DagwalkError, Result};
use crate::kv::Kv;
use crate::records::RecordList;
use crate::signal::{SignalReceiver, SignalSender};
use crate::vertex::result::{VertexOutcome, VertexResult};
use crate::vertex::wait::WaitOutcome;
use crate::work::VertexWork;

/// How often a waiting vertex reports that it is still waiting.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(5);

/// Mutable part of a vertex, guarded by one lock.
#[derive(Debug)]
pub(crate) struct VertexState {
    pub(crate) scheduled_at: Option<DateTime<Utc>>,
    /// When the work function was invoked; stays `None` on the skip path.
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
    /// Inbound signals, keyed by dependency name.
    pub(crate) dependencies: BTreeMap<String, SignalReceiver>,
    /// Outbound signals, keyed by dependent name.
    pub(crate) dependents: BTreeMap<String, SignalSender>,
    /// Report to the orchestrator; taken by the fan-out.
    pub(crate) completion: Option<SignalSender>,
    /// Set once the dependency wait has taken the inbound signals.
    pub(crate) waited: bool,
    /// Set once every dependency reported success.
    pub(crate) cleared: bool,
    /// Heartbeats emitted per dependency while waiting on it.
    pub(crate) heartbeats: BTreeMap<String, u32>,
}

/// Everything one vertex needs for one execution run.
///
/// Created and wired by the orchestrator, executed exactly once by its own
/// task, then discarded.
pub struct VertexContext<D> {
    pub(crate) execution_name: String,
    pub(crate) vertex_name: String,
    pub(crate) heartbeat: Duration,
    pub(crate) state: RwLock<VertexState>,
    data: D,
    work: Arc<dyn VertexWork<D>>,
    pub(crate) outputs: Kv,
    pub(crate) results: RecordList<VertexResult>,
}

impl<D> fmt::Debug for VertexContext<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexContext")
            .field("execution_name", &self.execution_name)
            .field("vertex_name", &self.vertex_name)
            .field("heartbeat", &self.heartbeat)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl<D> VertexContext<D> {
    /// Create an unwired context. `completion` is the producer end of the
    /// signal the orchestrator reads this vertex's final outcome from.
    pub fn new(
        execution_name: impl Into<String>,
        vertex_name: impl Into<String>,
        data: D,
        work: Arc<dyn VertexWork<D>>,
        completion: SignalSender,
    ) -> Self {
        Self {
            execution_name: execution_name.into(),
            vertex_name: vertex_name.into(),
            heartbeat: DEFAULT_HEARTBEAT,
            state: RwLock::new(VertexState {
                scheduled_at: None,
                started_at: None,
                finished_at: None,
                dependencies: BTreeMap::new(),
                dependents: BTreeMap::new(),
                completion: Some(completion),
                waited: false,
                cleared: false,
                heartbeats: BTreeMap::new(),
            }),
            data,
            work,
            outputs: Kv::new(),
            results: RecordList::new(),
        }
    }

    /// Heartbeat interval of the dependency wait (clamped to at least 1ms).
    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat.max(Duration::from_millis(1));
        self
    }

    /// Share the execution-wide output store; the work function writes its
    /// output there under the vertex name.
    pub fn with_outputs(mut self, outputs: Kv) -> Self {
        self.outputs = outputs;
        self
    }

    /// Share the execution-wide list the outcome record is appended to.
    pub fn with_results(mut self, results: RecordList<VertexResult>) -> Self {
        self.results = results;
        self
    }

    pub fn execution_name(&self) -> &str {
        &self.execution_name
    }

    pub fn vertex_name(&self) -> &str {
        &self.vertex_name
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    /// Register the outbound signal towards `dependent`.
    pub fn register_dependent(&self, dependent: impl Into<String>, tx: SignalSender) -> Result<()> {
        let dependent = dependent.into();
        let mut state = self.state.write();
        self.ensure_wiring_open(&state, "dependent", &dependent)?;
        match state.dependents.entry(dependent) {
            Entry::Occupied(e) => Err(DagwalkError::signal_misuse(
                &self.vertex_name,
                format!("dependent '{}' registered twice", e.key()),
            )),
            Entry::Vacant(v) => {
                v.insert(tx);
                Ok(())
            }
        }
    }

    /// Register the inbound signal from `dependency`.
    pub fn register_dependency(&self, dependency: impl Into<String>, rx: SignalReceiver) -> Result<()> {
        let dependency = dependency.into();
        let mut state = self.state.write();
        self.ensure_wiring_open(&state, "dependency", &dependency)?;
        match state.dependencies.entry(dependency) {
            Entry::Occupied(e) => Err(DagwalkError::signal_misuse(
                &self.vertex_name,
                format!("dependency '{}' registered twice", e.key()),
            )),
            Entry::Vacant(v) => {
                v.insert(rx);
                Ok(())
            }
        }
    }

    fn ensure_wiring_open(&self, state: &VertexState, role: &str, name: &str) -> Result<()> {
        if state.scheduled_at.is_some() || state.waited || state.finished_at.is_some() {
            return Err(DagwalkError::signal_misuse(
                &self.vertex_name,
                format!("{role} '{name}' registered after the vertex was scheduled"),
            ));
        }
        Ok(())
    }

    /// Whether the vertex task has started its run sequence.
    pub fn has_started(&self) -> bool {
        self.state.read().scheduled_at.is_some()
    }

    /// Whether the vertex has completed its fan-out.
    pub fn has_finished(&self) -> bool {
        self.state.read().finished_at.is_some()
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().scheduled_at
    }

    /// When the work function was invoked, if it was.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().finished_at
    }

    /// Names of the registered dependencies (empty once the wait has started).
    pub fn dependency_names(&self) -> Vec<String> {
        self.state.read().dependencies.keys().cloned().collect()
    }

    /// Names of the registered dependents (empty once the fan-out happened).
    pub fn dependent_names(&self) -> Vec<String> {
        self.state.read().dependents.keys().cloned().collect()
    }

    /// Number of "still waiting" heartbeats emitted for `dependency`.
    pub fn heartbeats_for(&self, dependency: &str) -> u32 {
        self.state
            .read()
            .heartbeats
            .get(dependency)
            .copied()
            .unwrap_or(0)
    }

    /// Stamp `scheduled_at`. Called once, at the start of the run sequence.
    pub fn mark_scheduled(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.scheduled_at.is_some() {
            return Err(DagwalkError::signal_misuse(
                &self.vertex_name,
                "vertex scheduled twice in one execution",
            ));
        }
        state.scheduled_at = Some(Utc::now());
        Ok(())
    }
}

impl<D> VertexContext<D>
where
    D: Serialize + Send + Sync + 'static,
{
    /// Full run sequence of one vertex:
    /// wait on dependencies, then either run the work function or
    /// short-circuit with a failure, and always fan the outcome out.
    ///
    /// Returns the vertex's own outcome. An `Err` means the one-shot wiring
    /// was broken; dependents have still been sent a failure.
    pub async fn execute(&self, cancel: CancellationToken) -> Result<bool> {
        self.mark_scheduled()?;

        let outcome = match self.wait_dependencies(&cancel).await {
            Ok(WaitOutcome::Proceed) => return self.run(cancel).await,
            Ok(WaitOutcome::DependencyFailed { dependency }) => {
                info!(
                    execution = %self.execution_name,
                    vertex = %self.vertex_name,
                    dependency = %dependency,
                    "dependency failed; skipping work function"
                );
                VertexOutcome::DependencyFailed { dependency }
            }
            Ok(WaitOutcome::Cancelled) => {
                info!(
                    execution = %self.execution_name,
                    vertex = %self.vertex_name,
                    "execution cancelled; skipping work function"
                );
                VertexOutcome::Cancelled
            }
            Err(err) => {
                // Dependents still get their (failed) signal.
                self.complete(VertexOutcome::Internal(err.to_string()))?;
                return Err(err);
            }
        };

        self.complete(outcome)?;
        Ok(false)
    }

    /// Invoke the work function and fan out its result.
    ///
    /// Only valid once, after the dependency wait returned
    /// [`WaitOutcome::Proceed`]. Anything else is rejected before the work
    /// function is touched.
    pub(crate) async fn run(&self, cancel: CancellationToken) -> Result<bool> {
        {
            let mut state = self.state.write();
            if !state.cleared || state.started_at.is_some() || state.finished_at.is_some() {
                return Err(DagwalkError::signal_misuse(
                    &self.vertex_name,
                    "work function invoked outside the run sequence",
                ));
            }
            state.started_at = Some(Utc::now());
        }
        debug!(
            execution = %self.execution_name,
            vertex = %self.vertex_name,
            "invoking work function"
        );

        let success = self.work.run(cancel, &self.vertex_name, &self.data).await;

        let outcome = if success {
            VertexOutcome::Succeeded
        } else {
            VertexOutcome::WorkFailed
        };
        self.complete(outcome)?;
        Ok(success)
    }
}
