// src/engine/execution.rs

//! Building and running one execution of a vertex DAG.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dag::DagGraph;
use crate::engine::report::ExecutionReport;
use crate::engine::ExecutionOptions;
use crate::errors::{DagwalkError, Result};
use crate::kv::Kv;
use crate::records::RecordList;
use crate::signal::{self, SignalReceiver};
use crate::vertex::{VertexContext, VertexOutcome, VertexResult};
use crate::work::VertexWork;

/// Configures an [`Execution`] before its graph is wired.
#[derive(Debug, Clone)]
pub struct ExecutionBuilder {
    name: String,
    options: ExecutionOptions,
    outputs: Kv,
}

impl ExecutionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: ExecutionOptions::default(),
            outputs: Kv::new(),
        }
    }

    pub fn options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Share an output store with the work function (e.g. `CommandWork`).
    pub fn outputs(mut self, outputs: Kv) -> Self {
        self.outputs = outputs;
        self
    }

    /// Create one context per vertex of `graph` and wire every edge.
    ///
    /// `data_for` produces each vertex's data. Every signal is registered
    /// here, before any vertex task exists, so the run phase never changes
    /// the wiring.
    pub fn build<D, F>(self, graph: &DagGraph, work: Arc<dyn VertexWork<D>>, mut data_for: F) -> Result<Execution<D>>
    where
        D: Serialize + Send + Sync + 'static,
        F: FnMut(&str) -> Result<D>,
    {
        let ExecutionBuilder {
            name,
            options,
            outputs,
        } = self;
        let results = RecordList::new();

        let mut contexts = BTreeMap::new();
        let mut completions = BTreeMap::new();

        for vertex in graph.vertices() {
            let data = data_for(vertex)?;
            let (tx, rx) = signal::channel();
            let ctx = VertexContext::new(&name, vertex, data, Arc::clone(&work), tx)
                .with_heartbeat(options.heartbeat)
                .with_outputs(outputs.clone())
                .with_results(results.clone());
            contexts.insert(vertex.to_string(), Arc::new(ctx));
            completions.insert(vertex.to_string(), rx);
        }

        // One signal per edge: the producer end goes to the dependency, the
        // consumer end to the dependent.
        for (dependency, dependent) in graph.edges() {
            let producer = contexts
                .get(dependency)
                .ok_or_else(|| DagwalkError::VertexNotFound(dependency.to_string()))?;
            let consumer = contexts
                .get(dependent)
                .ok_or_else(|| DagwalkError::VertexNotFound(dependent.to_string()))?;

            let (tx, rx) = signal::channel();
            producer.register_dependent(dependent, tx)?;
            consumer.register_dependency(dependency, rx)?;
            debug!(execution = %name, from = %dependency, to = %dependent, "wired signal");
        }

        Ok(Execution {
            name,
            options,
            roots: graph.roots().into_iter().map(str::to_string).collect(),
            contexts,
            completions,
            outputs,
            results,
        })
    }
}

/// A fully wired graph of vertex contexts, ready to run once.
pub struct Execution<D> {
    name: String,
    options: ExecutionOptions,
    roots: Vec<String>,
    contexts: BTreeMap<String, Arc<VertexContext<D>>>,
    /// Consumer ends of every vertex's own completion signal.
    completions: BTreeMap<String, SignalReceiver>,
    outputs: Kv,
    results: RecordList<VertexResult>,
}

impl<D> fmt::Debug for Execution<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("vertices", &self.contexts.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Execution<()> {
    /// Start configuring an execution called `name`.
    pub fn builder(name: impl Into<String>) -> ExecutionBuilder {
        ExecutionBuilder::new(name)
    }
}

impl<D> Execution<D>
where
    D: Serialize + Send + Sync + 'static,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Context of one vertex, for probing `has_started` / `has_finished`
    /// while the execution runs.
    pub fn context(&self, vertex: &str) -> Option<Arc<VertexContext<D>>> {
        self.contexts.get(vertex).cloned()
    }

    pub fn outputs(&self) -> &Kv {
        &self.outputs
    }

    /// Run every vertex as its own task and wait for all of them.
    ///
    /// Each vertex's completion signal is read exactly once. Cancelling
    /// `cancel` (or hitting the configured timeout) stops vertices that are
    /// still waiting and is passed on to running work functions.
    pub async fn run(self, cancel: CancellationToken) -> Result<ExecutionReport> {
        let Execution {
            name,
            options,
            roots,
            contexts,
            completions,
            outputs: _,
            results,
        } = self;

        // A timeout only cancels this execution, never the caller's token.
        let cancel = cancel.child_token();
        let started_at = Utc::now();
        info!(
            execution = %name,
            vertices = contexts.len(),
            ?roots,
            "starting execution"
        );

        let deadline = options.timeout.map(|timeout| {
            let cancel = cancel.clone();
            let name = name.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(timeout) => {
                        warn!(execution = %name, ?timeout, "execution timed out; cancelling");
                        cancel.cancel();
                    }
                    _ = cancel.cancelled() => {}
                }
            })
        });

        let mut handles = Vec::with_capacity(contexts.len());
        for ctx in contexts.values() {
            let ctx = Arc::clone(ctx);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(run_vertex(ctx, cancel)));
        }

        let mut outcomes = BTreeMap::new();
        for (vertex, mut rx) in completions {
            let signal = rx.recv().await;
            debug!(execution = %name, vertex = %vertex, ?signal, "vertex completion received");
            outcomes.insert(vertex, signal.is_success());
        }

        for handle in handles {
            if let Err(err) = handle.await {
                error!(execution = %name, error = %err, "vertex task did not finish cleanly");
            }
        }
        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let mut vertices: BTreeMap<String, VertexResult> = results
            .get()
            .into_iter()
            .map(|r| (r.vertex.clone(), r))
            .collect();
        for (vertex, success) in &outcomes {
            match vertices.get_mut(vertex) {
                Some(record) => record.success = *success,
                None => warn!(execution = %name, vertex = %vertex, "vertex completed without an outcome record"),
            }
        }

        let report = ExecutionReport {
            execution: name,
            started_at,
            finished_at: Utc::now(),
            success: outcomes.values().all(|s| *s),
            cancelled: cancel.is_cancelled(),
            vertices,
        };

        info!(
            execution = %report.execution,
            success = report.success,
            failed = ?report.failed(),
            "execution finished"
        );
        Ok(report)
    }
}

/// Task body of one vertex. A panicking work function must not leave its
/// dependents waiting forever, so the panic is turned into a failed fan-out.
async fn run_vertex<D>(ctx: Arc<VertexContext<D>>, cancel: CancellationToken)
where
    D: Serialize + Send + Sync + 'static,
{
    match AssertUnwindSafe(ctx.execute(cancel)).catch_unwind().await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => {
            error!(
                execution = %ctx.execution_name(),
                vertex = %ctx.vertex_name(),
                error = %err,
                "vertex run sequence failed"
            );
        }
        Err(panic) => {
            let detail = panic_message(&*panic);
            error!(
                execution = %ctx.execution_name(),
                vertex = %ctx.vertex_name(),
                panic = %detail,
                "work function panicked"
            );
            if !ctx.has_finished() {
                let outcome = VertexOutcome::Internal(format!("work function panicked: {detail}"));
                if let Err(err) = ctx.complete(outcome) {
                    error!(vertex = %ctx.vertex_name(), error = %err, "failed to report panicked vertex");
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
