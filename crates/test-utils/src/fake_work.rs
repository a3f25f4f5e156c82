use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dagwalk::work::{VertexWork, WorkFuture};
use tokio_util::sync::CancellationToken;

/// What a [`FakeWork`] does when invoked for a given vertex.
#[derive(Debug, Clone)]
pub enum Script {
    Succeed,
    Fail,
    Panic,
    /// Sleep, then report `success`. Cancellation cuts the sleep short and
    /// reports failure.
    Delay { after: Duration, success: bool },
    /// Never finish on its own; only cancellation ends it.
    Hang,
}

/// A fake work function that:
/// - records which vertices were invoked, in invocation order
/// - follows a per-vertex [`Script`] (default: succeed immediately)
/// - records which vertices observed cancellation.
#[derive(Debug, Clone, Default)]
pub struct FakeWork {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    calls: Arc<Mutex<Vec<String>>>,
    cancelled: Arc<Mutex<Vec<String>>>,
}

impl FakeWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, vertex: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(vertex.to_string(), script);
        self
    }

    pub fn failing(self, vertex: &str) -> Self {
        self.script(vertex, Script::Fail)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_called(&self, vertex: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|v| v == vertex)
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }

    fn record_cancel(&self, vertex: &str) {
        self.cancelled.lock().unwrap().push(vertex.to_string());
    }
}

impl<D: Send + Sync> VertexWork<D> for FakeWork {
    fn run<'a>(&'a self, cancel: CancellationToken, vertex: &'a str, _data: &'a D) -> WorkFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(vertex.to_string());
            let script = self
                .scripts
                .lock()
                .unwrap()
                .get(vertex)
                .cloned()
                .unwrap_or(Script::Succeed);

            match script {
                Script::Succeed => true,
                Script::Fail => false,
                Script::Panic => panic!("scripted panic in vertex '{vertex}'"),
                Script::Delay { after, success } => {
                    tokio::select! {
                        _ = tokio::time::sleep(after) => success,
                        _ = cancel.cancelled() => {
                            self.record_cancel(vertex);
                            false
                        }
                    }
                }
                Script::Hang => {
                    cancel.cancelled().await;
                    self.record_cancel(vertex);
                    false
                }
            }
        })
    }
}
