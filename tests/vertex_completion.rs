// tests/vertex_completion.rs

mod common;
use crate::common::{FakeWork, connect, init_tracing, vertex_context, with_timeout};

use dagwalk::errors::DagwalkError;
use dagwalk::kv::Kv;
use dagwalk::records::RecordList;
use dagwalk::signal::{self, Signal};
use dagwalk::vertex::{VertexOutcome, VertexResult};
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn root_success_reaches_orchestrator_and_every_dependent() {
    init_tracing();
    let (root, mut root_rx) = vertex_context("root", FakeWork::new());
    let (tx_x, mut rx_x) = signal::channel();
    let (tx_y, mut rx_y) = signal::channel();
    root.register_dependent("x", tx_x).unwrap();
    root.register_dependent("y", tx_y).unwrap();

    let ok = with_timeout(root.execute(CancellationToken::new()))
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(root_rx.recv().await, Signal::Value(true));
    assert_eq!(rx_x.recv().await, Signal::Value(true));
    assert_eq!(rx_y.recv().await, Signal::Value(true));
    assert!(root.dependent_names().is_empty());
}

#[tokio::test]
async fn every_dependent_gets_its_own_copy_of_the_outcome() {
    init_tracing();
    let work = FakeWork::new().failing("hub");
    let (hub, mut hub_rx) = vertex_context("hub", work.clone());

    let mut receivers = Vec::new();
    for name in ["d1", "d2", "d3"] {
        let (tx, rx) = signal::channel();
        hub.register_dependent(name, tx).unwrap();
        receivers.push(rx);
    }

    let ok = with_timeout(hub.execute(CancellationToken::new()))
        .await
        .unwrap();
    assert!(!ok);
    assert_eq!(hub_rx.recv().await, Signal::Value(false));

    for rx in receivers.iter_mut() {
        assert_eq!(rx.recv().await, Signal::Value(false));
        // Exactly one value per channel, then closed.
        assert_eq!(rx.recv().await, Signal::Closed);
    }
}

#[tokio::test]
async fn completing_twice_is_signal_misuse() {
    init_tracing();
    let (ctx, mut rx) = vertex_context("v", FakeWork::new());

    ctx.complete(VertexOutcome::Succeeded).unwrap();
    let err = ctx.complete(VertexOutcome::WorkFailed).unwrap_err();

    assert!(matches!(err, DagwalkError::SignalMisuse { ref vertex, .. } if vertex == "v"));
    assert_eq!(rx.recv().await, Signal::Value(true));
}

#[tokio::test]
async fn timestamps_are_ordered() {
    init_tracing();
    let (ctx, _rx) = vertex_context("v", FakeWork::new());
    assert!(!ctx.has_started());
    assert!(!ctx.has_finished());

    ctx.execute(CancellationToken::new()).await.unwrap();

    let scheduled = ctx.scheduled_at().unwrap();
    let started = ctx.started_at().unwrap();
    let finished = ctx.finished_at().unwrap();
    assert!(scheduled <= started);
    assert!(started <= finished);
    assert!(ctx.has_started());
    assert!(ctx.has_finished());
}

#[tokio::test]
async fn registration_after_scheduling_is_rejected() {
    init_tracing();
    let (ctx, _rx) = vertex_context("v", FakeWork::new());
    ctx.mark_scheduled().unwrap();

    let (tx, rx) = signal::channel();
    assert!(matches!(
        ctx.register_dependent("late", tx),
        Err(DagwalkError::SignalMisuse { .. })
    ));
    assert!(matches!(
        ctx.register_dependency("late", rx),
        Err(DagwalkError::SignalMisuse { .. })
    ));
    assert!(ctx.mark_scheduled().is_err());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    init_tracing();
    let (a, _a_rx) = vertex_context("a", FakeWork::new());
    let (b, _b_rx) = vertex_context("b", FakeWork::new());
    connect(&a, &b);

    let (tx, rx) = signal::channel();
    assert!(a.register_dependent("b", tx).is_err());
    assert!(b.register_dependency("a", rx).is_err());
    assert_eq!(a.dependent_names(), vec!["b".to_string()]);
    assert_eq!(b.dependency_names(), vec!["a".to_string()]);
}

#[tokio::test]
async fn executing_twice_calls_the_work_function_once() {
    init_tracing();
    let work = FakeWork::new();
    let (ctx, mut rx) = vertex_context("v", work.clone());

    assert!(ctx.execute(CancellationToken::new()).await.unwrap());
    let err = ctx.execute(CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, DagwalkError::SignalMisuse { .. }));
    assert_eq!(work.calls(), vec!["v"]);
    assert_eq!(rx.recv().await, Signal::Value(true));
    assert_eq!(rx.recv().await, Signal::Closed);
}

#[tokio::test]
async fn outcome_record_carries_input_and_output() {
    init_tracing();
    let outputs = Kv::new();
    let results: RecordList<VertexResult> = RecordList::new();
    let (tx, mut rx) = signal::channel();
    let ctx = dagwalk::vertex::VertexContext::new(
        "exec",
        "deploy",
        json!({ "replicas": 3 }),
        std::sync::Arc::new(FakeWork::new()),
        tx,
    )
    .with_outputs(outputs.clone())
    .with_results(results.clone());

    outputs.add_entry("deploy", json!({ "exit_code": 0 }));
    ctx.execute(CancellationToken::new()).await.unwrap();
    assert!(rx.recv().await.is_success());

    let records = results.get();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.vertex, "deploy");
    assert!(record.success);
    assert!(record.was_run());
    assert_eq!(record.input, Some(json!({ "replicas": 3 })));
    assert_eq!(record.output, Some(json!({ "exit_code": 0 })));
}

#[tokio::test]
async fn skipped_vertex_record_has_no_start() {
    init_tracing();
    let results: RecordList<VertexResult> = RecordList::new();
    let (ctx, _rx) = vertex_context("leaf", FakeWork::new());
    let ctx = ctx.with_results(results.clone());
    let (tx, rx) = signal::channel();
    ctx.register_dependency("root", rx).unwrap();
    tx.send(false);

    assert!(!ctx.execute(CancellationToken::new()).await.unwrap());

    let records = results.get();
    assert_eq!(records.len(), 1);
    assert!(!records[0].was_run());
    assert!(!records[0].success);
    assert!(records[0].reason.contains("root"));
}
