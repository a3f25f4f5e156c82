// tests/signal_channel.rs

use std::time::Duration;

use dagwalk::signal::{self, Signal};

#[tokio::test]
async fn value_sent_from_another_task_is_received_once() {
    let (tx, mut rx) = signal::channel();

    let producer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(false)
    });

    assert_eq!(rx.recv().await, Signal::Value(false));
    assert!(producer.await.unwrap());
    assert_eq!(rx.recv().await, Signal::Closed);
}

#[tokio::test]
async fn timed_out_read_keeps_the_value_for_the_next_read() {
    let (tx, mut rx) = signal::channel();

    let first = tokio::time::timeout(Duration::from_millis(10), rx.recv()).await;
    assert!(first.is_err(), "nothing was sent yet");
    assert!(!rx.is_terminated());

    assert!(tx.send(true));
    let second = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
    assert_eq!(second.unwrap(), Signal::Value(true));
}

#[tokio::test]
async fn dropped_producer_is_abandoned_not_success() {
    let (tx, mut rx) = signal::channel();
    drop(tx);

    let signal = rx.recv().await;
    assert_eq!(signal, Signal::Abandoned);
    assert!(!signal.is_success());
}

#[test]
fn send_to_dropped_consumer_reports_false() {
    let (tx, rx) = signal::channel();
    drop(rx);
    assert!(tx.is_closed());
    assert!(!tx.send(true));
}

#[test]
fn try_recv_before_and_after_send() {
    let (tx, mut rx) = signal::channel();
    assert_eq!(rx.try_recv(), None);
    tx.send(true);
    assert_eq!(rx.try_recv(), Some(Signal::Value(true)));
    assert_eq!(rx.try_recv(), Some(Signal::Closed));
}
