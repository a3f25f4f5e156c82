pub mod builders;
pub mod fake_work;

use std::sync::{Arc, Once};
use std::time::Duration;

use dagwalk::signal::{self, SignalReceiver};
use dagwalk::vertex::VertexContext;
use dagwalk::work::VertexWork;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Standalone context for `vertex` in execution "test", plus the consumer
/// end of its own completion signal.
pub fn vertex_context<W>(vertex: &str, work: W) -> (VertexContext<()>, SignalReceiver)
where
    W: VertexWork<()> + 'static,
{
    let (tx, rx) = signal::channel();
    let ctx = VertexContext::new("test", vertex, (), Arc::new(work), tx);
    (ctx, rx)
}

/// Wire one edge `producer -> consumer` the way the orchestrator does.
pub fn connect<D>(producer: &VertexContext<D>, consumer: &VertexContext<D>) {
    let (tx, rx) = signal::channel();
    producer
        .register_dependent(consumer.vertex_name(), tx)
        .expect("register dependent");
    consumer
        .register_dependency(producer.vertex_name(), rx)
        .expect("register dependency");
}
