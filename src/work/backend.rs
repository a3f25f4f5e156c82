// src/work/backend.rs

//! Pluggable work-function abstraction.
//!
//! A vertex never knows what it runs. The orchestrator hands every vertex the
//! same `VertexWork` implementation plus that vertex's own data, and the
//! vertex calls it at most once, after all of its dependencies succeeded.
//!
//! - [`CommandWork`](super::CommandWork) is the production implementation
//!   used by the `dagwalk` binary: it runs one shell command per vertex.
//! - Tests provide their own implementation that records calls and returns
//!   scripted outcomes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Boxed future returned by [`VertexWork::run`].
pub type WorkFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// Trait abstracting what a vertex does once its dependencies are satisfied.
pub trait VertexWork<D>: Send + Sync {
    /// Run the work for `vertex` and report success.
    ///
    /// Implementations must honor `cancel`: once it fires they should stop
    /// as soon as possible and return `false`.
    fn run<'a>(&'a self, cancel: CancellationToken, vertex: &'a str, data: &'a D) -> WorkFuture<'a>;
}

impl<D, W> VertexWork<D> for Arc<W>
where
    W: VertexWork<D> + ?Sized,
{
    fn run<'a>(&'a self, cancel: CancellationToken, vertex: &'a str, data: &'a D) -> WorkFuture<'a> {
        (**self).run(cancel, vertex, data)
    }
}

/// Adapter turning an async closure `(cancel, vertex, data) -> bool` into a
/// [`VertexWork`]. The closure gets owned copies of the vertex name and data.
pub struct FnWork<F> {
    f: F,
}

impl<F> FnWork<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<D, F, Fut> VertexWork<D> for FnWork<F>
where
    D: Clone + Send + Sync,
    F: Fn(CancellationToken, String, D) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send + 'static,
{
    fn run<'a>(&'a self, cancel: CancellationToken, vertex: &'a str, data: &'a D) -> WorkFuture<'a> {
        Box::pin((self.f)(cancel, vertex.to_string(), data.clone()))
    }
}
