// src/work/mod.rs

//! Vertex work functions.
//!
//! - [`backend`] provides the `VertexWork` trait every vertex calls once its
//!   dependencies succeeded, plus a closure adapter.
//! - [`command`] provides `CommandWork`, which runs a shell command per
//!   vertex using `tokio::process::Command`.

pub mod backend;
pub mod command;

pub use backend::{FnWork, VertexWork, WorkFuture};
pub use command::{CommandVertex, CommandWork};
