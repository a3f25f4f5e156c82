// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DagwalkError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Vertex not found: {0}")]
    VertexNotFound(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A one-shot signal was wired, sent or read in a way that breaks the
    /// "exactly one value, then closed" contract. Always a wiring bug.
    #[error("Signal misuse on vertex '{vertex}': {detail}")]
    SignalMisuse { vertex: String, detail: String },

    #[error("Execution '{execution}' failed; failed vertices: {failed:?}")]
    ExecutionFailed {
        execution: String,
        failed: Vec<String>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DagwalkError {
    pub fn signal_misuse(vertex: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SignalMisuse {
            vertex: vertex.into(),
            detail: detail.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagwalkError>;
