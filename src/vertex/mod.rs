// src/vertex/mod.rs

//! Per-vertex synchronization core.
//!
//! - [`context`] holds the per-vertex state (identity, timestamps, signal
//!   endpoints, work function) and the run sequence.
//! - [`wait`] implements the fan-in: block until every dependency reported.
//! - [`completion`] implements the fan-out: mark finished, notify every
//!   dependent, then report to the orchestrator.
//! - [`result`] holds the outcome types.

pub mod completion;
pub mod context;
pub mod result;
pub mod wait;

pub use context::{DEFAULT_HEARTBEAT, VertexContext};
pub use result::{VertexOutcome, VertexResult};
pub use wait::WaitOutcome;
