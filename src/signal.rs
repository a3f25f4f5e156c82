// src/signal.rs

//! One-shot completion signal between exactly two vertices (or a vertex and
//! the orchestrator).
//!
//! A signal carries a single boolean outcome from one producer to one
//! consumer and is closed afterwards:
//!
//! - [`SignalSender::send`] consumes the sender, so a second send does not
//!   type-check.
//! - [`SignalReceiver::recv`] yields the value once. Every later read yields
//!   [`Signal::Closed`].
//! - If the producer is dropped without sending (e.g. its task panicked), the
//!   consumer observes [`Signal::Abandoned`].
//!
//! The slot is buffered (one value), so sending never waits for the
//! consumer to be ready.

use tokio::sync::oneshot;

/// What a consumer observes when it reads a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The producer reported this outcome (`true` = success).
    Value(bool),
    /// The producer went away without ever sending an outcome.
    Abandoned,
    /// The value was already consumed by an earlier read.
    Closed,
}

impl Signal {
    /// Outcome as seen by a dependent: only an explicit `Value(true)` counts
    /// as success.
    pub fn is_success(self) -> bool {
        matches!(self, Signal::Value(true))
    }
}

/// Create a connected producer/consumer pair for one edge.
pub fn channel() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = oneshot::channel();
    (SignalSender { tx }, SignalReceiver { rx: Some(rx) })
}

/// Producer end. Sends exactly one outcome.
#[derive(Debug)]
pub struct SignalSender {
    tx: oneshot::Sender<bool>,
}

impl SignalSender {
    /// Send the outcome and close the signal.
    ///
    /// Returns `false` if the consumer end has already been dropped, in which
    /// case nobody will ever observe the value.
    pub fn send(self, outcome: bool) -> bool {
        self.tx.send(outcome).is_ok()
    }

    /// Whether the consumer end is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer end.
#[derive(Debug)]
pub struct SignalReceiver {
    rx: Option<oneshot::Receiver<bool>>,
}

impl SignalReceiver {
    /// Wait for the producer's outcome.
    ///
    /// Cancel safe: if the returned future is dropped before completion (for
    /// instance by a heartbeat timeout), no value is lost and the next call
    /// keeps waiting on the same slot.
    pub async fn recv(&mut self) -> Signal {
        let Some(rx) = self.rx.as_mut() else {
            return Signal::Closed;
        };

        let received = rx.await;
        self.rx = None;

        match received {
            Ok(outcome) => Signal::Value(outcome),
            Err(_) => Signal::Abandoned,
        }
    }

    /// Non-blocking read. `None` means the producer has not sent yet.
    pub fn try_recv(&mut self) -> Option<Signal> {
        let Some(rx) = self.rx.as_mut() else {
            return Some(Signal::Closed);
        };

        match rx.try_recv() {
            Ok(outcome) => {
                self.rx = None;
                Some(Signal::Value(outcome))
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.rx = None;
                Some(Signal::Abandoned)
            }
        }
    }

    /// `true` once the value (or the abandonment) has been observed.
    pub fn is_terminated(&self) -> bool {
        self.rx.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_read_observes_closed() {
        let (tx, mut rx) = channel();
        assert!(tx.send(true));
        assert_eq!(rx.recv().await, Signal::Value(true));
        assert_eq!(rx.recv().await, Signal::Closed);
        assert!(rx.is_terminated());
    }

    #[test]
    fn try_recv_sees_abandonment_once() {
        let (tx, mut rx) = channel();
        drop(tx);
        assert_eq!(rx.try_recv(), Some(Signal::Abandoned));
        assert!(rx.is_terminated());
        assert_eq!(rx.try_recv(), Some(Signal::Closed));
    }
}
