use tokio::sync::oneshot;

use super::error::ExchangeError;

/// What the inbound drainer observed before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Number of responses handed to the observer.
    pub received: u64,
    /// `true` when the drainer stopped because it was told to unwind, rather than at end-of-stream.
    pub unwound: bool,
}

pub type DrainOutcome = Result<DrainReport, ExchangeError>;

/// Create a connected completion signal and waiter.
pub fn completion_channel() -> (CompletionSignal, CompletionWaiter) {
    let (tx, rx) = oneshot::channel();
    (CompletionSignal { tx }, CompletionWaiter { rx: Some(rx) })
}

/// The writing end of the drainer's completion signal.
///
/// Firing consumes the signal, so it can fire at most once. Dropping it without firing is reported
/// to the waiter as [`ExchangeError::DrainerLost`].
#[derive(Debug)]
pub struct CompletionSignal {
    tx: oneshot::Sender<DrainOutcome>,
}

impl CompletionSignal {
    pub fn fire(self, outcome: DrainOutcome) {
        // The waiter is gone only when the coordinator itself was dropped.
        let _ = self.tx.send(outcome);
    }
}

/// The reading end of the drainer's completion signal.
#[derive(Debug)]
pub struct CompletionWaiter {
    rx: Option<oneshot::Receiver<DrainOutcome>>,
}

impl CompletionWaiter {
    /// Wait for the drainer to finish.
    ///
    /// Cancel safe: if the returned future is dropped before it resolves, a later call keeps
    /// waiting on the same signal. Once an outcome was observed, later calls report
    /// [`ExchangeError::DrainerLost`].
    pub async fn wait(&mut self) -> DrainOutcome {
        let Some(rx) = self.rx.as_mut() else {
            return Err(ExchangeError::DrainerLost);
        };

        let outcome = rx.await;
        self.rx = None;
        outcome.unwrap_or(Err(ExchangeError::DrainerLost))
    }

    pub fn is_observed(&self) -> bool {
        self.rx.is_none()
    }
}
