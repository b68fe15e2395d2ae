use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable, level-triggered cancellation flag.
///
/// Once [`cancel`](Self::cancel) is called every current and future
/// [`cancelled`](Self::cancelled) future resolves. Cancelling is irreversible.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    inner: Arc<watch::Sender<bool>>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(tx),
        }
    }

    pub fn cancel(&self) {
        self.inner.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.borrow()
    }

    /// A guard that cancels this signal when dropped, unless it is disarmed first.
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            signal: Some(self.clone()),
        }
    }

    /// Resolves once the signal has been cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.inner.subscribe();
        // The sender lives as long as `self`, so this only returns once the flag is set.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels its signal on drop, so a task that dies mid-flight still releases its peers.
///
/// Call [`disarm`](Self::disarm) once the task has finished normally.
#[derive(Debug)]
pub struct CancelOnDrop {
    signal: Option<CancellationSignal>,
}

impl CancelOnDrop {
    pub fn disarm(mut self) {
        self.signal = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.take() {
            signal.cancel();
        }
    }
}
