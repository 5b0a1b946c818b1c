//! Cooperative shutdown signalling
//!
//! Shutdown is observed between queue pulls: a worker never aborts
//! mid-record. The controller broadcasts over a `watch` channel; each
//! worker holds a clone of the signal and finishes its in-flight record
//! before transitioning to Stopped.

use tokio::sync::watch;

/// Broadcasts the shutdown signal to every worker
#[derive(Debug)]
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

impl ShutdownController {
    /// Create a controller with no shutdown in progress
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Obtain a signal handle for one worker
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Signal all workers to drain and stop
    pub fn trigger(&self) {
        // Send only fails when every receiver is gone, which means all
        // workers already stopped.
        let _ = self.tx.send(true);
    }

    /// Whether shutdown has been triggered
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-worker view of the shutdown signal
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Whether shutdown has been triggered
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is triggered
    ///
    /// Also resolves when the controller is dropped, which a worker treats
    /// the same way as an explicit shutdown.
    pub async fn triggered(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
