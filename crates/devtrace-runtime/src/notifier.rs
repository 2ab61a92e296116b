//! Snapshot fan-out to observers.
//!
//! A thin layer over a broadcast channel so the orchestrator loop can push a
//! [`StateSnapshot`] without awaiting. An observer that stops draining its
//! receiver lags and misses intermediate snapshots instead of slowing the
//! loop; the latest state is always available through
//! [`OrchestratorHandle::snapshot`](crate::orchestrator::OrchestratorHandle::snapshot).

use tokio::sync::broadcast;

use devtrace_core::snapshot::StateSnapshot;

/// Fans state snapshots out to observers.
pub struct StateNotifier {
    tx: broadcast::Sender<StateSnapshot>,
}

impl StateNotifier {
    /// Create a notifier whose observers may fall up to `capacity`
    /// snapshots behind before missing any.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Push a snapshot to every observer without awaiting. Returns the
    /// number of observers reached; zero observers is not an error.
    pub fn publish(&self, snapshot: StateSnapshot) -> usize {
        self.tx.send(snapshot).unwrap_or(0)
    }

    /// Open a receiver for snapshots published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateSnapshot> {
        self.tx.subscribe()
    }
}
