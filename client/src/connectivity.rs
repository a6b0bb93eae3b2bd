//! Connectivity monitoring.
//!
//! The monitor mirrors platform-reported reachability as-is: no probing, no
//! retry, and it never blocks a caller. Consumers subscribe to a watch
//! channel and are notified on every transition.

use std::sync::Arc;
use tokio::sync::watch;

/// A reachability snapshot as reported by the platform.
///
/// `None` means the sub-signal is not yet known; unknown counts as offline,
/// so nothing is sent into a link that may not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetState {
    /// Whether a network interface is connected
    pub connected: Option<bool>,
    /// Whether the internet is actually reachable over it
    pub internet_reachable: Option<bool>,
}

impl NetState {
    /// Both sub-signals positively reported.
    pub fn online() -> Self {
        Self {
            connected: Some(true),
            internet_reachable: Some(true),
        }
    }

    /// Both sub-signals negatively reported.
    pub fn offline() -> Self {
        Self {
            connected: Some(false),
            internet_reachable: Some(false),
        }
    }

    /// Online only when both sub-signals are known true.
    pub fn is_online(&self) -> bool {
        self.connected == Some(true) && self.internet_reachable == Some(true)
    }
}

/// Publishes reachability snapshots to any number of subscribers.
///
/// Clones share the same channel; the platform integration calls
/// [`report`](Self::report), everything else reads.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<NetState>>,
}

impl ConnectivityMonitor {
    /// Create a monitor in the unknown (offline) state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(NetState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Publish a platform-observed snapshot. Subscribers are only woken when
    /// the state actually changed.
    pub fn report(&self, state: NetState) {
        self.tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            tracing::info!(
                online = state.is_online(),
                ?state,
                "connectivity changed"
            );
            *current = state;
            true
        });
    }

    /// The most recently reported state.
    pub fn current(&self) -> NetState {
        *self.tx.borrow()
    }

    /// Whether the derived online flag is currently true.
    pub fn is_online(&self) -> bool {
        self.current().is_online()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<NetState> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}
