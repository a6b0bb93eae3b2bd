//! The sync engine: replaying queued offline mutations against the remote
//! store once connectivity returns.
//!
//! Replay order is creates, then updates, then deletes, each in insertion
//! order: an update or delete queued after a provisional create logically
//! targets that create's eventual identity, so creates go first. Target ids
//! of already-queued updates and deletes are not rewritten when a create is
//! assigned its remote id; such entries fail replay and stay queued.

use crate::error::Result;
use crate::queue::DurableQueue;
use crate::remote::RemoteStore;
use crate::store::TaskStore;
use stash_engine::AppliedEntries;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of a drain request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Creates applied to the remote store
    pub applied_creates: usize,
    /// Updates applied to the remote store
    pub applied_updates: usize,
    /// Deletes applied to the remote store
    pub applied_deletes: usize,
    /// Entries that failed and stay queued for the next attempt
    pub failed: usize,
    /// True when another drain was in flight and this request was skipped
    pub coalesced: bool,
}

impl DrainOutcome {
    /// Total entries applied across all kinds.
    pub fn applied(&self) -> usize {
        self.applied_creates + self.applied_updates + self.applied_deletes
    }
}

/// Replays queued offline mutations against the remote store.
pub struct SyncEngine {
    remote: Arc<dyn RemoteStore>,
    queue: Arc<DurableQueue>,
    /// At most one drain runs at a time; a request finding this held is
    /// coalesced instead of double-applying the same queue contents.
    drain_guard: Mutex<()>,
}

impl SyncEngine {
    pub fn new(remote: Arc<dyn RemoteStore>, queue: Arc<DurableQueue>) -> Self {
        Self {
            remote,
            queue,
            drain_guard: Mutex::new(()),
        }
    }

    /// Drain the queue.
    ///
    /// Every entry is attempted; a failing entry is logged and left queued,
    /// and never blocks the entries after it. Afterwards only the applied
    /// entries are dropped from the queue. An empty queue is a no-op with
    /// zero remote calls.
    pub async fn drain(&self) -> Result<DrainOutcome> {
        let _guard = match self.drain_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!("drain already in flight, coalescing");
                return Ok(DrainOutcome {
                    coalesced: true,
                    ..Default::default()
                });
            }
        };

        let batch = self.queue.list().await;
        if batch.is_empty() {
            return Ok(DrainOutcome::default());
        }

        let mut applied = AppliedEntries::default();
        let mut failed = 0usize;

        for create in &batch.creates {
            // Local-only fields stay behind; the remote store assigns the
            // real id and timestamps.
            match self.remote.create(&create.task.draft()).await {
                Ok(task) => {
                    tracing::debug!(
                        provisional_id = create.provisional_id(),
                        remote_id = task.id,
                        "replayed create"
                    );
                    applied.creates.push(create.provisional_id());
                }
                Err(e) => {
                    tracing::warn!(
                        provisional_id = create.provisional_id(),
                        "create replay failed: {e}"
                    );
                    failed += 1;
                }
            }
        }

        for update in &batch.updates {
            match self.remote.update(update.id, &update.patch).await {
                Ok(_) => applied.updates.push(update.id),
                Err(e) => {
                    tracing::warn!(id = update.id, "update replay failed: {e}");
                    failed += 1;
                }
            }
        }

        for delete in &batch.deletes {
            match self.remote.delete(delete.id).await {
                Ok(()) => applied.deletes.push(delete.id),
                Err(e) => {
                    tracing::warn!(id = delete.id, "delete replay failed: {e}");
                    failed += 1;
                }
            }
        }

        // A storage failure here is surfaced: losing track of what was
        // applied would replay it again on the next drain.
        if failed == 0 {
            self.queue.clear().await?;
        } else {
            self.queue.remove_applied(&applied).await?;
        }

        let outcome = DrainOutcome {
            applied_creates: applied.creates.len(),
            applied_updates: applied.updates.len(),
            applied_deletes: applied.deletes.len(),
            failed,
            coalesced: false,
        };
        tracing::info!(applied = outcome.applied(), failed, "drain finished");
        Ok(outcome)
    }
}

/// Watch connectivity and sync whenever the device comes back online.
///
/// Failures are logged, never propagated; the only user-visible signal of
/// a failed background sync is that offline data remains pending.
pub fn spawn_auto_sync(store: TaskStore) -> tokio::task::JoinHandle<()> {
    let mut rx = store.connectivity().subscribe();
    tokio::spawn(async move {
        let mut was_online = rx.borrow().is_online();
        while rx.changed().await.is_ok() {
            let online = rx.borrow().is_online();
            if online && !was_online {
                tracing::info!("connectivity restored, syncing offline data");
                if let Err(e) = store.sync_offline_data().await {
                    tracing::error!("offline sync failed: {e}");
                }
            }
            was_online = online;
        }
    })
}
