//! The durable offline queue.
//!
//! Wraps the engine queue behind a single-writer mutex and persists every
//! mutation through the key-value collaborator as a [`QueueSnapshot`], so
//! pending entries survive process restart. Two concurrent appends cannot
//! interleave partial writes, and a clear cannot race an in-flight append.

use crate::error::Result;
use crate::storage::KeyValueStore;
use stash_engine::{
    AppliedEntries, OfflineQueue, QueueEntry, QueueSnapshot, QueueStats, QueuedCreate,
    QueuedDelete, QueuedUpdate,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage key the queue snapshot is persisted under.
pub const QUEUE_KEY: &str = "offline_queue";

/// Pending sequences cloned out for replay.
#[derive(Debug, Clone, Default)]
pub struct PendingBatch {
    pub creates: Vec<QueuedCreate>,
    pub updates: Vec<QueuedUpdate>,
    pub deletes: Vec<QueuedDelete>,
}

impl PendingBatch {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Durable offline queue with a single-writer discipline.
pub struct DurableQueue {
    store: Arc<dyn KeyValueStore>,
    inner: Mutex<OfflineQueue>,
}

impl DurableQueue {
    /// Load the persisted queue.
    ///
    /// A missing snapshot is an empty queue. An unreadable or corrupt one is
    /// dropped with a warning and the queue starts empty rather than
    /// blocking startup. This is the only place the system swallows a
    /// failure.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let queue = match store.get(QUEUE_KEY).await {
            Ok(None) => OfflineQueue::new(),
            Ok(Some(bytes)) => match std::str::from_utf8(&bytes)
                .map_err(|e| stash_engine::Error::InvalidSnapshot(e.to_string()))
                .and_then(QueueSnapshot::from_json)
            {
                Ok(snapshot) => {
                    tracing::debug!(entries = snapshot.entry_count(), "loaded offline queue");
                    snapshot.into_queue()
                }
                Err(e) => {
                    tracing::warn!("discarding unreadable offline queue: {e}");
                    OfflineQueue::new()
                }
            },
            Err(e) => {
                tracing::warn!("offline queue storage unreadable, starting empty: {e}");
                OfflineQueue::new()
            }
        };

        Self {
            store,
            inner: Mutex::new(queue),
        }
    }

    async fn persist(&self, queue: &OfflineQueue) -> Result<()> {
        if queue.is_empty() {
            return self.store.remove(QUEUE_KEY).await;
        }
        let json = QueueSnapshot::from_queue(queue).to_json()?;
        self.store.set(QUEUE_KEY, json.as_bytes()).await
    }

    /// Append an entry, applying the engine's supersession rules.
    ///
    /// If persisting fails, the in-memory change is rolled back and the
    /// error surfaced: the caller must not assume the mutation was durably
    /// queued.
    pub async fn append(&self, entry: QueueEntry) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let before = inner.clone();
        inner.append(entry);
        if let Err(e) = self.persist(&inner).await {
            *inner = before;
            return Err(e);
        }
        Ok(())
    }

    /// Clone out the three pending sequences for replay.
    pub async fn list(&self) -> PendingBatch {
        let inner = self.inner.lock().await;
        PendingBatch {
            creates: inner.creates().to_vec(),
            updates: inner.updates().to_vec(),
            deletes: inner.deletes().to_vec(),
        }
    }

    /// A point-in-time copy of the whole queue, for view merging.
    pub async fn snapshot(&self) -> OfflineQueue {
        self.inner.lock().await.clone()
    }

    /// Atomically empty all three sequences. Used only after a fully
    /// successful drain.
    pub async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let before = inner.clone();
        inner.clear();
        if let Err(e) = self.persist(&inner).await {
            *inner = before;
            return Err(e);
        }
        Ok(())
    }

    /// Drop exactly the entries a drain reported as applied, keeping failed
    /// ones for the next attempt.
    pub async fn remove_applied(&self, applied: &AppliedEntries) -> Result<()> {
        if applied.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.lock().await;
        let before = inner.clone();
        inner.remove_applied(applied);
        if let Err(e) = self.persist(&inner).await {
            *inner = before;
            return Err(e);
        }
        Ok(())
    }

    /// Whether any entry is pending.
    pub async fn has_pending(&self) -> bool {
        !self.inner.lock().await.is_empty()
    }

    /// Per-kind entry counts.
    pub async fn stats(&self) -> QueueStats {
        self.inner.lock().await.stats()
    }
}
