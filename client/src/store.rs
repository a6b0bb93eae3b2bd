//! The reconciling task store: the one entry point the UI layer talks to.
//!
//! The store keeps an in-memory copy of the last-known remote task list and
//! derives every visible list by overlaying the offline queue on it with
//! [`merge_view`]. Mutations go straight to the remote store while online
//! and into the queue while offline; the queue is the sole owner of
//! pending-operation state.

use crate::connectivity::ConnectivityMonitor;
use crate::error::Result;
use crate::queue::DurableQueue;
use crate::remote::RemoteStore;
use crate::sync::{DrainOutcome, SyncEngine};
use stash_engine::{
    filter_tasks, merge_view, sort_newest_first, ProvisionalIds, QueueEntry, QueueStats, Task,
    TaskDraft, TaskFilter, TaskId, TaskPatch, Timestamp,
};
use std::sync::Arc;
use tokio::sync::Mutex;

fn now_ms() -> Timestamp {
    chrono::Utc::now().timestamp_millis() as Timestamp
}

/// Reconciling in-memory cache over the remote store and the offline queue.
///
/// Built explicitly from its collaborators at startup and handed to the UI
/// layer; clones share the same underlying state. There is no process-wide
/// singleton; all mutation goes through these methods.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    remote: Arc<dyn RemoteStore>,
    queue: Arc<DurableQueue>,
    connectivity: ConnectivityMonitor,
    sync: SyncEngine,
    ids: Mutex<ProvisionalIds>,
    /// Last-known remote task list; visible lists are derived from it.
    cache: Mutex<Vec<Task>>,
}

impl TaskStore {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        queue: Arc<DurableQueue>,
        connectivity: ConnectivityMonitor,
    ) -> Self {
        let sync = SyncEngine::new(remote.clone(), queue.clone());
        Self {
            inner: Arc::new(StoreInner {
                remote,
                queue,
                connectivity,
                sync,
                ids: Mutex::new(ProvisionalIds::new()),
                cache: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The derived online flag.
    pub fn is_online(&self) -> bool {
        self.inner.connectivity.is_online()
    }

    /// The connectivity monitor this store watches.
    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.inner.connectivity
    }

    /// The visible task list.
    ///
    /// While online the remote list is refetched first (failures propagate);
    /// offline, the last-known remote list serves as the base. Either way the
    /// offline queue is overlaid, so unsynced local intent is always visible.
    pub async fn fetch_all(&self) -> Result<Vec<Task>> {
        let mut cache = self.inner.cache.lock().await;
        if self.is_online() {
            *cache = self.inner.remote.get_all().await?;
        }
        let queue = self.inner.queue.snapshot().await;
        Ok(merge_view(&cache, &queue))
    }

    /// The visible list filtered and ordered newest first.
    pub async fn fetch_filtered(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut tasks = filter_tasks(&self.fetch_all().await?, filter);
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    /// Create a task.
    ///
    /// Online: the remote store assigns the real id; failures propagate and
    /// nothing is queued. Offline: a provisional task is synthesized, queued,
    /// and returned immediately; this never blocks on the network.
    pub async fn create(&self, draft: TaskDraft) -> Result<Task> {
        if self.is_online() {
            let task = self.inner.remote.create(&draft).await?;
            self.inner.cache.lock().await.insert(0, task.clone());
            return Ok(task);
        }

        let now = now_ms();
        let id = self.inner.ids.lock().await.next(now);
        let task = Task::provisional(id, draft.title, draft.status, draft.responsible, now);
        self.inner
            .queue
            .append(QueueEntry::create(task.clone(), now))
            .await?;
        tracing::debug!(id, "queued offline create");
        Ok(task)
    }

    /// Partially update a task.
    ///
    /// Online: failures (including an unknown id) propagate and nothing is
    /// queued. Offline: the update is queued and shows up optimistically in
    /// the visible list if a local copy of the task is known.
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<()> {
        if self.is_online() {
            let updated = self.inner.remote.update(id, &patch).await?;
            let mut cache = self.inner.cache.lock().await;
            if let Some(slot) = cache.iter_mut().find(|t| t.id == id) {
                *slot = updated;
            }
            return Ok(());
        }

        self.inner
            .queue
            .append(QueueEntry::update(id, patch, now_ms()))
            .await?;
        tracing::debug!(id, "queued offline update");
        Ok(())
    }

    /// Delete a task.
    ///
    /// Online: failures propagate and nothing is queued. Offline: the delete
    /// is queued and the task disappears from the visible list immediately.
    pub async fn delete(&self, id: TaskId) -> Result<()> {
        if self.is_online() {
            self.inner.remote.delete(id).await?;
            self.inner.cache.lock().await.retain(|t| t.id != id);
            return Ok(());
        }

        self.inner
            .queue
            .append(QueueEntry::delete(id, now_ms()))
            .await?;
        tracing::debug!(id, "queued offline delete");
        Ok(())
    }

    /// Whether any offline mutation is still waiting to be synced.
    pub async fn has_offline_data(&self) -> bool {
        self.inner.queue.has_pending().await
    }

    /// Per-kind pending counts, for sync badges.
    pub async fn queue_stats(&self) -> QueueStats {
        self.inner.queue.stats().await
    }

    /// Drain the offline queue against the remote store, then refresh the
    /// cache. Per-entry replay failures stay queued and are only visible
    /// through [`has_offline_data`](Self::has_offline_data) remaining true.
    pub async fn sync_offline_data(&self) -> Result<DrainOutcome> {
        let outcome = self.inner.sync.drain().await?;
        self.fetch_all().await?;
        Ok(outcome)
    }
}
