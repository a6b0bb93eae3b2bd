//! The offline queue: pending mutations awaiting replay.
//!
//! Entries live in three insertion-ordered sequences (creates, updates,
//! deletes); replay walks them in that kind order. `append` enforces the
//! supersession rules before anything is persisted:
//!
//! - one create per provisional id (a re-append replaces it in place)
//! - one update per task id (the latest payload wins, position preserved)
//! - a delete removes any queued update for the id; if it cancels a queued
//!   create, the delete itself is discarded too, since the task never
//!   reached the remote store

use crate::task::{Task, TaskPatch};
use crate::{TaskId, Timestamp};
use serde::{Deserialize, Serialize};

/// A create queued while disconnected. The provisional task is the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedCreate {
    /// The synthesized provisional task, local-only fields included.
    pub task: Task,
    /// When the create was queued (milliseconds since epoch)
    pub queued_at: Timestamp,
}

impl QueuedCreate {
    /// The provisional id this create will be known by until synced.
    pub fn provisional_id(&self) -> TaskId {
        self.task.id
    }
}

/// An update queued while disconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedUpdate {
    /// Target task id (remote-assigned or provisional)
    pub id: TaskId,
    /// The partial update to replay
    pub patch: TaskPatch,
    /// When the update was queued (milliseconds since epoch)
    pub queued_at: Timestamp,
}

/// A delete queued while disconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedDelete {
    /// Target task id
    pub id: TaskId,
    /// When the delete was queued (milliseconds since epoch)
    pub queued_at: Timestamp,
}

/// A pending mutation, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueueEntry {
    Create(QueuedCreate),
    Update(QueuedUpdate),
    Delete(QueuedDelete),
}

impl QueueEntry {
    /// Queue a create of the given provisional task.
    pub fn create(task: Task, queued_at: Timestamp) -> Self {
        QueueEntry::Create(QueuedCreate { task, queued_at })
    }

    /// Queue a partial update of the given task.
    pub fn update(id: TaskId, patch: TaskPatch, queued_at: Timestamp) -> Self {
        QueueEntry::Update(QueuedUpdate {
            id,
            patch,
            queued_at,
        })
    }

    /// Queue a delete of the given task.
    pub fn delete(id: TaskId, queued_at: Timestamp) -> Self {
        QueueEntry::Delete(QueuedDelete { id, queued_at })
    }

    /// The task id this entry targets (the provisional id for creates).
    pub fn task_id(&self) -> TaskId {
        match self {
            QueueEntry::Create(c) => c.provisional_id(),
            QueueEntry::Update(u) => u.id,
            QueueEntry::Delete(d) => d.id,
        }
    }

    /// When this entry was queued.
    pub fn queued_at(&self) -> Timestamp {
        match self {
            QueueEntry::Create(c) => c.queued_at,
            QueueEntry::Update(u) => u.queued_at,
            QueueEntry::Delete(d) => d.queued_at,
        }
    }
}

/// Per-kind entry counts, for sync badges and drain logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl QueueStats {
    /// Total entries across all kinds.
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    /// Whether there is nothing pending.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Entry ids a drain successfully replayed, per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedEntries {
    pub creates: Vec<TaskId>,
    pub updates: Vec<TaskId>,
    pub deletes: Vec<TaskId>,
}

impl AppliedEntries {
    /// Whether nothing was applied.
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// Total applied entries across all kinds.
    pub fn total(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }
}

/// Insertion-ordered pending mutations, one sequence per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineQueue {
    creates: Vec<QueuedCreate>,
    updates: Vec<QueuedUpdate>,
    deletes: Vec<QueuedDelete>,
}

impl OfflineQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        creates: Vec<QueuedCreate>,
        updates: Vec<QueuedUpdate>,
        deletes: Vec<QueuedDelete>,
    ) -> Self {
        Self {
            creates,
            updates,
            deletes,
        }
    }

    /// Append an entry, applying the supersession rules.
    pub fn append(&mut self, entry: QueueEntry) {
        match entry {
            QueueEntry::Create(create) => self.push_create(create),
            QueueEntry::Update(update) => self.push_update(update),
            QueueEntry::Delete(delete) => self.push_delete(delete),
        }
    }

    fn push_create(&mut self, create: QueuedCreate) {
        match self
            .creates
            .iter_mut()
            .find(|c| c.provisional_id() == create.provisional_id())
        {
            Some(existing) => *existing = create,
            None => self.creates.push(create),
        }
    }

    fn push_update(&mut self, update: QueuedUpdate) {
        match self.updates.iter_mut().find(|u| u.id == update.id) {
            Some(existing) => *existing = update,
            None => self.updates.push(update),
        }
    }

    fn push_delete(&mut self, delete: QueuedDelete) {
        self.updates.retain(|u| u.id != delete.id);

        let had_create = self.creates.iter().any(|c| c.provisional_id() == delete.id);
        self.creates.retain(|c| c.provisional_id() != delete.id);
        if had_create {
            // The task never reached the remote store; nothing to delete there.
            return;
        }

        match self.deletes.iter_mut().find(|d| d.id == delete.id) {
            Some(existing) => *existing = delete,
            None => self.deletes.push(delete),
        }
    }

    /// Queued creates in insertion order.
    pub fn creates(&self) -> &[QueuedCreate] {
        &self.creates
    }

    /// Queued updates in insertion order.
    pub fn updates(&self) -> &[QueuedUpdate] {
        &self.updates
    }

    /// Queued deletes in insertion order.
    pub fn deletes(&self) -> &[QueuedDelete] {
        &self.deletes
    }

    /// Whether there is nothing pending.
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// Per-kind entry counts.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            creates: self.creates.len(),
            updates: self.updates.len(),
            deletes: self.deletes.len(),
        }
    }

    /// Whether any kind of entry targets the given id.
    pub fn has_entry_for(&self, id: TaskId) -> bool {
        self.creates.iter().any(|c| c.provisional_id() == id)
            || self.updates.iter().any(|u| u.id == id)
            || self.deletes.iter().any(|d| d.id == id)
    }

    /// Empty all three sequences.
    pub fn clear(&mut self) {
        self.creates.clear();
        self.updates.clear();
        self.deletes.clear();
    }

    /// Drop exactly the entries a drain reported as applied.
    pub fn remove_applied(&mut self, applied: &AppliedEntries) {
        self.creates
            .retain(|c| !applied.creates.contains(&c.provisional_id()));
        self.updates.retain(|u| !applied.updates.contains(&u.id));
        self.deletes.retain(|d| !applied.deletes.contains(&d.id));
    }
}
