//! Snapshot format for persisting the offline queue.
//!
//! The snapshot is the bridge between the in-memory queue and whatever
//! key-value storage the client runs on. It carries a format version so a
//! newer snapshot is rejected instead of silently misread.

use crate::error::{Error, Result};
use crate::queue::{OfflineQueue, QueuedCreate, QueuedDelete, QueuedUpdate};
use serde::{Deserialize, Serialize};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time snapshot of the offline queue.
///
/// Sequences preserve insertion order, so serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    /// Queued creates in insertion order
    pub creates: Vec<QueuedCreate>,
    /// Queued updates in insertion order
    pub updates: Vec<QueuedUpdate>,
    /// Queued deletes in insertion order
    pub deletes: Vec<QueuedDelete>,
}

impl QueueSnapshot {
    /// Create an empty snapshot at the current format version.
    pub fn new() -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            creates: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
        }
    }

    /// Snapshot the given queue.
    pub fn from_queue(queue: &OfflineQueue) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            creates: queue.creates().to_vec(),
            updates: queue.updates().to_vec(),
            deletes: queue.deletes().to_vec(),
        }
    }

    /// Rebuild a queue from this snapshot.
    pub fn into_queue(self) -> OfflineQueue {
        OfflineQueue::from_parts(self.creates, self.updates, self.deletes)
    }

    /// Total entries across all kinds.
    pub fn entry_count(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON, rejecting snapshots from a future format.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported snapshot format version: {} (max supported: {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        Ok(snapshot)
    }
}

impl Default for QueueSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
