//! View reconciliation: overlaying pending mutations on the remote task list.
//!
//! # Algorithm
//!
//! 1. Collect pending deletes as an id set, pending updates keyed by id
//! 2. Walk the remote tasks in order: drop deleted ones, patch updated ones
//!    (marking them unsynced), mark the rest synced
//! 3. Append pending creates in insertion order, patched the same way
//!
//! The output is one deterministic sequence; no task id appears twice as
//! long as remote ids are unique and disjoint from provisional ids.

use crate::queue::OfflineQueue;
use crate::task::{Task, TaskPatch};
use crate::{TaskId, Timestamp};
use std::collections::{HashMap, HashSet};

/// Merge the remote task list with the queue's pending mutations.
pub fn merge_view(remote: &[Task], queue: &OfflineQueue) -> Vec<Task> {
    let deleted: HashSet<TaskId> = queue.deletes().iter().map(|d| d.id).collect();
    let patches: HashMap<TaskId, (&TaskPatch, Timestamp)> = queue
        .updates()
        .iter()
        .map(|u| (u.id, (&u.patch, u.queued_at)))
        .collect();

    let mut merged = Vec::with_capacity(remote.len() + queue.creates().len());

    for task in remote {
        if deleted.contains(&task.id) {
            continue;
        }
        let mut task = task.clone();
        match patches.get(&task.id) {
            Some((patch, at)) => task.apply_patch(patch, *at),
            None => task.is_synced = true,
        }
        merged.push(task);
    }

    for create in queue.creates() {
        // append-time cancellation already removed deleted creates; tolerate
        // a hand-built queue anyway
        if deleted.contains(&create.provisional_id()) {
            continue;
        }
        let mut task = create.task.clone();
        task.is_synced = false;
        if let Some((patch, at)) = patches.get(&task.id) {
            task.apply_patch(patch, *at);
        }
        merged.push(task);
    }

    merged
}
