//! # Stash Engine
//!
//! The deterministic core of Stash, an offline-first task client.
//!
//! This crate holds everything about offline task mutations that can be
//! expressed as pure logic: the task data model, the queue of pending
//! mutations with its supersession rules, the snapshot format the queue is
//! persisted in, provisional id allocation, and the reconciliation that
//! merges pending mutations over the remote task list for display.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network, or platform
//! - **No clock**: timestamps are always supplied by the caller
//! - **Deterministic**: same inputs always produce the same outputs
//! - **Testable**: pure logic, no mocks needed
//!
//! ## Core Concepts
//!
//! ### Tasks
//!
//! A [`Task`] carries an integer id, the user-visible fields (`title`,
//! `status`, `responsible`), a sync flag, and local timestamps. Tasks created
//! while disconnected get a provisional id from [`ProvisionalIds`]: a
//! millisecond-scale integer, monotonically increasing and never reused.
//!
//! ### The offline queue
//!
//! Mutations made while disconnected are queued as [`QueueEntry`] values in
//! an [`OfflineQueue`]: three insertion-ordered sequences (creates, updates,
//! deletes). Appending enforces the supersession rules: one create per
//! provisional id, one update per task id with the latest payload winning,
//! and a delete cancelling anything queued for the same id.
//!
//! ### View reconciliation
//!
//! [`merge_view`] overlays the queue on the remote task list: pending
//! deletes filter tasks out, pending updates are applied over their targets,
//! pending creates are appended. The result is one deterministic sequence
//! that reflects unsynced local intent.
//!
//! ## Quick Start
//!
//! ```rust
//! use stash_engine::{
//!     merge_view, OfflineQueue, ProvisionalIds, QueueEntry, Task, TaskStatus,
//! };
//!
//! let now = 1_706_745_600_000;
//!
//! // A task created while disconnected gets a provisional id.
//! let mut ids = ProvisionalIds::new();
//! let task = Task::provisional(ids.next(now), "Buy milk", TaskStatus::Pending, "Ana", now);
//!
//! let mut queue = OfflineQueue::new();
//! queue.append(QueueEntry::create(task, now));
//! assert_eq!(queue.stats().creates, 1);
//!
//! // Merging the queue over the (empty) remote view shows the unsynced task.
//! let view = merge_view(&[], &queue);
//! assert_eq!(view.len(), 1);
//! assert!(!view[0].is_synced);
//! ```
//!
//! ## Persistence
//!
//! Use [`QueueSnapshot`] to serialize the queue to JSON and restore it on
//! startup. Snapshots include a format version and are rejected when
//! produced by a newer format.

pub mod error;
pub mod ident;
pub mod queue;
pub mod reconcile;
pub mod snapshot;
pub mod task;

// Re-export main types at crate root
pub use error::Error;
pub use ident::ProvisionalIds;
pub use queue::{
    AppliedEntries, OfflineQueue, QueueEntry, QueueStats, QueuedCreate, QueuedDelete, QueuedUpdate,
};
pub use reconcile::merge_view;
pub use snapshot::{QueueSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use task::{filter_tasks, sort_newest_first, Task, TaskDraft, TaskFilter, TaskPatch, TaskStatus};

/// Type aliases for clarity
pub type TaskId = i64;
pub type Timestamp = u64;
