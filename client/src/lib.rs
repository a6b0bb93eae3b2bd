//! # Stash Client
//!
//! The async half of Stash: an offline-first task store for mobile-style
//! clients. Reads and writes go through a reconciling [`TaskStore`] that
//! serves the remote store's state while online and queued local intent
//! while offline; a [`SyncEngine`] replays the durable offline queue once
//! connectivity returns.
//!
//! The deterministic pieces (task model, queue supersession, view merging)
//! live in [`stash_engine`]; this crate wires them to the real world:
//! network, storage, clock, and connectivity signals.
//!
//! ## Wiring
//!
//! ```rust,no_run
//! use stash_client::{bootstrap, spawn_auto_sync, Config, NetState, TaskDraft, TaskStatus};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let store = bootstrap(&config).await?;
//!
//! // The platform integration feeds reachability snapshots to the monitor;
//! // a background task drains the queue on every offline-to-online edge.
//! spawn_auto_sync(store.clone());
//! store.connectivity().report(NetState::online());
//!
//! let task = store
//!     .create(TaskDraft::new("Buy milk", TaskStatus::Pending, "Ana"))
//!     .await?;
//! println!("created task {}", task.id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connectivity;
pub mod error;
pub mod queue;
pub mod remote;
pub mod storage;
pub mod store;
pub mod sync;

// Re-export main types at crate root
pub use config::{Config, ConfigError};
pub use connectivity::{ConnectivityMonitor, NetState};
pub use error::Error;
pub use queue::{DurableQueue, PendingBatch, QUEUE_KEY};
pub use remote::{HttpRemoteStore, RemoteStore};
pub use storage::{FsKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use store::TaskStore;
pub use sync::{spawn_auto_sync, DrainOutcome, SyncEngine};

// Re-export the engine types that appear in this crate's API
pub use stash_engine::{
    Task, TaskDraft, TaskFilter, TaskId, TaskPatch, TaskStatus, Timestamp,
};

use std::sync::Arc;

/// Wire the default production stack from configuration: HTTP remote store,
/// file-backed queue storage, and a fresh connectivity monitor.
pub async fn bootstrap(config: &Config) -> error::Result<TaskStore> {
    let remote: Arc<dyn RemoteStore> = Arc::new(HttpRemoteStore::new(config)?);
    let storage: Arc<dyn KeyValueStore> = Arc::new(FsKeyValueStore::new(&config.data_dir));
    let queue = Arc::new(DurableQueue::load(storage).await);
    Ok(TaskStore::new(remote, queue, ConnectivityMonitor::new()))
}
