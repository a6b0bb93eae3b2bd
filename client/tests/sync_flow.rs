//! End-to-end tests for the offline queue, task store, and sync engine,
//! driven through a scripted in-memory remote store.

use async_trait::async_trait;
use stash_client::{
    spawn_auto_sync, ConnectivityMonitor, DurableQueue, Error, MemoryKeyValueStore, NetState,
    RemoteStore, Task, TaskDraft, TaskFilter, TaskId, TaskPatch, TaskStatus, TaskStore, QUEUE_KEY,
};
use stash_client::error::Result;
use stash_client::KeyValueStore;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// In-memory stand-in for the remote task service, with failure injection
/// and a call log.
#[derive(Default)]
struct FakeRemote {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicI64,
    /// Titles whose create calls fail
    fail_creates_titled: Mutex<HashSet<String>>,
    /// When set, every call fails with a remote error
    fail_all: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        })
    }

    async fn seed(&self, title: &str) -> Task {
        self.insert(TaskDraft::new(title, TaskStatus::Pending, "Ana"))
            .await
    }

    async fn insert(&self, draft: TaskDraft) -> Task {
        let task = Task {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: draft.title,
            status: draft.status,
            responsible: draft.responsible,
            is_synced: false,
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
        };
        self.tasks.lock().await.push(task.clone());
        task
    }

    async fn inject_create_failure(&self, title: &str) {
        self.fail_creates_titled
            .lock()
            .await
            .insert(title.to_string());
    }

    async fn titles(&self) -> Vec<String> {
        self.tasks
            .lock()
            .await
            .iter()
            .map(|t| t.title.clone())
            .collect()
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    fn check_fail_all(&self) -> Result<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(Error::Remote("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn get_all(&self) -> Result<Vec<Task>> {
        self.calls.lock().await.push("get_all".into());
        self.check_fail_all()?;
        Ok(self.tasks.lock().await.clone())
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task> {
        self.calls.lock().await.push(format!("create:{}", draft.title));
        self.check_fail_all()?;
        if self.fail_creates_titled.lock().await.contains(&draft.title) {
            return Err(Error::Remote("injected create failure".into()));
        }
        Ok(self.insert(draft.clone()).await)
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        self.calls.lock().await.push(format!("update:{id}"));
        self.check_fail_all()?;
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::NotFound(id))?;
        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(responsible) = &patch.responsible {
            task.responsible = responsible.clone();
        }
        task.updated_at = 1_700_000_001_000;
        Ok(task.clone())
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        self.calls.lock().await.push(format!("delete:{id}"));
        self.check_fail_all()?;
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }
}

struct Harness {
    remote: Arc<FakeRemote>,
    storage: Arc<MemoryKeyValueStore>,
    monitor: ConnectivityMonitor,
    store: TaskStore,
}

async fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let remote = FakeRemote::new();
    let storage = Arc::new(MemoryKeyValueStore::new());
    let queue = Arc::new(DurableQueue::load(storage.clone() as Arc<dyn KeyValueStore>).await);
    let monitor = ConnectivityMonitor::new();
    let store = TaskStore::new(remote.clone(), queue, monitor.clone());
    Harness {
        remote,
        storage,
        monitor,
        store,
    }
}

fn milk_draft() -> TaskDraft {
    TaskDraft::new("Buy milk", TaskStatus::Pending, "Ana")
}

#[tokio::test]
async fn offline_create_then_drain_round_trip() {
    let h = harness().await;

    // Offline by default (connectivity unknown).
    let task = h.store.create(milk_draft()).await.unwrap();
    assert!(!task.is_synced);
    assert!(task.id >= 1_000_000_000_000, "provisional id expected");
    assert!(h.store.has_offline_data().await);

    // The unsynced task is already visible.
    let view = h.store.fetch_all().await.unwrap();
    assert_eq!(view.len(), 1);
    assert!(!view[0].is_synced);

    h.monitor.report(NetState::online());
    let outcome = h.store.sync_offline_data().await.unwrap();
    assert_eq!(outcome.applied_creates, 1);
    assert_eq!(outcome.failed, 0);
    assert!(!h.store.has_offline_data().await);

    let view = h.store.fetch_all().await.unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].title, "Buy milk");
    assert!(view[0].is_synced);
    assert!(view[0].id < 1_000_000_000_000, "remote id expected");
}

#[tokio::test]
async fn second_drain_on_empty_queue_makes_no_remote_calls() {
    let h = harness().await;

    h.store.create(milk_draft()).await.unwrap();
    h.monitor.report(NetState::online());
    h.store.sync_offline_data().await.unwrap();

    h.remote.clear_calls().await;
    let outcome = h.store.sync_offline_data().await.unwrap();
    assert_eq!(outcome.applied(), 0);
    // Only the cache refresh touched the remote store.
    assert_eq!(h.remote.calls().await, vec!["get_all".to_string()]);
}

#[tokio::test]
async fn later_offline_update_supersedes_earlier_one() {
    let h = harness().await;
    h.remote.seed("Original").await; // id 1

    h.store
        .update(1, TaskPatch::default().with_title("A"))
        .await
        .unwrap();
    h.store
        .update(1, TaskPatch::default().with_title("B"))
        .await
        .unwrap();
    assert_eq!(h.store.queue_stats().await.updates, 1);

    h.monitor.report(NetState::online());
    h.store.sync_offline_data().await.unwrap();

    let update_calls = h
        .remote
        .calls()
        .await
        .iter()
        .filter(|c| c.starts_with("update:"))
        .count();
    assert_eq!(update_calls, 1);
    assert_eq!(h.remote.titles().await, vec!["B".to_string()]);
}

#[tokio::test]
async fn offline_create_then_delete_never_reaches_remote() {
    let h = harness().await;

    let task = h.store.create(milk_draft()).await.unwrap();
    h.store.delete(task.id).await.unwrap();
    assert!(!h.store.has_offline_data().await);

    h.monitor.report(NetState::online());
    h.remote.clear_calls().await;
    let outcome = h.store.sync_offline_data().await.unwrap();
    assert_eq!(outcome.applied(), 0);
    assert!(!h
        .remote
        .calls()
        .await
        .iter()
        .any(|c| c.starts_with("create:")));
}

#[tokio::test]
async fn failing_entry_does_not_block_the_rest() {
    let h = harness().await;

    h.store
        .create(TaskDraft::new("A", TaskStatus::Pending, "Ana"))
        .await
        .unwrap();
    h.store
        .create(TaskDraft::new("B", TaskStatus::Pending, "Ana"))
        .await
        .unwrap();
    h.store
        .create(TaskDraft::new("C", TaskStatus::Pending, "Ana"))
        .await
        .unwrap();

    h.remote.inject_create_failure("B").await;
    h.monitor.report(NetState::online());

    let outcome = h.store.sync_offline_data().await.unwrap();
    assert_eq!(outcome.applied_creates, 2);
    assert_eq!(outcome.failed, 1);
    assert!(h.store.has_offline_data().await);
    assert_eq!(h.remote.titles().await, vec!["A".to_string(), "C".to_string()]);

    // The failed entry is retried on the next drain once the fault clears.
    h.remote.fail_creates_titled.lock().await.clear();
    let outcome = h.store.sync_offline_data().await.unwrap();
    assert_eq!(outcome.applied_creates, 1);
    assert!(!h.store.has_offline_data().await);
    assert_eq!(
        h.remote.titles().await,
        vec!["A".to_string(), "C".to_string(), "B".to_string()]
    );
}

#[tokio::test]
async fn online_delete_of_missing_task_propagates_untouched() {
    let h = harness().await;
    h.monitor.report(NetState::online());

    let err = h.store.delete(7).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(7)));
    // No queued delete was created as a fallback.
    assert!(!h.store.has_offline_data().await);
}

#[tokio::test]
async fn online_failure_is_not_rerouted_to_the_queue() {
    let h = harness().await;
    h.monitor.report(NetState::online());
    h.remote.fail_all.store(true, Ordering::SeqCst);

    let err = h.store.create(milk_draft()).await.unwrap_err();
    assert!(matches!(err, Error::Remote(_)));
    assert!(!h.store.has_offline_data().await);
}

#[tokio::test]
async fn offline_sequence_converges_to_online_equivalent() {
    let h = harness().await;
    h.remote.seed("Keep").await; // id 1
    h.remote.seed("Rename").await; // id 2
    h.remote.seed("Drop").await; // id 3

    // Warm the cache while online, then go offline and mutate.
    h.monitor.report(NetState::online());
    h.store.fetch_all().await.unwrap();
    h.monitor.report(NetState::offline());

    h.store.create(milk_draft()).await.unwrap();
    h.store
        .update(2, TaskPatch::default().with_title("Renamed"))
        .await
        .unwrap();
    h.store.delete(3).await.unwrap();

    // The offline view already reflects all three mutations.
    let view = h.store.fetch_all().await.unwrap();
    let titles: Vec<_> = view.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Keep", "Renamed", "Buy milk"]);

    h.monitor.report(NetState::online());
    let outcome = h.store.sync_offline_data().await.unwrap();
    assert_eq!(outcome.applied(), 3);
    assert!(!h.store.has_offline_data().await);

    let view = h.store.fetch_all().await.unwrap();
    let titles: Vec<_> = view.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Keep", "Renamed", "Buy milk"]);
    assert!(view.iter().all(|t| t.is_synced));
}

#[tokio::test]
async fn update_to_unsynced_provisional_id_stays_pending_after_drain() {
    // Queued update targets are not rewritten when their create is assigned
    // a remote id; such entries keep failing replay and stay queued.
    let h = harness().await;

    let task = h.store.create(milk_draft()).await.unwrap();
    h.store
        .update(task.id, TaskPatch::default().with_status(TaskStatus::Completed))
        .await
        .unwrap();

    h.monitor.report(NetState::online());
    let outcome = h.store.sync_offline_data().await.unwrap();
    assert_eq!(outcome.applied_creates, 1);
    assert_eq!(outcome.failed, 1);
    assert!(h.store.has_offline_data().await);
    assert_eq!(h.store.queue_stats().await.updates, 1);
}

#[tokio::test]
async fn offline_view_degrades_to_cached_remote_list() {
    let h = harness().await;
    h.remote.seed("Remote task").await;

    h.monitor.report(NetState::online());
    h.store.fetch_all().await.unwrap();

    h.monitor.report(NetState::offline());
    h.remote.clear_calls().await;
    let view = h.store.fetch_all().await.unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].title, "Remote task");
    // No remote call was attempted while offline.
    assert!(h.remote.calls().await.is_empty());
}

#[tokio::test]
async fn filtered_view_is_sorted_newest_first() {
    let h = harness().await;
    h.remote.seed("Old").await; // id 1
    h.remote.seed("Newer").await; // id 2
    h.monitor.report(NetState::online());

    let view = h
        .store
        .fetch_filtered(&TaskFilter::default())
        .await
        .unwrap();
    let ids: Vec<_> = view.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let only_ana = h
        .store
        .fetch_filtered(&TaskFilter {
            responsible: Some("ana".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(only_ana.len(), 2);
}

#[tokio::test]
async fn queue_survives_restart_and_drains_after() {
    let h = harness().await;
    h.store.create(milk_draft()).await.unwrap();

    // Simulate a restart: rebuild the stack on the same storage.
    let queue = Arc::new(DurableQueue::load(h.storage.clone() as Arc<dyn KeyValueStore>).await);
    let monitor = ConnectivityMonitor::new();
    let store = TaskStore::new(h.remote.clone(), queue, monitor.clone());
    assert!(store.has_offline_data().await);

    monitor.report(NetState::online());
    store.sync_offline_data().await.unwrap();
    assert!(!store.has_offline_data().await);
    assert_eq!(h.remote.titles().await, vec!["Buy milk".to_string()]);
}

#[tokio::test]
async fn corrupt_queue_snapshot_starts_empty() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    storage.set(QUEUE_KEY, b"}}garbage{{").await.unwrap();

    let queue = Arc::new(DurableQueue::load(storage as Arc<dyn KeyValueStore>).await);
    let store = TaskStore::new(FakeRemote::new(), queue, ConnectivityMonitor::new());
    assert!(!store.has_offline_data().await);
}

#[tokio::test]
async fn auto_sync_drains_on_reconnect() {
    let h = harness().await;
    let handle = spawn_auto_sync(h.store.clone());

    h.store.create(milk_draft()).await.unwrap();
    assert!(h.store.has_offline_data().await);

    h.monitor.report(NetState::online());

    let mut drained = false;
    for _ in 0..100 {
        if !h.store.has_offline_data().await {
            drained = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(drained, "auto-sync did not drain the queue");
    assert_eq!(h.remote.titles().await, vec!["Buy milk".to_string()]);

    handle.abort();
}
