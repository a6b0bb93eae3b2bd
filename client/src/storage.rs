//! Persistence collaborators: async key-value stores.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Key-value persistence the durable queue runs on.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a key, creating it if absent.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove a key; removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// File-per-key store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsKeyValueStore {
    root: PathBuf,
}

impl FsKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FsKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.lock().await.insert(key.into(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
