//! The remote store collaborator and its HTTP implementation.
//!
//! The remote store is the authoritative backing service for tasks,
//! reachable only while online. The trait keeps the transport opaque to the
//! rest of the client; the bundled implementation speaks the task service's
//! REST surface (a `/tasks` resource).

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use stash_engine::{Task, TaskDraft, TaskId, TaskPatch};
use std::time::Duration;

/// The authoritative task service.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch every task.
    async fn get_all(&self) -> Result<Vec<Task>>;

    /// Create a task; the service assigns the id and timestamps.
    async fn create(&self, draft: &TaskDraft) -> Result<Task>;

    /// Partially update a task. Fails with [`Error::NotFound`] for an
    /// unknown id.
    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task>;

    /// Delete a task. Fails with [`Error::NotFound`] for an unknown id.
    async fn delete(&self, id: TaskId) -> Result<()>;
}

/// REST implementation over the task service.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteStore {
    /// Build a client against the configured base URL and timeout.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.api_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check(response: reqwest::Response, id: Option<TaskId>) -> Result<reqwest::Response> {
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(Error::NotFound(id));
            }
        }
        response.error_for_status().map_err(Error::from)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get_all(&self) -> Result<Vec<Task>> {
        let response = self.client.get(self.url("/tasks")).send().await?;
        Ok(Self::check(response, None)?.json().await?)
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task> {
        let response = self
            .client
            .post(self.url("/tasks"))
            .json(draft)
            .send()
            .await?;
        Ok(Self::check(response, None)?.json().await?)
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        let response = self
            .client
            .put(self.url(&format!("/tasks/{id}")))
            .json(patch)
            .send()
            .await?;
        Ok(Self::check(response, Some(id))?.json().await?)
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/tasks/{id}")))
            .send()
            .await?;
        Self::check(response, Some(id))?;
        Ok(())
    }
}
