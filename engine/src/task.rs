//! Task data model shared by the queue, the view merge, and the client.

use crate::error::{Error, Result};
use crate::{TaskId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Completion state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    /// Check whether this status means the task is done.
    pub fn is_completed(self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// A task as held in the cache and exchanged with the remote store.
///
/// `is_synced` is false exactly while a queued offline mutation for this
/// task has not yet been applied to the remote store. Timestamps are
/// milliseconds since epoch, set locally when a mutation is queued and
/// refreshed by the remote store once applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task identifier. Remote-assigned, or provisional for offline creates.
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub responsible: String,
    /// Whether the current state has reached the remote store.
    #[serde(default)]
    pub is_synced: bool,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Task {
    /// Synthesize a task for an offline create.
    pub fn provisional(
        id: TaskId,
        title: impl Into<String>,
        status: TaskStatus,
        responsible: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            status,
            responsible: responsible.into(),
            is_synced: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The caller-supplied fields, with everything local-only stripped.
    /// This is the exact payload a replayed create sends to the remote store.
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            status: self.status,
            responsible: self.responsible.clone(),
        }
    }

    /// Apply a partial update in place, marking the task unsynced.
    pub fn apply_patch(&mut self, patch: &TaskPatch, at: Timestamp) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(responsible) = &patch.responsible {
            self.responsible = responsible.clone();
        }
        self.is_synced = false;
        self.updated_at = at;
    }
}

/// The fields a caller submits to create a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub status: TaskStatus,
    pub responsible: String,
}

impl TaskDraft {
    pub fn new(
        title: impl Into<String>,
        status: TaskStatus,
        responsible: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            status,
            responsible: responsible.into(),
        }
    }
}

/// A partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,
}

impl TaskPatch {
    /// A patch that touches nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none() && self.responsible.is_none()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_responsible(mut self, responsible: impl Into<String>) -> Self {
        self.responsible = Some(responsible.into());
        self
    }
}

/// Filter over a task list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    /// Keep only tasks with this status.
    pub status: Option<TaskStatus>,
    /// Keep only tasks whose responsible contains this, case-insensitively.
    pub responsible: Option<String>,
}

/// Filter tasks by status and/or responsible.
pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| match filter.status {
            Some(status) => task.status == status,
            None => true,
        })
        .filter(|task| match &filter.responsible {
            Some(responsible) => task
                .responsible
                .to_lowercase()
                .contains(&responsible.to_lowercase()),
            None => true,
        })
        .cloned()
        .collect()
}

/// Order tasks newest first (descending id; provisional ids sort above
/// remote-assigned ones, so unsynced tasks surface at the top).
pub fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.id.cmp(&a.id));
}
