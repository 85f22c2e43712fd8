//! Tasks, task groups and task reports.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event emitted when a task's bucket and attachments are released.
pub const RELEASED: &str = "Released";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    Created,
    Pending,
    Postponed,
    Ready,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Created => "Created",
            TaskState::Pending => "Pending",
            TaskState::Postponed => "Postponed",
            TaskState::Ready => "Ready",
            TaskState::Running => "Running",
            TaskState::Succeeded => "Succeeded",
            TaskState::Failed => "Failed",
            TaskState::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(TaskState::Created),
            "Pending" => Ok(TaskState::Pending),
            "Postponed" => Ok(TaskState::Postponed),
            "Ready" => Ok(TaskState::Ready),
            "Running" => Ok(TaskState::Running),
            "Succeeded" => Ok(TaskState::Succeeded),
            "Failed" => Ok(TaskState::Failed),
            "Canceled" => Ok(TaskState::Canceled),
            other => Err(format!("unknown task state '{}'", other)),
        }
    }
}

/// Per-state time-to-live in minutes. Zero means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ttl {
    pub created: u64,
    pub pending: u64,
    pub running: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// A file attached to a task or report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub id: i64,
    pub name: String,
    pub activity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub kind: String,
    pub count: u32,
    #[serde(default)]
    pub reason: String,
    pub last: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub addon: String,
    pub state: TaskState,
    pub application_id: Option<i64>,
    pub task_group_id: Option<i64>,
    pub ttl: Ttl,
    pub create_time: DateTime<Utc>,
    pub started: Option<DateTime<Utc>>,
    pub terminated: Option<DateTime<Utc>>,
    pub pod: String,
    pub bucket_id: Option<i64>,
    pub attached: Vec<Attachment>,
    pub events: Vec<TaskEvent>,
}

impl Task {
    pub fn new(name: impl Into<String>, state: TaskState) -> Self {
        Self {
            id: 0,
            name: name.into(),
            addon: String::new(),
            state,
            application_id: None,
            task_group_id: None,
            ttl: Ttl::default(),
            create_time: Utc::now(),
            started: None,
            terminated: None,
            pod: String::new(),
            bucket_id: None,
            attached: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Records an event. A repeat of the most recent kind bumps its
    /// count instead of appending.
    pub fn event(&mut self, kind: &str, reason: impl Into<String>) {
        let now = Utc::now();
        if let Some(last) = self.events.last_mut() {
            if last.kind == kind {
                last.count += 1;
                last.last = now;
                last.reason = reason.into();
                return;
            }
        }
        self.events.push(TaskEvent {
            kind: kind.to_string(),
            count: 1,
            reason: reason.into(),
            last: now,
        });
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    #[default]
    Batch,
    Pipeline,
}

impl GroupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupMode::Batch => "batch",
            GroupMode::Pipeline => "pipeline",
        }
    }
}

impl FromStr for GroupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "batch" => Ok(GroupMode::Batch),
            "pipeline" => Ok(GroupMode::Pipeline),
            other => Err(format!("unknown group mode '{}'", other)),
        }
    }
}

/// A group of tasks submitted together. `state` is `None` until the
/// group is first saved with a state.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskGroup {
    pub id: i64,
    pub name: String,
    pub state: Option<TaskState>,
    pub mode: GroupMode,
    pub list: Vec<serde_json::Value>,
    pub bucket_id: Option<i64>,
    pub create_time: DateTime<Utc>,
}

impl TaskGroup {
    pub fn new(name: impl Into<String>, mode: GroupMode) -> Self {
        Self {
            id: 0,
            name: name.into(),
            state: Some(TaskState::Created),
            mode,
            list: Vec::new(),
            bucket_id: None,
            create_time: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskReport {
    pub id: i64,
    pub task_id: i64,
    pub status: String,
    pub total: u32,
    pub completed: u32,
    pub activity: Vec<String>,
    pub attached: Vec<Attachment>,
}
