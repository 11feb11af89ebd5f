// src/model/run.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::Status;
use super::{command_list, empty_as_none, nullable_string};

/// One execution of a job's DAG.
///
/// The task list keeps the order the server returned it in; merges only ever
/// append to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRun {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub job_id: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable_tasks")]
    pub tasks: Vec<TaskRun>,
}

impl JobRun {
    pub fn task(&self, task_id: &str) -> Option<&TaskRun> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn task_position(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.task_id == task_id)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One task's execution record inside a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRun {
    #[serde(default, deserialize_with = "nullable_string")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub job_run_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub task_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub atom_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub engine: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub image: String,
    #[serde(default, deserialize_with = "command_list")]
    pub command: Vec<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub result: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub runtime_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub claimed_by: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskRun {
    /// Minimal record for a task seen on the feed before any snapshot had it.
    pub fn placeholder(job_run_id: &str, task_id: &str, status: Status, now: DateTime<Utc>) -> Self {
        Self {
            id: task_id.to_string(),
            job_run_id: job_run_id.to_string(),
            task_id: task_id.to_string(),
            atom_id: String::new(),
            engine: String::new(),
            image: String::new(),
            command: Vec::new(),
            status,
            result: None,
            error: None,
            runtime_id: None,
            claimed_by: None,
            started_at: None,
            completed_at: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

fn nullable_tasks<'de, D>(deserializer: D) -> Result<Vec<TaskRun>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(optional_tasks(deserializer)?.unwrap_or_default())
}

pub(crate) fn optional_tasks<'de, D>(deserializer: D) -> Result<Option<Vec<TaskRun>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut tasks = Option::<Vec<TaskRun>>::deserialize(deserializer)?;
    // Older payloads only carry `id`, which then doubles as the task id.
    for task in tasks.iter_mut().flatten() {
        if task.task_id.is_empty() || task.task_id == super::NIL_ID {
            task.task_id = task.id.clone();
        }
    }
    Ok(tasks)
}
