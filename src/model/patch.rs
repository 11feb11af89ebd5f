// src/model/patch.rs

//! Partial run/task records carried as event payloads.
//!
//! Every field is optional: a field that is absent (or empty, or null) in the
//! payload leaves the stored value untouched when merged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::run::{JobRun, TaskRun, optional_tasks};
use super::status::Status;
use super::{empty_as_none, id_as_none, optional_command_list};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, deserialize_with = "id_as_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "id_as_none")]
    pub job_run_id: Option<String>,
    #[serde(default, deserialize_with = "id_as_none")]
    pub task_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub atom_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub engine: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "optional_command_list")]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<Status>,
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

impl TaskPatch {
    /// Decode a payload, treating anything that is not an object as empty.
    pub fn from_payload(payload: Option<&serde_json::Value>) -> Option<Self> {
        let value = payload.filter(|v| v.is_object())?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Overwrite every field of `task` the patch specifies, except status.
    ///
    /// Status is decided by the caller since it depends on the event type and
    /// on the lifecycle of the stored record.
    pub fn merge_fields_into(&self, task: &mut TaskRun) {
        // The persisted task-run id and the task id coincide on the wire;
        // identity stays with the stored record.
        if let Some(v) = &self.atom_id {
            task.atom_id = v.clone();
        }
        if let Some(v) = &self.engine {
            task.engine = v.clone();
        }
        if let Some(v) = &self.image {
            task.image = v.clone();
        }
        if let Some(v) = &self.command {
            task.command = v.clone();
        }
        if let Some(v) = &self.result {
            task.result = Some(v.clone());
        }
        if let Some(v) = &self.error {
            task.error = Some(v.clone());
        }
        if let Some(v) = &self.runtime_id {
            task.runtime_id = Some(v.clone());
        }
        if let Some(v) = &self.claimed_by {
            task.claimed_by = Some(v.clone());
        }
        if let Some(v) = self.started_at {
            task.started_at = Some(v);
        }
        if let Some(v) = self.completed_at {
            task.completed_at = Some(v);
        }
        if let Some(v) = self.created_at {
            task.created_at = Some(v);
        }
        if let Some(v) = self.updated_at {
            task.updated_at = Some(v);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunPatch {
    #[serde(default, deserialize_with = "id_as_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "id_as_none")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
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
    #[serde(default, deserialize_with = "optional_tasks")]
    pub tasks: Option<Vec<TaskRun>>,
}

impl RunPatch {
    pub fn from_payload(payload: Option<&serde_json::Value>) -> Option<Self> {
        let value = payload.filter(|v| v.is_object())?;
        serde_json::from_value(value.clone()).ok()
    }

    /// A complete run record, if the patch carries one.
    ///
    /// Complete means: identity, job, status and the task list are all
    /// present. Anything less is treated as a partial update.
    pub fn into_full(self) -> Option<JobRun> {
        let RunPatch {
            id: Some(id),
            job_id: Some(job_id),
            status: Some(status),
            tasks: Some(tasks),
            error,
            created_at,
            started_at,
            completed_at,
            updated_at,
        } = self
        else {
            return None;
        };

        Some(JobRun {
            id,
            job_id,
            status,
            error,
            created_at,
            started_at,
            completed_at,
            updated_at,
            tasks,
        })
    }
}
