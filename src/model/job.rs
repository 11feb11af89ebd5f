// src/model/job.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::run::JobRun;
use super::{command_list, empty_as_none, id_as_none, nullable_string};

/// A job as listed by `GET /jobs` and `GET /jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub alias: String,
    #[serde(default, deserialize_with = "id_as_none")]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub annotations: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latest_run: Option<JobRun>,
}

/// Persisted task definition; tasks form a singly-linked chain via `next_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTask {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub job_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub atom_id: String,
    #[serde(default, deserialize_with = "id_as_none")]
    pub next_id: Option<String>,
}

/// Immutable unit-of-work definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub engine: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub image: String,
    #[serde(default, deserialize_with = "command_list")]
    pub command: Vec<String>,
    #[serde(default)]
    pub spec: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub alias: String,
    #[serde(rename = "type", default, deserialize_with = "nullable_string")]
    pub trigger_type: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub configuration: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub recent_runs: u64,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub avg_duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailingJob {
    pub job_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub alias: String,
    #[serde(default)]
    pub failure_count: u64,
    #[serde(default)]
    pub last_failure: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowestJob {
    pub job_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub alias: String,
    #[serde(default)]
    pub avg_duration_seconds: f64,
}

/// Payload of `GET /stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StatsResponse {
    #[serde(default)]
    pub jobs: JobStats,
    #[serde(default)]
    pub top_failing: Vec<FailingJob>,
    #[serde(default)]
    pub slowest_jobs: Vec<SlowestJob>,
}
