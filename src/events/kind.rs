// src/events/kind.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Status;

/// Closed set of event types published on the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    JobCreated,
    JobDeleted,
    RunStarted,
    RunCompleted,
    RunSucceeded,
    RunFailed,
    TaskStarted,
    TaskSucceeded,
    TaskFailed,
    TaskSkipped,
    LogChunk,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::JobCreated,
        EventKind::JobDeleted,
        EventKind::RunStarted,
        EventKind::RunCompleted,
        EventKind::RunSucceeded,
        EventKind::RunFailed,
        EventKind::TaskStarted,
        EventKind::TaskSucceeded,
        EventKind::TaskFailed,
        EventKind::TaskSkipped,
        EventKind::LogChunk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::JobCreated => "job_created",
            EventKind::JobDeleted => "job_deleted",
            EventKind::RunStarted => "run_started",
            EventKind::RunCompleted => "run_completed",
            EventKind::RunSucceeded => "run_succeeded",
            EventKind::RunFailed => "run_failed",
            EventKind::TaskStarted => "task_started",
            EventKind::TaskSucceeded => "task_succeeded",
            EventKind::TaskFailed => "task_failed",
            EventKind::TaskSkipped => "task_skipped",
            EventKind::LogChunk => "log_chunk",
        }
    }

    /// Run-terminal events carry the final run status.
    pub fn terminal_run_status(self) -> Option<Status> {
        match self {
            EventKind::RunCompleted | EventKind::RunSucceeded => Some(Status::Succeeded),
            EventKind::RunFailed => Some(Status::Failed),
            _ => None,
        }
    }

    /// Status a task event implies for its task.
    pub fn implied_task_status(self) -> Option<Status> {
        match self {
            EventKind::TaskStarted => Some(Status::Running),
            EventKind::TaskSucceeded => Some(Status::Succeeded),
            EventKind::TaskFailed => Some(Status::Failed),
            EventKind::TaskSkipped => Some(Status::Skipped),
            _ => None,
        }
    }

    /// Kinds the run view cares about: everything that can change a run snapshot.
    pub fn run_view_kinds() -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|k| {
                *k == EventKind::RunStarted
                    || k.terminal_run_status().is_some()
                    || k.implied_task_status().is_some()
            })
            .collect()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown event type: {s}"))
    }
}

/// One decoded feed event.
///
/// `event_type` keeps the raw string so unrecognized types survive decoding;
/// [`CaesiumEvent::kind`] maps it onto the closed vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaesiumEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default, deserialize_with = "crate::model::id_as_none")]
    pub job_id: Option<String>,
    #[serde(default, deserialize_with = "crate::model::id_as_none")]
    pub run_id: Option<String>,
    #[serde(default, deserialize_with = "crate::model::id_as_none")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

impl CaesiumEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            event_type: kind.as_str().to_string(),
            job_id: None,
            run_id: None,
            task_id: None,
            timestamp: None,
            payload: None,
        }
    }

    pub fn kind(&self) -> Option<EventKind> {
        self.event_type.parse().ok()
    }
}

/// Server-side narrowing of the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub job_id: Option<String>,
    pub run_id: Option<String>,
    pub types: Vec<EventKind>,
}

impl EventFilter {
    pub fn for_run(job_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.into()),
            run_id: Some(run_id.into()),
            types: EventKind::run_view_kinds(),
        }
    }

    /// Query parameters for `GET /events`; empty filters are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(job) = self.job_id.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("job_id", job.to_string()));
        }
        if let Some(run) = self.run_id.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("run_id", run.to_string()));
        }
        if !self.types.is_empty() {
            let joined = self
                .types
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("types", joined));
        }
        pairs
    }
}
