// src/model/mod.rs

//! Wire types for the REST API and the event feed.
//!
//! - [`status`] holds the run/task status vocabulary.
//! - [`job`] covers jobs, atoms, triggers and stats.
//! - [`run`] covers job runs and their task runs.
//! - [`dag`] holds the static task graph of a job.
//! - [`patch`] holds the partial run/task records carried by feed events.
//!
//! The backend serializes "absent" in a few different ways (`""`, the nil
//! UUID, `null`). The helpers at the bottom of this module fold all of them
//! into `None` at the boundary.

pub mod dag;
pub mod job;
pub mod patch;
pub mod run;
pub mod status;

pub use dag::{DagEdge, DagNode, JobDag};
pub use job::{Atom, FailingJob, Job, JobStats, JobTask, SlowestJob, StatsResponse, Trigger};
pub use patch::{RunPatch, TaskPatch};
pub use run::{JobRun, TaskRun};
pub use status::Status;

use serde::{Deserialize, Deserializer};

/// Identifier used by the backend for "no id".
pub const NIL_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Returns `None` for empty strings and the nil UUID.
pub fn present_id(raw: Option<String>) -> Option<String> {
    raw.filter(|s| {
        let s = s.trim();
        !s.is_empty() && s != NIL_ID
    })
}

pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

pub(crate) fn id_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(present_id(raw))
}

pub(crate) fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCommand {
    List(Vec<String>),
    Text(String),
}

/// Parse a command that may arrive as a JSON array or as a string.
///
/// A string holding a JSON array is unpacked; any other string becomes a
/// single-element command.
pub fn parse_command(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(trimmed) {
        Ok(list) => list,
        Err(_) => vec![raw.to_string()],
    }
}

pub(crate) fn command_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawCommand>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RawCommand::List(list)) => list,
        Some(RawCommand::Text(text)) => parse_command(&text),
    })
}

pub(crate) fn optional_command_list<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawCommand>::deserialize(deserializer)? {
        None => None,
        Some(RawCommand::List(list)) => Some(list),
        Some(RawCommand::Text(text)) => Some(parse_command(&text)),
    })
}
