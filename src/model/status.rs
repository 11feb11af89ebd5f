// src/model/status.rs

//! Run and task status vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle status shared by runs and tasks.
///
/// `succeeded` is the canonical success name. The backend also reports
/// `completed` in a few places; it is folded into [`Status::Succeeded`] when
/// decoding so nothing downstream has to care about the alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
    Cancelled,
}

impl Status {
    /// Terminal statuses are never overwritten by an earlier lifecycle phase.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Succeeded | Status::Failed | Status::Skipped | Status::Cancelled
        )
    }

    /// Coarse lifecycle phase: pending < running < terminal.
    ///
    /// Two terminal statuses share a phase, so an authoritative update may
    /// move between them.
    pub fn phase(self) -> u8 {
        match self {
            Status::Pending => 0,
            Status::Running => 1,
            _ => 2,
        }
    }

    /// Whether moving from `self` to `next` would go back in the lifecycle.
    pub fn would_regress_to(self, next: Status) -> bool {
        next.phase() < self.phase()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Running => "running",
            Status::Succeeded => "succeeded",
            Status::Failed => "failed",
            Status::Skipped => "skipped",
            Status::Cancelled => "cancelled",
        }
    }

    /// Lenient parse used at the wire boundary: unknown values are `Pending`.
    pub fn normalize(raw: &str) -> Status {
        raw.parse().unwrap_or(Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "" => Ok(Status::Pending),
            "running" => Ok(Status::Running),
            "succeeded" | "completed" => Ok(Status::Succeeded),
            "failed" => Ok(Status::Failed),
            "skipped" => Ok(Status::Skipped),
            "cancelled" | "canceled" => Ok(Status::Cancelled),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Status::normalize(&s)).unwrap_or_default())
    }
}
