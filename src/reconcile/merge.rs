// src/reconcile/merge.rs

//! Pure merge of one feed event into a run snapshot.
//!
//! # Idempotency requirement
//!
//! The feed is at-least-once, and refetched snapshots race with events, so
//! every rule here must be idempotent: applying an event twice yields the
//! same snapshot as applying it once. Rules use assignment only, guard
//! appends with an existence check, and refuse to move a status back in the
//! lifecycle (pending < running < terminal).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::events::{CaesiumEvent, EventKind};
use crate::model::{JobRun, RunPatch, Status, TaskPatch, TaskRun};

/// Result of [`apply_event`].
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Next snapshot. Same `Arc` as the input when nothing changed.
    pub snapshot: Option<Arc<JobRun>>,
    /// The event referenced a task the snapshot did not have; an
    /// authoritative refetch should follow.
    pub refetch: bool,
    pub changed: bool,
}

impl MergeOutcome {
    fn unchanged(snapshot: Option<&Arc<JobRun>>) -> Self {
        Self {
            snapshot: snapshot.cloned(),
            refetch: false,
            changed: false,
        }
    }

    fn updated(current: &Arc<JobRun>, next: JobRun, refetch: bool) -> Self {
        if **current == next {
            return Self {
                snapshot: Some(Arc::clone(current)),
                refetch,
                changed: false,
            };
        }
        Self {
            snapshot: Some(Arc::new(next)),
            refetch,
            changed: true,
        }
    }
}

/// Merge `event` into `snapshot`.
///
/// `now` stamps placeholder tasks; passing it in keeps the function pure.
pub fn apply_event(
    snapshot: Option<&Arc<JobRun>>,
    event: &CaesiumEvent,
    now: DateTime<Utc>,
) -> MergeOutcome {
    let Some(current) = snapshot else {
        return MergeOutcome::unchanged(None);
    };
    let Some(kind) = event.kind() else {
        return MergeOutcome::unchanged(snapshot);
    };
    if let Some(run_id) = event.run_id.as_deref() {
        if run_id != current.id {
            debug!(run_id, snapshot_run = %current.id, kind = %kind, "event for another run ignored");
            return MergeOutcome::unchanged(snapshot);
        }
    }

    if let Some(status) = kind.terminal_run_status() {
        return merge_run_terminal(current, event, status);
    }
    if kind == EventKind::RunStarted {
        return merge_run_started(current);
    }
    if let Some(implied) = kind.implied_task_status() {
        return merge_task(current, event, implied, now);
    }

    // job_* and log_chunk carry nothing for a run snapshot.
    MergeOutcome::unchanged(snapshot)
}

fn merge_run_terminal(current: &Arc<JobRun>, event: &CaesiumEvent, status: Status) -> MergeOutcome {
    let patch = RunPatch::from_payload(event.payload.as_ref());

    if let Some(payload_run) = patch.as_ref().and_then(|p| p.id.as_deref()) {
        if payload_run != current.id {
            debug!(payload_run, snapshot_run = %current.id, "terminal payload for another run ignored");
            return MergeOutcome::unchanged(Some(current));
        }
    }

    if let Some(mut full) = patch.and_then(RunPatch::into_full) {
        if !full.status.is_terminal() {
            full.status = status;
        }
        return MergeOutcome::updated(current, full, false);
    }

    let mut next = JobRun::clone(current);
    next.status = status;
    MergeOutcome::updated(current, next, false)
}

fn merge_run_started(current: &Arc<JobRun>) -> MergeOutcome {
    if current.status != Status::Pending {
        return MergeOutcome::unchanged(Some(current));
    }
    let mut next = JobRun::clone(current);
    next.status = Status::Running;
    MergeOutcome::updated(current, next, false)
}

fn merge_task(
    current: &Arc<JobRun>,
    event: &CaesiumEvent,
    implied: Status,
    now: DateTime<Utc>,
) -> MergeOutcome {
    let patch = TaskPatch::from_payload(event.payload.as_ref()).unwrap_or_default();

    if let Some(job_run_id) = patch.job_run_id.as_deref() {
        if job_run_id != current.id {
            debug!(job_run_id, snapshot_run = %current.id, "task payload for another run ignored");
            return MergeOutcome::unchanged(Some(current));
        }
    }

    let Some(task_id) = patch.task_id.clone().or_else(|| event.task_id.clone()) else {
        warn!(
            kind = %event.event_type,
            run_id = %current.id,
            "task event without task id dropped"
        );
        return MergeOutcome::unchanged(Some(current));
    };
    let status = patch.status.unwrap_or(implied);

    match current.task_position(&task_id) {
        Some(pos) => {
            let stored = &current.tasks[pos];
            if stored.status.would_regress_to(status) {
                debug!(
                    task_id = %task_id,
                    stored = %stored.status,
                    incoming = %status,
                    "stale task event ignored"
                );
                return MergeOutcome::unchanged(Some(current));
            }
            let mut next = JobRun::clone(current);
            let task = &mut next.tasks[pos];
            patch.merge_fields_into(task);
            task.status = status;
            MergeOutcome::updated(current, next, false)
        }
        None => {
            debug!(task_id = %task_id, status = %status, "unknown task, adding placeholder");
            let mut placeholder = TaskRun::placeholder(&current.id, &task_id, status, now);
            patch.merge_fields_into(&mut placeholder);
            let mut next = JobRun::clone(current);
            next.tasks.push(placeholder);
            MergeOutcome::updated(current, next, true)
        }
    }
}
