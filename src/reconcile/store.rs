// src/reconcile/store.rs

//! Single-writer holder of the current run snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::events::CaesiumEvent;
use crate::model::{JobRun, Status};
use crate::reconcile::merge::{MergeOutcome, apply_event};

/// Read-only per-task view derived from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub task_id: String,
    pub atom_id: String,
    pub status: Status,
    pub error: Option<String>,
}

/// Owns the snapshot for one `(job_id, run_id)`.
///
/// Every mutation replaces the whole `Arc<JobRun>`, so a subscriber never
/// observes a half-applied merge.
#[derive(Debug)]
pub struct ReconciliationStore {
    job_id: String,
    run_id: String,
    tx: watch::Sender<Option<Arc<JobRun>>>,
}

impl ReconciliationStore {
    pub fn new(job_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            job_id: job_id.into(),
            run_id: run_id.into(),
            tx,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<JobRun>>> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Option<Arc<JobRun>> {
        self.tx.borrow().clone()
    }

    /// Install an authoritative snapshot (initial fetch or refetch).
    ///
    /// Last writer wins: whatever the server returned replaces the cache,
    /// including placeholders added since the previous fetch. A snapshot of
    /// another run is rejected and `false` returned.
    pub fn replace(&self, run: JobRun) -> bool {
        if run.id != self.run_id {
            warn!(expected = %self.run_id, got = %run.id, "snapshot for another run rejected");
            return false;
        }
        info!(
            run_id = %run.id,
            status = %run.status,
            tasks = run.tasks.len(),
            "run snapshot replaced"
        );
        self.tx.send_replace(Some(Arc::new(run)));
        true
    }

    pub fn apply(&self, event: &CaesiumEvent) -> MergeOutcome {
        self.apply_at(event, Utc::now())
    }

    pub fn apply_at(&self, event: &CaesiumEvent, now: DateTime<Utc>) -> MergeOutcome {
        let current = self.snapshot();
        let outcome = apply_event(current.as_ref(), event, now);
        if outcome.changed {
            self.tx.send_replace(outcome.snapshot.clone());
        }
        outcome
    }

    pub fn is_loaded(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn task_status(&self) -> BTreeMap<String, TaskInfo> {
        let Some(run) = self.snapshot() else {
            return BTreeMap::new();
        };
        run.tasks
            .iter()
            .map(|t| {
                (
                    t.task_id.clone(),
                    TaskInfo {
                        task_id: t.task_id.clone(),
                        atom_id: t.atom_id.clone(),
                        status: t.status,
                        error: t.error.clone(),
                    },
                )
            })
            .collect()
    }
}
