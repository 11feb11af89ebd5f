// src/engine/core.rs

//! Pure core of the run view.
//!
//! This module contains a synchronous, deterministic state machine that
//! consumes [`ViewEvent`]s and produces:
//! - an updated snapshot (through the owned [`ReconciliationStore`])
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::RunViewRuntime`) is responsible for
//! fetching snapshots, forwarding feed events, running the refetch timer
//! and publishing rendered views. The core never touches the network.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::engine::{ViewEvent, ViewOptions};
use crate::errors::Result;
use crate::layout::{DagLayout, DagView, Decorations, LayoutOptions};
use crate::model::{Atom, JobDag, JobRun};
use crate::reconcile::ReconciliationStore;

/// Everything a surface needs to draw the run.
#[derive(Debug, Clone)]
pub struct RenderedRun {
    pub snapshot: Option<Arc<JobRun>>,
    pub layout: Arc<DagLayout>,
    pub decorations: Decorations,
    /// Latest refetch failure, cleared by the next successful fetch.
    pub last_error: Option<String>,
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum ViewCommand {
    /// Fetch the run snapshot and report back with `Refetched` or
    /// `RefetchFailed`.
    Refetch,
    /// Hand this view to observers.
    Publish(RenderedRun),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct ViewStep {
    pub commands: Vec<ViewCommand>,
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct RunViewCore {
    store: ReconciliationStore,
    view: DagView,
    atoms: BTreeMap<String, Atom>,
    options: ViewOptions,
    refetch_in_flight: bool,
    refetch_queued: bool,
    last_error: Option<String>,
}

impl RunViewCore {
    pub fn new(job_id: impl Into<String>, run_id: impl Into<String>, options: ViewOptions) -> Self {
        Self::with_layout(job_id, run_id, options, LayoutOptions::default())
    }

    pub fn with_layout(
        job_id: impl Into<String>,
        run_id: impl Into<String>,
        options: ViewOptions,
        layout: LayoutOptions,
    ) -> Self {
        Self {
            store: ReconciliationStore::new(job_id, run_id),
            view: DagView::new(layout),
            atoms: BTreeMap::new(),
            options,
            refetch_in_flight: false,
            refetch_queued: false,
            last_error: None,
        }
    }

    pub fn store(&self) -> &ReconciliationStore {
        &self.store
    }

    pub fn layout(&self) -> &Arc<DagLayout> {
        self.view.layout()
    }

    pub fn refetch_in_flight(&self) -> bool {
        self.refetch_in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Install the job's static topology and atom table.
    pub fn set_topology(&mut self, dag: &JobDag, atoms: BTreeMap<String, Atom>) -> Result<()> {
        if self.view.update_topology(dag)? {
            debug!(job_id = %dag.job_id, nodes = dag.nodes.len(), "run view layout recomputed");
        }
        self.atoms = atoms;
        Ok(())
    }

    /// First step of a session: request the initial snapshot.
    pub fn start(&mut self) -> ViewStep {
        let mut commands = Vec::new();
        self.request_refetch(&mut commands);
        ViewStep {
            commands,
            keep_running: true,
        }
    }

    pub fn step(&mut self, event: ViewEvent) -> ViewStep {
        self.step_at(event, Utc::now())
    }

    /// Handle a single event, updating state and returning the commands for
    /// the IO shell. `now` stamps placeholder tasks.
    pub fn step_at(&mut self, event: ViewEvent, now: DateTime<Utc>) -> ViewStep {
        let mut commands = Vec::new();

        match event {
            ViewEvent::Feed(event) => {
                let was_terminal = self.is_terminal();
                let outcome = self.store.apply_at(&event, now);
                if outcome.refetch {
                    self.request_refetch(&mut commands);
                }
                if outcome.changed {
                    if !was_terminal && self.is_terminal() {
                        info!(run_id = %self.store.run_id(), "run reached a terminal status");
                        // Pick up final task states the event did not carry.
                        self.request_refetch(&mut commands);
                    }
                    commands.push(ViewCommand::Publish(self.render()));
                }
            }
            ViewEvent::Refetched(run) => {
                self.refetch_in_flight = false;
                self.last_error = None;
                self.store.replace(run);
                self.drain_queued(&mut commands);
                commands.push(ViewCommand::Publish(self.render()));
            }
            ViewEvent::RefetchFailed(message) => {
                warn!(run_id = %self.store.run_id(), error = %message, "snapshot refetch failed; keeping cached snapshot");
                self.refetch_in_flight = false;
                self.last_error = Some(message);
                self.drain_queued(&mut commands);
                commands.push(ViewCommand::Publish(self.render()));
            }
            ViewEvent::RefetchTick => {
                self.request_refetch(&mut commands);
            }
            ViewEvent::Shutdown => {
                return ViewStep {
                    commands,
                    keep_running: false,
                };
            }
        }

        ViewStep {
            commands,
            keep_running: !self.should_exit(),
        }
    }

    /// Current snapshot, layout and decorations.
    pub fn render(&self) -> RenderedRun {
        let snapshot = self.store.snapshot();
        let tasks = snapshot.as_ref().map(|s| s.tasks.as_slice()).unwrap_or_default();
        RenderedRun {
            decorations: self.view.decorate(&self.atoms, tasks),
            layout: Arc::clone(self.view.layout()),
            snapshot,
            last_error: self.last_error.clone(),
        }
    }

    fn is_terminal(&self) -> bool {
        self.store.snapshot().is_some_and(|s| s.is_terminal())
    }

    fn should_exit(&self) -> bool {
        self.options.exit_when_terminal
            && self.is_terminal()
            && !self.refetch_in_flight
            && !self.refetch_queued
    }

    /// At most one fetch is outstanding; later requests collapse into a
    /// single follow-up.
    fn request_refetch(&mut self, commands: &mut Vec<ViewCommand>) {
        if self.refetch_in_flight {
            self.refetch_queued = true;
            return;
        }
        if commands.iter().any(|c| matches!(c, ViewCommand::Refetch)) {
            return;
        }
        self.refetch_in_flight = true;
        commands.push(ViewCommand::Refetch);
    }

    fn drain_queued(&mut self, commands: &mut Vec<ViewCommand>) {
        if self.refetch_queued {
            self.refetch_queued = false;
            self.request_refetch(commands);
        }
    }
}
