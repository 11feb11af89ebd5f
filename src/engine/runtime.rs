// src/engine/runtime.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::events::{EventFilter, EventKind, EventStreamClient, SubscriptionId};
use crate::model::{Atom, JobDag, JobRun};
use crate::types::BoxFuture;

use super::core::{RenderedRun, RunViewCore, ViewCommand};
use super::{ViewEvent, ViewOptions};

/// Where authoritative snapshots come from.
///
/// Implemented by `ApiClient`; tests provide scripted fakes.
pub trait SnapshotSource: Send + Sync {
    fn fetch_run<'a>(&'a self, job_id: &'a str, run_id: &'a str) -> BoxFuture<'a, Result<JobRun>>;

    fn fetch_dag<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Result<JobDag>>;

    fn fetch_atoms<'a>(&'a self, dag: &'a JobDag) -> BoxFuture<'a, Result<BTreeMap<String, Atom>>>;
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for Arc<T> {
    fn fetch_run<'a>(&'a self, job_id: &'a str, run_id: &'a str) -> BoxFuture<'a, Result<JobRun>> {
        (**self).fetch_run(job_id, run_id)
    }

    fn fetch_dag<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Result<JobDag>> {
        (**self).fetch_dag(job_id)
    }

    fn fetch_atoms<'a>(&'a self, dag: &'a JobDag) -> BoxFuture<'a, Result<BTreeMap<String, Atom>>> {
        (**self).fetch_atoms(dag)
    }
}

/// Drives the run view in response to `ViewEvent`s.
///
/// This is the IO shell around `RunViewCore`: it owns the event channel, the
/// feed subscription, the polling timer and the snapshot fetch tasks. All
/// reconciliation decisions are made by the core.
pub struct RunViewRuntime {
    core: RunViewCore,
    source: Arc<dyn SnapshotSource>,
    options: ViewOptions,
    event_tx: mpsc::UnboundedSender<ViewEvent>,
    event_rx: mpsc::UnboundedReceiver<ViewEvent>,
    view_tx: watch::Sender<Option<RenderedRun>>,
    feed: Option<EventStreamClient>,
    subscriptions: Vec<SubscriptionId>,
}

impl fmt::Debug for RunViewRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunViewRuntime")
            .field("core", &self.core)
            .field("options", &self.options)
            .field("feed", &self.feed)
            .finish_non_exhaustive()
    }
}

impl RunViewRuntime {
    pub fn new(core: RunViewCore, source: Arc<dyn SnapshotSource>, options: ViewOptions) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (view_tx, _) = watch::channel(None);
        Self {
            core,
            source,
            options,
            event_tx,
            event_rx,
            view_tx,
            feed: None,
            subscriptions: Vec::new(),
        }
    }

    /// Handle for injecting events from outside, e.g. `Shutdown` on Ctrl-C.
    pub fn sender(&self) -> mpsc::UnboundedSender<ViewEvent> {
        self.event_tx.clone()
    }

    /// Receiver that sees every published view.
    pub fn subscribe(&self) -> watch::Receiver<Option<RenderedRun>> {
        self.view_tx.subscribe()
    }

    /// Route run and task events from `feed` into this view and open the
    /// feed for this run.
    ///
    /// The feed is disconnected when the runtime exits.
    pub fn attach_feed(&mut self, mut feed: EventStreamClient) {
        for kind in EventKind::run_view_kinds() {
            let tx = self.event_tx.clone();
            let id = feed.subscribe(kind, move |event| {
                let _ = tx.send(ViewEvent::Feed(event.clone()));
            });
            self.subscriptions.push(id);
        }

        let store = self.core.store();
        feed.connect(EventFilter::for_run(store.job_id(), store.run_id()));
        self.feed = Some(feed);
    }

    /// Load the job's DAG and atoms into the core.
    ///
    /// A failed fetch leaves the layout empty; a cyclic DAG is an error.
    pub async fn load_topology(&mut self) -> Result<()> {
        let job_id = self.core.store().job_id().to_string();
        let dag = match self.source.fetch_dag(&job_id).await {
            Ok(dag) => dag,
            Err(err) => {
                warn!(job_id = %job_id, error = %err, "failed to load job DAG; continuing without layout");
                return Ok(());
            }
        };
        let atoms = match self.source.fetch_atoms(&dag).await {
            Ok(atoms) => atoms,
            Err(err) => {
                warn!(job_id = %job_id, error = %err, "failed to load atoms");
                BTreeMap::new()
            }
        };
        self.core.set_topology(&dag, atoms)
    }

    /// Main event loop.
    ///
    /// - Requests the initial snapshot.
    /// - Consumes `ViewEvent`s and periodic refetch ticks.
    /// - Executes commands returned by the core (fetch, publish).
    ///
    /// Returns the last snapshot seen.
    pub async fn run(mut self) -> Result<Option<Arc<JobRun>>> {
        info!(
            job_id = %self.core.store().job_id(),
            run_id = %self.core.store().run_id(),
            "run view started"
        );

        self.publish(self.core.render());
        let step = self.core.start();
        for command in step.commands {
            self.execute_command(command);
        }

        let period = self.options.refetch_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                maybe = self.event_rx.recv() => match maybe {
                    Some(event) => event,
                    None => {
                        info!("run view event channel closed; exiting");
                        break;
                    }
                },
                _ = ticker.tick() => ViewEvent::RefetchTick,
            };

            debug!(?event, "run view received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                info!("core requested exit; stopping run view");
                break;
            }
        }

        self.detach_feed();
        info!("run view exiting");
        Ok(self.core.store().snapshot())
    }

    fn execute_command(&mut self, command: ViewCommand) {
        match command {
            ViewCommand::Refetch => self.spawn_refetch(),
            ViewCommand::Publish(view) => self.publish(view),
        }
    }

    fn spawn_refetch(&self) {
        let source = Arc::clone(&self.source);
        let tx = self.event_tx.clone();
        let job_id = self.core.store().job_id().to_string();
        let run_id = self.core.store().run_id().to_string();
        debug!(%run_id, "refetching run snapshot");

        tokio::spawn(async move {
            let event = match source.fetch_run(&job_id, &run_id).await {
                Ok(run) => ViewEvent::Refetched(run),
                Err(err) => ViewEvent::RefetchFailed(err.detail()),
            };
            let _ = tx.send(event);
        });
    }

    fn publish(&self, view: RenderedRun) {
        self.view_tx.send_replace(Some(view));
    }

    fn detach_feed(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            for id in self.subscriptions.drain(..) {
                feed.unsubscribe(id);
            }
            feed.disconnect();
        }
    }
}
