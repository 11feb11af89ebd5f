// tests/run_view_core.rs

mod common;
use crate::common::{TestResult, init_tracing};

use std::collections::BTreeMap;

use caesium_console::engine::{RunViewCore, ViewCommand, ViewEvent, ViewOptions, ViewStep};
use caesium_console::events::EventKind;
use caesium_console::layout::NodeTone;
use caesium_console::model::Status;
use caesium_console_test_utils::{DagBuilder, EventBuilder, RunBuilder, fixed_now};

fn refetches(step: &ViewStep) -> usize {
    step.commands
        .iter()
        .filter(|c| matches!(c, ViewCommand::Refetch))
        .count()
}

fn publishes(step: &ViewStep) -> usize {
    step.commands
        .iter()
        .filter(|c| matches!(c, ViewCommand::Publish(_)))
        .count()
}

fn feed(core: &mut RunViewCore, kind: EventKind, task: &str) -> ViewStep {
    let event = EventBuilder::task(kind, "run-1", task).build();
    core.step_at(ViewEvent::Feed(event), fixed_now())
}

fn loaded_core(options: ViewOptions) -> RunViewCore {
    let mut core = RunViewCore::new("job-1", "run-1", options);
    core.start();
    core.step(ViewEvent::Refetched(
        RunBuilder::new("run-1")
            .status(Status::Running)
            .with_task("A", Status::Running)
            .build(),
    ));
    core
}

#[test]
fn start_requests_the_initial_snapshot() {
    init_tracing();
    let mut core = RunViewCore::new("job-1", "run-1", ViewOptions::default());
    assert!(core.render().snapshot.is_none());

    let step = core.start();
    assert_eq!(refetches(&step), 1);
    assert!(step.keep_running);
    assert!(core.refetch_in_flight());

    let step = core.step(ViewEvent::Refetched(RunBuilder::new("run-1").build()));
    assert_eq!(refetches(&step), 0);
    assert_eq!(publishes(&step), 1);
    assert!(!core.refetch_in_flight());
    assert!(core.store().is_loaded());
}

#[test]
fn refetch_requests_coalesce_while_one_is_in_flight() {
    init_tracing();
    let mut core = loaded_core(ViewOptions::default());

    // Unknown task: placeholder plus a refetch.
    let step = feed(&mut core, EventKind::TaskStarted, "B");
    assert_eq!(refetches(&step), 1);
    assert_eq!(publishes(&step), 1);

    // More unknown tasks and a timer tick while the fetch is out.
    let step = feed(&mut core, EventKind::TaskStarted, "C");
    assert_eq!(refetches(&step), 0);
    assert_eq!(publishes(&step), 1);
    let step = core.step(ViewEvent::RefetchTick);
    assert_eq!(refetches(&step), 0);
    assert!(step.commands.is_empty());

    // Completion issues exactly one follow-up.
    let step = core.step(ViewEvent::Refetched(
        RunBuilder::new("run-1")
            .status(Status::Running)
            .with_task("A", Status::Running)
            .with_task("B", Status::Running)
            .build(),
    ));
    assert_eq!(refetches(&step), 1);
    assert!(core.refetch_in_flight());

    let step = core.step(ViewEvent::Refetched(RunBuilder::new("run-1").status(Status::Running).build()));
    assert_eq!(refetches(&step), 0);
    assert!(!core.refetch_in_flight());
}

#[test]
fn known_task_updates_publish_without_fetching() {
    init_tracing();
    let mut core = loaded_core(ViewOptions::default());

    let step = feed(&mut core, EventKind::TaskSucceeded, "A");
    assert_eq!(refetches(&step), 0);
    let Some(ViewCommand::Publish(view)) = step.commands.first() else {
        panic!("expected a publish, got {:?}", step.commands);
    };
    let snapshot = view.snapshot.as_ref().map(|s| s.tasks[0].status);
    assert_eq!(snapshot, Some(Status::Succeeded));

    // Replays and stale events change nothing and publish nothing.
    assert!(feed(&mut core, EventKind::TaskSucceeded, "A").commands.is_empty());
    assert!(feed(&mut core, EventKind::TaskStarted, "A").commands.is_empty());

    let other_run = EventBuilder::task(EventKind::TaskFailed, "run-2", "A").build();
    assert!(core.step_at(ViewEvent::Feed(other_run), fixed_now()).commands.is_empty());
}

#[test]
fn terminal_run_refetches_before_exiting() {
    init_tracing();
    let options = ViewOptions {
        exit_when_terminal: true,
        ..ViewOptions::default()
    };
    let mut core = loaded_core(options);

    let step = core.step_at(
        ViewEvent::Feed(EventBuilder::new(EventKind::RunFailed).run("run-1").build()),
        fixed_now(),
    );
    assert_eq!(refetches(&step), 1);
    assert_eq!(publishes(&step), 1);
    assert!(step.keep_running, "must wait for the final snapshot");

    let step = core.step(ViewEvent::Refetched(
        RunBuilder::new("run-1")
            .status(Status::Failed)
            .with_task("A", Status::Failed)
            .build(),
    ));
    assert!(!step.keep_running);
}

#[test]
fn terminal_run_keeps_watching_without_exit_option() {
    init_tracing();
    let mut core = loaded_core(ViewOptions::default());

    core.step_at(
        ViewEvent::Feed(EventBuilder::new(EventKind::RunSucceeded).run("run-1").build()),
        fixed_now(),
    );
    let step = core.step(ViewEvent::Refetched(
        RunBuilder::new("run-1").status(Status::Succeeded).build(),
    ));
    assert!(step.keep_running);

    // A replayed terminal event does not trigger another fetch.
    let step = core.step_at(
        ViewEvent::Feed(EventBuilder::new(EventKind::RunSucceeded).run("run-1").build()),
        fixed_now(),
    );
    assert!(step.commands.is_empty());
}

#[test]
fn failed_refetch_keeps_cached_snapshot() {
    init_tracing();
    let mut core = loaded_core(ViewOptions::default());
    core.step(ViewEvent::RefetchTick);

    let step = core.step(ViewEvent::RefetchFailed("server unavailable".into()));
    let Some(ViewCommand::Publish(view)) = step.commands.last() else {
        panic!("expected a publish, got {:?}", step.commands);
    };
    assert_eq!(view.last_error.as_deref(), Some("server unavailable"));
    assert_eq!(view.snapshot.as_ref().map(|s| s.tasks.len()), Some(1));
    assert_eq!(core.last_error(), Some("server unavailable"));
    assert!(!core.refetch_in_flight());

    core.step(ViewEvent::RefetchTick);
    core.step(ViewEvent::Refetched(RunBuilder::new("run-1").status(Status::Running).build()));
    assert_eq!(core.last_error(), None);
}

#[test]
fn shutdown_stops_immediately() {
    init_tracing();
    let mut core = loaded_core(ViewOptions::default());
    let step = core.step(ViewEvent::Shutdown);
    assert!(!step.keep_running);
    assert!(step.commands.is_empty());
}

#[test]
fn render_styles_nodes_from_the_snapshot() -> TestResult {
    init_tracing();
    let mut core = RunViewCore::new("job-1", "run-1", ViewOptions::default());
    let dag = DagBuilder::new("job-1").chain(&["A", "B"]).build();
    core.set_topology(&dag, BTreeMap::new())?;
    assert_eq!(core.layout().nodes.len(), 2);

    // No snapshot yet: nodes render without status.
    let view = core.render();
    assert_eq!(view.decorations.nodes["A"].status, None);

    core.start();
    core.step(ViewEvent::Refetched(
        RunBuilder::new("run-1")
            .status(Status::Running)
            .with_task("A", Status::Succeeded)
            .with_task("B", Status::Running)
            .build(),
    ));
    let view = core.render();
    assert_eq!(view.decorations.nodes["A"].tone, NodeTone::Success);
    assert_eq!(view.decorations.nodes["B"].tone, NodeTone::Active);

    let cyclic = DagBuilder::new("job-1").chain(&["A", "B"]).edge("B", "A").build();
    assert!(core.set_topology(&cyclic, BTreeMap::new()).is_err());
    assert_eq!(core.layout().nodes.len(), 2);
    Ok(())
}
