// tests/model_wire.rs

mod common;
use crate::common::{TestResult, init_tracing};

use serde_json::json;

use caesium_console::events::{CaesiumEvent, EventFilter, EventKind};
use caesium_console::model::{
    Atom, JobDag, JobRun, NIL_ID, RunPatch, Status, TaskPatch, parse_command, present_id,
};

#[test]
fn status_aliases_fold_into_canonical_names() {
    assert_eq!(Status::normalize("completed"), Status::Succeeded);
    assert_eq!(Status::normalize("SUCCEEDED"), Status::Succeeded);
    assert_eq!(Status::normalize("canceled"), Status::Cancelled);
    assert_eq!(Status::normalize(""), Status::Pending);
    assert_eq!(Status::normalize("exploded"), Status::Pending);
    assert_eq!(Status::Succeeded.to_string(), "succeeded");

    assert!(Status::Running.would_regress_to(Status::Pending));
    assert!(!Status::Failed.would_regress_to(Status::Succeeded));
    assert!(!Status::Pending.is_terminal());
    assert!(Status::Skipped.is_terminal());
}

#[test]
fn run_snapshot_tolerates_nulls_and_missing_fields() -> TestResult {
    init_tracing();
    let run: JobRun = serde_json::from_value(json!({
        "id": "run-1",
        "job_id": null,
        "status": null,
        "error": "",
        "tasks": null
    }))?;

    assert_eq!(run.job_id, "");
    assert_eq!(run.status, Status::Pending);
    assert_eq!(run.error, None);
    assert!(run.tasks.is_empty());
    Ok(())
}

#[test]
fn task_ids_fall_back_to_record_id() -> TestResult {
    init_tracing();
    let run: JobRun = serde_json::from_value(json!({
        "id": "run-1",
        "job_id": "job-1",
        "status": "completed",
        "started_at": "2024-01-01T12:00:00Z",
        "tasks": [
            { "id": "a", "status": "succeeded", "command": "[\"echo\",\"hi\"]" },
            { "id": "b", "task_id": NIL_ID, "status": "canceled", "command": "make all" },
            { "id": "x", "task_id": "c", "status": "running", "command": ["sh", "-c", "true"] }
        ]
    }))?;

    assert_eq!(run.status, Status::Succeeded);
    assert!(run.started_at.is_some());
    let ids: Vec<&str> = run.tasks.iter().map(|t| t.task_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(run.task("a").map(|t| t.command.clone()), Some(vec!["echo".into(), "hi".into()]));
    assert_eq!(run.task("b").map(|t| t.status), Some(Status::Cancelled));
    assert_eq!(run.task("b").map(|t| t.command.clone()), Some(vec!["make all".to_string()]));
    assert_eq!(run.task_position("c"), Some(2));
    Ok(())
}

#[test]
fn patches_treat_blank_and_nil_as_absent() -> TestResult {
    init_tracing();
    let payload = json!({
        "id": NIL_ID,
        "task_id": "a",
        "job_run_id": "",
        "image": "",
        "error": "boom",
        "status": "failed"
    });

    let patch = TaskPatch::from_payload(Some(&payload)).ok_or("patch")?;
    assert_eq!(patch.id, None);
    assert_eq!(patch.task_id.as_deref(), Some("a"));
    assert_eq!(patch.job_run_id, None);
    assert_eq!(patch.image, None);
    assert_eq!(patch.error.as_deref(), Some("boom"));
    assert_eq!(patch.status, Some(Status::Failed));

    assert!(TaskPatch::from_payload(Some(&json!("not an object"))).is_none());
    assert!(TaskPatch::from_payload(None).is_none());
    Ok(())
}

#[test]
fn run_patch_is_full_only_with_identity_status_and_tasks() -> TestResult {
    init_tracing();
    let partial = RunPatch::from_payload(Some(&json!({ "id": "run-1", "status": "failed" })))
        .ok_or("patch")?;
    assert!(partial.into_full().is_none());

    let full = RunPatch::from_payload(Some(&json!({
        "id": "run-1",
        "job_id": "job-1",
        "status": "failed",
        "error": "task b failed",
        "tasks": [{ "id": "b", "status": "failed" }]
    })))
    .ok_or("patch")?
    .into_full()
    .ok_or("full run")?;

    assert_eq!(full.status, Status::Failed);
    assert_eq!(full.error.as_deref(), Some("task b failed"));
    assert_eq!(full.tasks[0].task_id, "b");
    Ok(())
}

#[test]
fn atom_command_accepts_string_or_list() -> TestResult {
    let atom: Atom = serde_json::from_value(json!({
        "id": "atom-1",
        "engine": "docker",
        "image": "alpine:3",
        "command": "[\"sh\", \"-c\", \"echo ok\"]"
    }))?;
    assert_eq!(atom.command, ["sh", "-c", "echo ok"]);

    assert_eq!(parse_command("  "), Vec::<String>::new());
    assert_eq!(parse_command("[broken"), vec!["[broken".to_string()]);
    assert_eq!(present_id(Some(NIL_ID.to_string())), None);
    assert_eq!(present_id(Some("run-1".into())).as_deref(), Some("run-1"));
    Ok(())
}

#[test]
fn dag_payload_decodes_with_defaults() -> TestResult {
    let dag: JobDag = serde_json::from_value(json!({
        "job_id": "job-1",
        "nodes": [
            { "id": "a", "atom_id": "atom-a", "next_id": "b", "successors": ["b"] },
            { "id": "b", "atom_id": "atom-b", "next_id": NIL_ID }
        ],
        "edges": [{ "from": "a", "to": "b" }]
    }))?;

    assert_eq!(dag.node("a").and_then(|n| n.next_id.clone()).as_deref(), Some("b"));
    assert_eq!(dag.node("b").and_then(|n| n.next_id.clone()), None);
    assert!(dag.node("b").is_some_and(|n| n.successors.is_empty()));
    assert_eq!(dag.edges.len(), 1);
    Ok(())
}

#[test]
fn event_keeps_unknown_types_and_drops_nil_ids() -> TestResult {
    let event: CaesiumEvent = serde_json::from_value(json!({
        "type": "task_started",
        "job_id": "job-1",
        "run_id": NIL_ID,
        "task_id": "",
        "timestamp": "2024-01-01T12:00:00Z",
        "payload": { "task_id": "a" }
    }))?;
    assert_eq!(event.kind(), Some(EventKind::TaskStarted));
    assert_eq!(event.run_id, None);
    assert_eq!(event.task_id, None);

    let unknown: CaesiumEvent = serde_json::from_value(json!({ "type": "task_exploded" }))?;
    assert_eq!(unknown.event_type, "task_exploded");
    assert_eq!(unknown.kind(), None);
    Ok(())
}

#[test]
fn run_filter_builds_query_pairs() {
    let filter = EventFilter::for_run("job-1", "run-1");
    let pairs = filter.query_pairs();
    assert_eq!(pairs[0], ("job_id", "job-1".to_string()));
    assert_eq!(pairs[1], ("run_id", "run-1".to_string()));
    let (key, types) = &pairs[2];
    assert_eq!(*key, "types");
    assert!(types.contains("task_started"));
    assert!(types.contains("run_failed"));
    assert!(!types.contains("log_chunk"));

    assert!(EventFilter::default().query_pairs().is_empty());
}
