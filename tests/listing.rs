// tests/listing.rs

use caesium_console::listing::{
    duration, format_jobs, format_runs, format_stats, format_tasks, format_trigger,
    format_triggers,
};
use caesium_console::model::{
    FailingJob, Job, JobStats, JobTask, SlowestJob, StatsResponse, Status, Trigger,
};
use caesium_console_test_utils::RunBuilder;

fn job(id: &str, alias: &str) -> Job {
    Job {
        id: id.into(),
        alias: alias.into(),
        trigger_id: None,
        labels: Default::default(),
        annotations: Default::default(),
        created_at: None,
        updated_at: None,
        latest_run: None,
    }
}

fn trigger(id: &str, configuration: Option<&str>) -> Trigger {
    Trigger {
        id: id.into(),
        alias: String::new(),
        trigger_type: "cron".into(),
        configuration: configuration.map(str::to_string),
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn jobs_show_latest_run_or_dash() {
    let mut nightly = job("job-1", "nightly");
    nightly.latest_run = Some(RunBuilder::new("run-7").status(Status::Failed).build());
    let text = format_jobs(&[nightly, job("job-2", "")]);
    assert_eq!(text, "job-1  nightly  failed run-7\njob-2  -  -\n");
    assert_eq!(format_jobs(&[]), "(no jobs)\n");
}

#[test]
fn runs_list_status_task_count_and_error() {
    let failed = RunBuilder::new("run-1")
        .status(Status::Failed)
        .with_task("A", Status::Failed)
        .error("exit 1")
        .build();
    let text = format_runs(&job("job-1", "nightly"), &[failed]);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "job job-1 (nightly)");
    assert!(lines[1].starts_with("  run-1  failed "), "{text}");
    assert!(lines[1].ends_with("1 tasks"), "{text}");
    assert_eq!(lines[2], "    error: exit 1");

    let empty = format_runs(&job("job-2", ""), &[]);
    assert_eq!(empty, "job job-2 (-)\n  (no runs)\n");
}

#[test]
fn tasks_show_their_chain() {
    let tasks = vec![
        JobTask {
            id: "t1".into(),
            job_id: "job-1".into(),
            atom_id: "a1".into(),
            next_id: Some("t2".into()),
        },
        JobTask {
            id: "t2".into(),
            job_id: "job-1".into(),
            atom_id: String::new(),
            next_id: None,
        },
    ];
    assert_eq!(format_tasks(&tasks), "t1  atom a1  -> t2\nt2  atom -  -> -\n");
}

#[test]
fn trigger_detail_adds_configuration() {
    assert_eq!(format_triggers(&[trigger("tr-1", None)]), "tr-1  -  cron\n");
    assert_eq!(
        format_trigger(&trigger("tr-1", Some("{\"cron\":\"0 * * * *\"}"))),
        "tr-1  -  cron\n  configuration: {\"cron\":\"0 * * * *\"}\n"
    );
}

#[test]
fn stats_render_overview_and_tables() {
    let stats = StatsResponse {
        jobs: JobStats {
            total: 4,
            recent_runs: 12,
            success_rate: 0.75,
            avg_duration_seconds: 90.0,
        },
        top_failing: vec![FailingJob {
            job_id: "job-with-a-really-long-identifier".into(),
            alias: String::new(),
            failure_count: 3,
            last_failure: None,
        }],
        slowest_jobs: vec![SlowestJob {
            job_id: "job-2".into(),
            alias: "etl".into(),
            avg_duration_seconds: 0.25,
        }],
    };
    let text = format_stats(&stats);
    assert!(text.contains("Success rate:      75%"), "{text}");
    assert!(text.contains("Avg duration:      1.5m"), "{text}");
    assert!(text.contains("job-with-a-really-lon... 3"), "{text}");
    assert!(text.contains(&format!("{:<24} 250ms", "etl")), "{text}");
}

#[test]
fn durations_pick_a_readable_unit() {
    assert_eq!(duration(0.0), "-");
    assert_eq!(duration(0.5), "500ms");
    assert_eq!(duration(12.34), "12.3s");
    assert_eq!(duration(7200.0), "2.0h");
}
