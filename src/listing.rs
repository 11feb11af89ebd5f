// src/listing.rs

//! Plain-text tables for the read-only subcommands.
//!
//! Every formatter returns the whole block with a trailing newline, so
//! callers only `print!` it.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::model::{Atom, Job, JobRun, JobTask, StatsResponse, Trigger};

const NAME_WIDTH: usize = 24;

pub fn format_jobs(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return "(no jobs)\n".to_string();
    }
    let lines = jobs.iter().map(|job| {
        let latest = job
            .latest_run
            .as_ref()
            .map(|r| format!("{} {}", r.status, r.id))
            .unwrap_or_else(|| "-".to_string());
        format!("{}  {}  {}", job.id, or_dash(&job.alias), latest)
    });
    block(lines)
}

/// Runs of one job, newest first as the server returns them.
pub fn format_runs(job: &Job, runs: &[JobRun]) -> String {
    let mut lines = vec![format!("job {} ({})", job.id, or_dash(&job.alias))];
    if runs.is_empty() {
        lines.push("  (no runs)".to_string());
    }
    for run in runs {
        lines.push(format!(
            "  {}  {:<9}  {}  {} tasks",
            run.id,
            run.status.to_string(),
            timestamp(run.started_at),
            run.tasks.len()
        ));
        if let Some(error) = &run.error {
            lines.push(format!("    error: {error}"));
        }
    }
    block(lines)
}

pub fn format_tasks(tasks: &[JobTask]) -> String {
    if tasks.is_empty() {
        return "(no tasks)\n".to_string();
    }
    block(tasks.iter().map(|task| {
        let next = task.next_id.as_deref().unwrap_or("-");
        format!("{}  atom {}  -> {}", task.id, or_dash(&task.atom_id), next)
    }))
}

pub fn format_atoms(atoms: &[Atom]) -> String {
    if atoms.is_empty() {
        return "(no atoms)\n".to_string();
    }
    block(atoms.iter().map(|atom| {
        let command = if atom.command.is_empty() {
            "-".to_string()
        } else {
            atom.command.join(" ")
        };
        format!("{}  {}  {}  {}", atom.id, or_dash(&atom.engine), or_dash(&atom.image), command)
    }))
}

pub fn format_triggers(triggers: &[Trigger]) -> String {
    if triggers.is_empty() {
        return "(no triggers)\n".to_string();
    }
    block(triggers.iter().map(trigger_line))
}

/// One trigger with its raw configuration.
pub fn format_trigger(trigger: &Trigger) -> String {
    let mut lines = vec![trigger_line(trigger)];
    if let Some(configuration) = &trigger.configuration {
        lines.push(format!("  configuration: {configuration}"));
    }
    block(lines)
}

pub fn format_stats(stats: &StatsResponse) -> String {
    let jobs = &stats.jobs;
    let mut lines = vec![
        format!("Total jobs:        {}", jobs.total),
        format!("Recent runs (24h): {}", jobs.recent_runs),
        format!("Success rate:      {:.0}%", jobs.success_rate * 100.0),
        format!("Avg duration:      {}", duration(jobs.avg_duration_seconds)),
    ];

    if !stats.top_failing.is_empty() {
        lines.push(String::new());
        lines.push(format!("{:<NAME_WIDTH$} {:<8} Last failure", "Top failing", "Fails"));
        for job in &stats.top_failing {
            lines.push(format!(
                "{:<NAME_WIDTH$} {:<8} {}",
                job_name(&job.alias, &job.job_id),
                job.failure_count,
                timestamp(job.last_failure)
            ));
        }
    }

    if !stats.slowest_jobs.is_empty() {
        lines.push(String::new());
        lines.push(format!("{:<NAME_WIDTH$} Avg duration", "Slowest"));
        for job in &stats.slowest_jobs {
            lines.push(format!(
                "{:<NAME_WIDTH$} {}",
                job_name(&job.alias, &job.job_id),
                duration(job.avg_duration_seconds)
            ));
        }
    }
    block(lines)
}

/// Human duration: `-` for unknown, then ms, s, m or h.
pub fn duration(seconds: f64) -> String {
    if seconds.is_nan() || seconds <= 0.0 {
        "-".to_string()
    } else if seconds < 1.0 {
        format!("{}ms", (seconds * 1000.0) as u64)
    } else if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else {
        format!("{:.1}h", seconds / 3600.0)
    }
}

fn trigger_line(trigger: &Trigger) -> String {
    format!(
        "{}  {}  {}",
        trigger.id,
        or_dash(&trigger.alias),
        or_dash(&trigger.trigger_type)
    )
}

/// Alias, else the id, cut to the name column.
fn job_name(alias: &str, job_id: &str) -> String {
    let name = if alias.is_empty() { job_id } else { alias };
    if name.chars().count() > NAME_WIDTH {
        let cut: String = name.chars().take(NAME_WIDTH - 3).collect();
        format!("{cut}...")
    } else {
        name.to_string()
    }
}

fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "-".to_string())
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn block<I>(lines: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}
