// src/lib.rs

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod layout;
pub mod listing;
pub mod logging;
pub mod logs;
pub mod model;
pub mod reconcile;
pub mod types;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::cli::{CliArgs, Command};
use crate::config::{ConsoleConfig, default_config_path, load_and_validate};
use crate::engine::{RenderedRun, RunViewCore, RunViewRuntime, ViewEvent, ViewOptions};
use crate::events::EventStreamClient;
use crate::layout::{LayoutOptions, Orientation, compute_layout, decorate, render_text};
use crate::listing::{
    format_atoms, format_jobs, format_runs, format_stats, format_tasks, format_trigger,
    format_triggers,
};
use crate::logs::{LogStreamEnd, LogStreamReader, TerminalSink};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the REST client
/// - the run view (feed + reconciliation + layout) for `watch`
/// - the log reader for `logs`
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path, args.base_url.as_deref())?;
    debug!(base_url = %cfg.base_url, config = %config_path.display(), "configuration loaded");

    let client = Arc::new(ApiClient::new(&cfg)?);

    match args.command {
        Command::Jobs => {
            print!("{}", format_jobs(&client.list_jobs().await?));
            Ok(())
        }
        Command::Runs { job } => {
            let (info, runs) = tokio::try_join!(client.get_job(&job), client.list_runs(&job))?;
            print!("{}", format_runs(&info, &runs));
            Ok(())
        }
        Command::Tasks { job } => {
            print!("{}", format_tasks(&client.list_tasks(&job).await?));
            Ok(())
        }
        Command::Atoms => {
            print!("{}", format_atoms(&client.list_atoms().await?));
            Ok(())
        }
        Command::Triggers { id: Some(id) } => {
            print!("{}", format_trigger(&client.get_trigger(&id).await?));
            Ok(())
        }
        Command::Triggers { id: None } => {
            print!("{}", format_triggers(&client.list_triggers().await?));
            Ok(())
        }
        Command::Stats => {
            print!("{}", format_stats(&client.stats().await?));
            Ok(())
        }
        Command::Dag { job, vertical } => print_dag(&client, &job, vertical).await,
        Command::Watch {
            job,
            run,
            until_done,
        } => watch_run(&cfg, client, &job, &run, until_done).await,
        Command::Logs { job, run, task } => stream_logs(client, &job, &run, &task).await,
        Command::Trigger { job } => {
            let run = client.trigger_run(&job).await?;
            info!(job_id = %job, run_id = %run.id, "run triggered");
            println!("{}", run.id);
            Ok(())
        }
    }
}

async fn print_dag(client: &ApiClient, job_id: &str, vertical: bool) -> Result<()> {
    let orientation = if vertical {
        Orientation::TopToBottom
    } else {
        Orientation::LeftToRight
    };
    let dag = client.get_dag(job_id).await?;
    let layout = compute_layout(&dag, &LayoutOptions::with_orientation(orientation))?;
    let atoms = client.atoms_for(&dag).await?;
    let decorations = decorate(&layout, &atoms, &[]);
    print!("{}", render_text(&layout, &decorations));
    Ok(())
}

async fn watch_run(
    cfg: &ConsoleConfig,
    client: Arc<ApiClient>,
    job_id: &str,
    run_id: &str,
    until_done: bool,
) -> Result<()> {
    let options = ViewOptions {
        exit_when_terminal: until_done,
        refetch_interval: cfg.refetch_interval,
    };
    let core = RunViewCore::new(job_id, run_id, options);
    let mut runtime = RunViewRuntime::new(core, client.clone(), options);
    runtime.load_topology().await?;
    runtime.attach_feed(EventStreamClient::with_reconnect_delay(
        client,
        cfg.reconnect_delay,
    ));

    // Ctrl-C → graceful shutdown.
    {
        let tx = runtime.sender();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(ViewEvent::Shutdown);
        });
    }

    // Redraw on every published view; ends when the runtime is dropped.
    let mut views = runtime.subscribe();
    let printer = tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            if let Some(view) = view {
                print_view(&view);
            }
        }
    });

    let last = runtime.run().await?;
    let _ = printer.await;

    match last {
        Some(run) if run.is_terminal() => {
            println!("run {} finished: {}", run.id, run.status);
            Ok(())
        }
        Some(run) => {
            println!("run {} is {}", run.id, run.status);
            Ok(())
        }
        None => Err(anyhow!("run {run_id} of job {job_id} could not be loaded")),
    }
}

fn print_view(view: &RenderedRun) {
    match &view.snapshot {
        Some(run) => println!("run {} [{}]", run.id, run.status),
        None => println!("run loading..."),
    }
    if let Some(err) = &view.last_error {
        println!("  (refresh failed: {err})");
    }
    print!("{}", render_text(&view.layout, &view.decorations));
    println!();
}

async fn stream_logs(client: Arc<ApiClient>, job_id: &str, run_id: &str, task_id: &str) -> Result<()> {
    let mut reader = LogStreamReader::new(client);
    let sink = TerminalSink::new(std::io::stdout().is_terminal());
    let handle = reader.open(job_id, run_id, task_id, sink);

    let end = tokio::select! {
        end = handle.wait() => end,
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                eprintln!("failed to listen for Ctrl+C: {e}");
            }
            reader.cancel();
            LogStreamEnd::Cancelled
        }
    };

    debug!(task_id, ?end, "log stream ended");
    match end {
        LogStreamEnd::Completed | LogStreamEnd::Cancelled => Ok(()),
        LogStreamEnd::Rejected { status } => Err(anyhow!("log request rejected (HTTP {status})")),
        LogStreamEnd::Failed(message) => Err(anyhow!("log stream failed: {message}")),
    }
}
