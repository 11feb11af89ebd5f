// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `caesium-console`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "caesium-console",
    version,
    about = "Terminal console for Caesium jobs: DAG layouts, live runs and task logs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `caesium-console.toml` in the current working directory.
    /// A missing file is not an error.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Server base URL, e.g. `http://127.0.0.1:8080`.
    ///
    /// Overrides `CAESIUM_BASE_URL`, `CAESIUM_HOST` and the config file.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CAESIUM_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List jobs and their latest run.
    Jobs,

    /// List the runs of one job.
    Runs {
        #[arg(long, value_name = "ID")]
        job: String,
    },

    /// List a job's task definitions and their chain.
    Tasks {
        #[arg(long, value_name = "ID")]
        job: String,
    },

    /// List atoms.
    Atoms,

    /// List triggers, or show one with its configuration.
    Triggers {
        #[arg(long, value_name = "ID")]
        id: Option<String>,
    },

    /// Print aggregate job statistics.
    Stats,

    /// Print the layered layout of a job's DAG.
    Dag {
        #[arg(long, value_name = "ID")]
        job: String,

        /// Lay ranks out top to bottom instead of left to right.
        #[arg(long)]
        vertical: bool,
    },

    /// Follow a run live, redrawing its DAG as task statuses change.
    Watch {
        #[arg(long, value_name = "ID")]
        job: String,

        #[arg(long, value_name = "ID")]
        run: String,

        /// Exit once the run reaches a terminal status.
        #[arg(long)]
        until_done: bool,
    },

    /// Stream one task's logs to stdout. Ctrl-C stops the stream.
    Logs {
        #[arg(long, value_name = "ID")]
        job: String,

        #[arg(long, value_name = "ID")]
        run: String,

        #[arg(long, value_name = "ID")]
        task: String,
    },

    /// Start a new run of a job and print its id.
    Trigger {
        #[arg(long, value_name = "ID")]
        job: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
