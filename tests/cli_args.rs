// tests/cli_args.rs

use clap::Parser;

use caesium_console::cli::{CliArgs, Command, LogLevel};
use caesium_console::logging::resolve_level;

#[test]
fn watch_accepts_global_flags_after_the_subcommand() -> Result<(), clap::Error> {
    let args = CliArgs::try_parse_from([
        "caesium-console",
        "watch",
        "--job",
        "job-1",
        "--run",
        "run-1",
        "--until-done",
        "--base-url",
        "http://ci:8080",
        "--log-level",
        "debug",
    ])?;

    assert_eq!(args.base_url.as_deref(), Some("http://ci:8080"));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    match args.command {
        Command::Watch {
            job,
            run,
            until_done,
        } => {
            assert_eq!((job.as_str(), run.as_str()), ("job-1", "run-1"));
            assert!(until_done);
        }
        other => panic!("unexpected command {other:?}"),
    }
    Ok(())
}

#[test]
fn logs_requires_all_three_ids() {
    let missing = CliArgs::try_parse_from(["caesium-console", "logs", "--job", "j", "--run", "r"]);
    assert!(missing.is_err());

    let args = CliArgs::try_parse_from([
        "caesium-console", "logs", "--job", "j", "--run", "r", "--task", "t",
    ]);
    assert!(matches!(args.map(|a| a.command), Ok(Command::Logs { .. })));
}

#[test]
fn unknown_log_level_is_rejected() {
    let res = CliArgs::try_parse_from(["caesium-console", "--log-level", "loud", "jobs"]);
    assert!(res.is_err());
}

#[test]
fn log_level_prefers_flag_then_env() {
    assert_eq!(resolve_level(Some(LogLevel::Trace), Some("error")), tracing::Level::TRACE);
    assert_eq!(resolve_level(None, Some(" Warning ")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, Some("chatty")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, None), tracing::Level::INFO);
}

#[test]
fn listing_subcommands_parse() -> Result<(), clap::Error> {
    let runs = CliArgs::try_parse_from(["caesium-console", "runs", "--job", "job-1"])?;
    assert!(matches!(runs.command, Command::Runs { job } if job == "job-1"));

    let one = CliArgs::try_parse_from(["caesium-console", "triggers", "--id", "tr-1"])?;
    assert!(matches!(one.command, Command::Triggers { id: Some(id) } if id == "tr-1"));
    let all = CliArgs::try_parse_from(["caesium-console", "triggers"])?;
    assert!(matches!(all.command, Command::Triggers { id: None }));

    assert!(matches!(
        CliArgs::try_parse_from(["caesium-console", "stats"])?.command,
        Command::Stats
    ));
    assert!(CliArgs::try_parse_from(["caesium-console", "tasks"]).is_err());
    Ok(())
}
