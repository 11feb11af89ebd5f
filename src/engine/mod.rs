// src/engine/mod.rs

//! Live run view.
//!
//! This module ties together:
//! - the reconciliation store (merging feed events into the run snapshot)
//! - the cached DAG layout and its status decoration
//! - the refetch policy (placeholder correction and the polling fallback)
//!
//! The pure core state machine lives in [`core`]; the async/IO shell that
//! talks to the server and the feed is implemented in [`runtime`].

use std::time::Duration;

use crate::events::CaesiumEvent;
use crate::model::JobRun;

/// Options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    /// Stop once the run has reached a terminal status and no refetch is
    /// outstanding (used for `watch --until-done`).
    pub exit_when_terminal: bool,
    /// Period of the background snapshot refetch.
    pub refetch_interval: Duration,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            exit_when_terminal: false,
            refetch_interval: Duration::from_secs(10),
        }
    }
}

/// Events flowing into the run view from the feed, fetch tasks and timers.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// A run or task event arrived on the feed.
    Feed(CaesiumEvent),
    /// A snapshot fetch completed.
    Refetched(JobRun),
    /// A snapshot fetch failed; the message is user-facing.
    RefetchFailed(String),
    /// The polling-fallback timer fired.
    RefetchTick,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    Shutdown,
}

pub mod core;
pub mod runtime;

pub use core::{RenderedRun, RunViewCore, ViewCommand, ViewStep};
pub use runtime::{RunViewRuntime, SnapshotSource};
