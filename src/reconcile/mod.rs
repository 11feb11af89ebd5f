// src/reconcile/mod.rs

//! Client-side run state: a pure merge function plus the store that owns
//! the current snapshot.

pub mod merge;
pub mod store;

pub use merge::{MergeOutcome, apply_event};
pub use store::{ReconciliationStore, TaskInfo};
