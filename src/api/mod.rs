// src/api/mod.rs

//! HTTP boundary to the orchestration server.
//!
//! [`ApiClient`] is the production implementation of the three IO seams the
//! rest of the crate is written against: `EventTransport` (feed bytes),
//! `LogSource` (task logs) and `SnapshotSource` (run, DAG and atoms).

pub mod client;

pub use client::ApiClient;
