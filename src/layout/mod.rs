// src/layout/mod.rs

//! Deterministic layered layout of a job DAG.
//!
//! - [`graph`] validates the DAG and indexes it by sorted node id.
//! - [`rank`] assigns layers.
//! - [`order`] orders nodes inside each layer to reduce crossings.
//! - [`position`] turns layers into coordinates, handles and edge routes.
//! - [`style`] decorates a layout from task statuses.
//! - [`render`] draws a decorated layout as text.
//!
//! Layout depends only on topology; status changes go through [`style`] and
//! never move a node.

pub mod graph;
pub mod order;
pub mod position;
pub mod rank;
pub mod render;
pub mod style;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::errors::Result;
use crate::model::{Atom, JobDag, TaskRun};

pub use graph::LayoutGraph;
pub use position::{DagLayout, EdgeLayout, LayoutOptions, NodeLayout, Orientation, Point};
pub use render::render_text;
pub use style::{Decorations, EdgeDecoration, EdgeTone, NodeDecoration, NodeTone, decorate};

/// Compute a layout from scratch.
pub fn compute_layout(dag: &JobDag, options: &LayoutOptions) -> Result<DagLayout> {
    let graph = LayoutGraph::from_dag(dag)?;
    if graph.is_empty() {
        return Ok(DagLayout::empty(options.orientation));
    }
    let ranks = rank::assign_ranks(&graph);
    let layering = order::order_layers(&graph, &ranks);
    debug!(
        job_id = %dag.job_id,
        nodes = graph.node_count(),
        ranks = layering.layers.len(),
        crossings = layering.crossings,
        "computed DAG layout"
    );
    Ok(position::assign_positions(&graph, &layering, options))
}

/// Hash of the node set, atom assignment and edge set, independent of the
/// order the server listed them in.
pub fn topology_fingerprint(dag: &JobDag) -> blake3::Hash {
    let mut nodes: Vec<(&str, &str)> = dag
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.atom_id.as_str()))
        .collect();
    nodes.sort_unstable();
    nodes.dedup_by(|a, b| a.0 == b.0);

    let mut edges: Vec<(&str, &str)> = dag
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .chain(
            dag.nodes
                .iter()
                .flat_map(|n| n.successors.iter().map(move |s| (n.id.as_str(), s.as_str()))),
        )
        .collect();
    edges.sort_unstable();
    edges.dedup();

    let mut hasher = blake3::Hasher::new();
    for (id, atom) in nodes {
        hasher.update(b"n\0");
        hasher.update(id.as_bytes());
        hasher.update(b"\0");
        hasher.update(atom.as_bytes());
        hasher.update(b"\n");
    }
    for (from, to) in edges {
        hasher.update(b"e\0");
        hasher.update(from.as_bytes());
        hasher.update(b"\0");
        hasher.update(to.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize()
}

/// Cached layout for one job, recomputed only when the topology changes.
#[derive(Debug, Clone)]
pub struct DagView {
    options: LayoutOptions,
    fingerprint: Option<blake3::Hash>,
    layout: Arc<DagLayout>,
}

impl DagView {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            fingerprint: None,
            layout: Arc::new(DagLayout::empty(options.orientation)),
        }
    }

    /// Returns `true` when the layout was recomputed.
    ///
    /// On error (e.g. a cycle) the previous layout is kept.
    pub fn update_topology(&mut self, dag: &JobDag) -> Result<bool> {
        let fingerprint = topology_fingerprint(dag);
        if self.fingerprint == Some(fingerprint) {
            return Ok(false);
        }
        let layout = compute_layout(dag, &self.options)?;
        self.layout = Arc::new(layout);
        self.fingerprint = Some(fingerprint);
        Ok(true)
    }

    pub fn layout(&self) -> &Arc<DagLayout> {
        &self.layout
    }

    pub fn fingerprint(&self) -> Option<blake3::Hash> {
        self.fingerprint
    }

    pub fn decorate(&self, atoms: &BTreeMap<String, Atom>, tasks: &[TaskRun]) -> Decorations {
        decorate(&self.layout, atoms, tasks)
    }
}

impl Default for DagView {
    fn default() -> Self {
        Self::new(LayoutOptions::default())
    }
}
