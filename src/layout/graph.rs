// src/layout/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::errors::{ConsoleError, Result};
use crate::model::JobDag;

/// Validated, index-based view of a job DAG.
///
/// Node indices follow lexical id order, so two graphs with the same
/// topology get the same indices no matter how the server ordered them.
#[derive(Debug, Clone)]
pub struct LayoutGraph {
    ids: Vec<String>,
    atom_ids: Vec<String>,
    graph: DiGraphMap<usize, ()>,
    topo: Vec<usize>,
}

impl LayoutGraph {
    /// Build from the API representation.
    ///
    /// Edges come from both `edges` and each node's `successors`; duplicates
    /// collapse. Edges naming an unknown node are dropped with a warning.
    /// Cycles (including self-loops) are rejected.
    pub fn from_dag(dag: &JobDag) -> Result<Self> {
        let mut atoms: BTreeMap<&str, &str> = BTreeMap::new();
        for node in &dag.nodes {
            atoms.entry(node.id.as_str()).or_insert(node.atom_id.as_str());
        }

        let ids: Vec<String> = atoms.keys().map(|s| s.to_string()).collect();
        let atom_ids: Vec<String> = atoms.values().map(|s| s.to_string()).collect();
        let index: BTreeMap<&str, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let declared = dag
            .edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .chain(dag.nodes.iter().flat_map(|n| {
                n.successors
                    .iter()
                    .map(move |s| (n.id.as_str(), s.as_str()))
            }));

        let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
        for (from, to) in declared {
            match (index.get(from), index.get(to)) {
                (Some(&f), Some(&t)) => {
                    edges.insert((f, t));
                }
                _ => warn!(from, to, job_id = %dag.job_id, "dropping edge with unknown endpoint"),
            }
        }

        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        for i in 0..ids.len() {
            graph.add_node(i);
        }
        for &(from, to) in &edges {
            graph.add_edge(from, to, ());
        }

        // A topological sort will fail if there is a cycle.
        let topo = toposort(&graph, None).map_err(|cycle| {
            let node = cycle.node_id();
            ConsoleError::DagCycle(format!(
                "cycle detected in job DAG involving task '{}'",
                ids[node]
            ))
        })?;

        Ok(Self {
            ids,
            atom_ids,
            graph,
            topo,
        })
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    pub fn atom_id(&self, index: usize) -> &str {
        &self.atom_ids[index]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.binary_search_by(|candidate| candidate.as_str().cmp(id)).ok()
    }

    /// Node indices in a topological order.
    pub fn topo_order(&self) -> &[usize] {
        &self.topo
    }

    pub fn successors(&self, index: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors_directed(index, petgraph::Direction::Outgoing)
            .collect();
        out.sort_unstable();
        out
    }

    pub fn predecessors(&self, index: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors_directed(index, petgraph::Direction::Incoming)
            .collect();
        out.sort_unstable();
        out
    }

    /// All edges as `(from, to)` index pairs, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut out: Vec<(usize, usize)> = self.graph.all_edges().map(|(a, b, _)| (a, b)).collect();
        out.sort_unstable();
        out
    }
}
