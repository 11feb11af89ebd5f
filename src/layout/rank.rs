// src/layout/rank.rs

//! Layer assignment.

use crate::layout::graph::LayoutGraph;

/// Assign every node a rank so that each edge points to a strictly higher
/// rank.
///
/// Longest-path layering puts every node as far from the sources as its
/// longest incoming path. Sources are then pulled forward to sit one rank
/// before their nearest successor, which keeps short side branches from
/// stretching back to rank 0.
pub fn assign_ranks(graph: &LayoutGraph) -> Vec<usize> {
    let n = graph.node_count();
    let mut ranks = vec![0usize; n];

    for &node in graph.topo_order() {
        ranks[node] = graph
            .predecessors(node)
            .into_iter()
            .map(|p| ranks[p] + 1)
            .max()
            .unwrap_or(0);
    }

    for node in 0..n {
        if !graph.predecessors(node).is_empty() {
            continue;
        }
        if let Some(nearest) = graph.successors(node).into_iter().map(|s| ranks[s]).min() {
            ranks[node] = nearest - 1;
        }
    }

    if let Some(&min) = ranks.iter().min() {
        for rank in &mut ranks {
            *rank -= min;
        }
    }

    ranks
}
