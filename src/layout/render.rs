// src/layout/render.rs

//! Plain-text rendering of a decorated layout for the terminal.

use std::fmt::Write as _;

use crate::layout::position::{DagLayout, NodeLayout};
use crate::layout::style::{Decorations, EdgeTone, NodeDecoration};

/// Render one line per rank (nodes in layout order), any error banners, and
/// the edge list.
pub fn render_text(layout: &DagLayout, decorations: &Decorations) -> String {
    if layout.nodes.is_empty() {
        return "(empty DAG)\n".to_string();
    }

    let mut ranks: Vec<Vec<&NodeLayout>> = vec![Vec::new(); layout.rank_count()];
    for node in &layout.nodes {
        ranks[node.rank].push(node);
    }

    let mut out = String::new();
    for (rank, nodes) in ranks.iter_mut().enumerate() {
        nodes.sort_by_key(|n| n.order);
        let cells: Vec<String> = nodes
            .iter()
            .map(|n| node_cell(n, decorations.nodes.get(&n.id)))
            .collect();
        let _ = writeln!(out, "[{rank}] {}", cells.join("   "));

        for node in nodes.iter() {
            if let Some(banner) = decorations
                .nodes
                .get(&node.id)
                .and_then(|d| d.error_banner.as_deref())
            {
                let _ = writeln!(out, "    ! {}: {banner}", node.id);
            }
        }
    }

    if !decorations.edges.is_empty() {
        out.push_str("edges:\n");
        for edge in &decorations.edges {
            let marker = match (edge.tone, edge.animated) {
                (EdgeTone::Completed, _) => " (done)",
                (EdgeTone::Neutral, true) => " (active)",
                (EdgeTone::Neutral, false) => "",
            };
            let _ = writeln!(out, "  {} → {}{marker}", edge.from, edge.to);
        }
    }

    out
}

fn node_cell(node: &NodeLayout, decoration: Option<&NodeDecoration>) -> String {
    match decoration {
        Some(d) => match &d.command_summary {
            Some(cmd) => format!("{} {} {} {cmd}", d.status_icon, d.label, d.engine_icon),
            None => format!("{} {} {}", d.status_icon, d.label, d.engine_icon),
        },
        None => format!("· {}", node.atom_id),
    }
}
