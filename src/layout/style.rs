// src/layout/style.rs

//! Status-driven decoration of a computed layout.
//!
//! Decoration never feeds back into positions: the same layout is decorated
//! again every time a snapshot changes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::layout::position::DagLayout;
use crate::model::{Atom, Status, TaskRun};

const COMMAND_SUMMARY_WIDTH: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeTone {
    Neutral,
    Active,
    Success,
    Failure,
    Skipped,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeTone {
    Neutral,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDecoration {
    pub id: String,
    pub status: Option<Status>,
    pub tone: NodeTone,
    pub animated: bool,
    pub label: String,
    pub status_icon: &'static str,
    pub engine_icon: &'static str,
    pub command_summary: Option<String>,
    /// Shown under a failed node when the task recorded an error.
    pub error_banner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeDecoration {
    pub from: String,
    pub to: String,
    pub tone: EdgeTone,
    /// The source task is running. Independent of tone: an edge out of a
    /// running node keeps the neutral tone until that node succeeds.
    pub animated: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Decorations {
    pub nodes: BTreeMap<String, NodeDecoration>,
    pub edges: Vec<EdgeDecoration>,
}

impl NodeTone {
    pub fn from_status(status: Option<Status>) -> Self {
        match status {
            Some(Status::Succeeded) => NodeTone::Success,
            Some(Status::Failed) => NodeTone::Failure,
            Some(Status::Running) => NodeTone::Active,
            Some(Status::Skipped) => NodeTone::Skipped,
            Some(Status::Cancelled) => NodeTone::Cancelled,
            Some(Status::Pending) | None => NodeTone::Neutral,
        }
    }
}

pub fn status_icon(status: Option<Status>) -> &'static str {
    match status {
        Some(Status::Succeeded) => "✓",
        Some(Status::Failed) => "✗",
        Some(Status::Skipped) => "↷",
        Some(Status::Running) => "⠋",
        Some(Status::Cancelled) => "⊘",
        Some(Status::Pending) | None => "·",
    }
}

pub fn engine_icon(engine: &str) -> &'static str {
    match engine.trim().to_lowercase().as_str() {
        "docker" => "🐳",
        "kubernetes" | "k8s" => "☸",
        "podman" => "🦭",
        "wasm" | "wasmer" | "wasmtime" => "🔮",
        _ => "⚙",
    }
}

/// Display label for a node: last path segment of the image, or the raw
/// atom id when the atom is unknown.
pub fn node_label(atom_id: &str, atom: Option<&Atom>) -> String {
    match atom {
        Some(atom) if !atom.image.trim().is_empty() => atom
            .image
            .trim()
            .rsplit('/')
            .next()
            .unwrap_or(atom.image.as_str())
            .to_string(),
        _ => atom_id.to_string(),
    }
}

/// One-line summary of a command, unwrapping `sh -c` style shell bodies.
pub fn short_command(command: &[String], max_width: usize) -> Option<String> {
    const SHELLS: [&str; 4] = ["sh", "bash", "/bin/sh", "/bin/bash"];

    let body = match command {
        [] => return None,
        [shell, flag, rest @ ..] if !rest.is_empty() && SHELLS.contains(&shell.trim()) && flag == "-c" => {
            rest.join(" ")
        }
        all => all.join(" "),
    };

    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    let max_width = if max_width == 0 { COMMAND_SUMMARY_WIDTH } else { max_width };
    let chars: Vec<char> = collapsed.chars().collect();
    if chars.len() <= max_width {
        return Some(collapsed);
    }
    if max_width <= 3 {
        return Some(chars[..max_width].iter().collect());
    }
    let mut out: String = chars[..max_width - 1].iter().collect();
    out.push('…');
    Some(out)
}

/// Decorate `layout` for the given task states.
///
/// `tasks` is matched to nodes by task id. Atom data comes from the task
/// record when present, otherwise from the atom side table.
pub fn decorate(layout: &DagLayout, atoms: &BTreeMap<String, Atom>, tasks: &[TaskRun]) -> Decorations {
    let by_task: BTreeMap<&str, &TaskRun> = tasks.iter().map(|t| (t.task_id.as_str(), t)).collect();

    let mut nodes = BTreeMap::new();
    for node in &layout.nodes {
        let task = by_task.get(node.id.as_str()).copied();
        let atom = atoms.get(&node.atom_id);
        let status = task.map(|t| t.status);
        let tone = NodeTone::from_status(status);

        let engine = task
            .map(|t| t.engine.as_str())
            .filter(|e| !e.is_empty())
            .or_else(|| atom.map(|a| a.engine.as_str()))
            .unwrap_or_default();
        let command = task
            .map(|t| t.command.as_slice())
            .filter(|c| !c.is_empty())
            .or_else(|| atom.map(|a| a.command.as_slice()))
            .unwrap_or_default();
        let error_banner = match status {
            Some(Status::Failed) => task.and_then(|t| t.error.clone()),
            _ => None,
        };

        nodes.insert(
            node.id.clone(),
            NodeDecoration {
                id: node.id.clone(),
                status,
                tone,
                animated: tone == NodeTone::Active,
                label: node_label(&node.atom_id, atom),
                status_icon: status_icon(status),
                engine_icon: engine_icon(engine),
                command_summary: short_command(command, COMMAND_SUMMARY_WIDTH),
                error_banner,
            },
        );
    }

    let edges = layout
        .edges
        .iter()
        .map(|edge| {
            let source = by_task.get(edge.from.as_str()).map(|t| t.status);
            let tone = match source {
                Some(Status::Succeeded) => EdgeTone::Completed,
                _ => EdgeTone::Neutral,
            };
            EdgeDecoration {
                from: edge.from.clone(),
                to: edge.to.clone(),
                tone,
                animated: source == Some(Status::Running),
            }
        })
        .collect();

    Decorations { nodes, edges }
}
