// src/model/dag.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::job::JobTask;
use super::{id_as_none, nullable_string};

/// Static task graph of a job, as served by `GET /jobs/{id}/dag`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobDag {
    #[serde(default, deserialize_with = "nullable_string")]
    pub job_id: String,
    #[serde(default)]
    pub nodes: Vec<DagNode>,
    #[serde(default)]
    pub edges: Vec<DagEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagNode {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub atom_id: String,
    #[serde(default, deserialize_with = "id_as_none")]
    pub next_id: Option<String>,
    #[serde(default)]
    pub successors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DagEdge {
    pub from: String,
    pub to: String,
}

impl DagEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl JobDag {
    /// Build a graph from the persisted task chain.
    ///
    /// Each task contributes at most one edge (`id -> next_id`). Successor
    /// lists are sorted so the result does not depend on input order.
    pub fn from_tasks(job_id: impl Into<String>, tasks: &[JobTask]) -> Self {
        let mut successors: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for task in tasks {
            if let Some(next) = task.next_id.as_deref() {
                successors.entry(task.id.as_str()).or_default().insert(next);
            }
        }

        let mut nodes = Vec::with_capacity(tasks.len());
        let mut edges = Vec::new();
        for task in tasks {
            let succ: Vec<String> = successors
                .get(task.id.as_str())
                .map(|set| set.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default();
            for to in &succ {
                edges.push(DagEdge::new(task.id.clone(), to.clone()));
            }
            nodes.push(DagNode {
                id: task.id.clone(),
                atom_id: task.atom_id.clone(),
                next_id: task.next_id.clone(),
                successors: succ,
            });
        }

        Self {
            job_id: job_id.into(),
            nodes,
            edges,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&DagNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
