// tests/layout_properties.rs

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use caesium_console::layout::{LayoutOptions, compute_layout, decorate};
use caesium_console::model::{DagEdge, DagNode, JobDag, Status};
use caesium_console_test_utils::TaskRunBuilder;

// Acyclic by construction: node i may only point at nodes with a larger index.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = JobDag> {
    (1..=max_nodes).prop_flat_map(|n| {
        proptest::collection::vec((0..n, 0..n), 0..(n * 2)).prop_map(move |pairs| {
            let nodes = (0..n)
                .map(|i| DagNode {
                    id: format!("t{i:02}"),
                    atom_id: format!("atom-{i}"),
                    next_id: None,
                    successors: Vec::new(),
                })
                .collect();
            let edges: BTreeSet<(usize, usize)> = pairs
                .into_iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| (a.min(b), a.max(b)))
                .collect();
            JobDag {
                job_id: "job-p".into(),
                nodes,
                edges: edges
                    .into_iter()
                    .map(|(a, b)| DagEdge::new(format!("t{a:02}"), format!("t{b:02}")))
                    .collect(),
            }
        })
    })
}

fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Pending),
        Just(Status::Running),
        Just(Status::Succeeded),
        Just(Status::Failed),
        Just(Status::Skipped),
    ]
}

proptest! {
    #[test]
    fn every_edge_points_to_a_later_rank(dag in dag_strategy(12)) {
        let layout = compute_layout(&dag, &LayoutOptions::default()).unwrap();
        prop_assert_eq!(layout.nodes.len(), dag.nodes.len());
        prop_assert_eq!(layout.edges.len(), dag.edges.len());

        let ranks: BTreeMap<&str, usize> =
            layout.nodes.iter().map(|n| (n.id.as_str(), n.rank)).collect();
        for edge in &dag.edges {
            prop_assert!(ranks[edge.from.as_str()] < ranks[edge.to.as_str()]);
        }
    }

    #[test]
    fn nodes_never_overlap(dag in dag_strategy(12)) {
        let options = LayoutOptions::default();
        let layout = compute_layout(&dag, &options).unwrap();
        for (i, a) in layout.nodes.iter().enumerate() {
            for b in &layout.nodes[i + 1..] {
                let apart_x = (a.position.x - b.position.x).abs() >= options.node_width;
                let apart_y = (a.position.y - b.position.y).abs() >= options.node_height;
                prop_assert!(apart_x || apart_y, "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn layout_ignores_input_order(dag in dag_strategy(10)) {
        let mut reversed = dag.clone();
        reversed.nodes.reverse();
        reversed.edges.reverse();

        let a = compute_layout(&dag, &LayoutOptions::default()).unwrap();
        let b = compute_layout(&reversed, &LayoutOptions::default()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn decoration_covers_every_node_and_edge(
        dag in dag_strategy(10),
        statuses in proptest::collection::vec(status_strategy(), 10),
    ) {
        let layout = compute_layout(&dag, &LayoutOptions::default()).unwrap();
        let tasks: Vec<_> = layout
            .nodes
            .iter()
            .zip(statuses)
            .map(|(node, status)| TaskRunBuilder::new(&node.id).status(status).build())
            .collect();

        let decorations = decorate(&layout, &BTreeMap::new(), &tasks);
        prop_assert_eq!(decorations.nodes.len(), layout.nodes.len());
        prop_assert_eq!(decorations.edges.len(), layout.edges.len());
        for task in &tasks {
            prop_assert_eq!(decorations.nodes[&task.task_id].status, Some(task.status));
        }
    }
}
