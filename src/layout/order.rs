// src/layout/order.rs

//! Ordering nodes within each rank to reduce edge crossings.

use std::collections::{BTreeMap, BTreeSet};

use crate::layout::graph::LayoutGraph;

/// Barycenter passes; even passes sweep down, odd passes sweep up.
const SWEEPS: usize = 8;

/// One position in a rank: a real node or a virtual node on a long edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Node(usize),
    Virtual(usize),
}

/// A graph edge together with the virtual slots it passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeChain {
    pub from: usize,
    pub to: usize,
    pub via: Vec<Slot>,
}

#[derive(Debug, Clone)]
pub struct Layering {
    pub layers: Vec<Vec<Slot>>,
    pub chains: Vec<EdgeChain>,
    pub crossings: usize,
    coords: BTreeMap<Slot, (usize, usize)>,
}

impl Layering {
    /// `(rank, index within rank)` of a slot.
    pub fn coord(&self, slot: Slot) -> Option<(usize, usize)> {
        self.coords.get(&slot).copied()
    }
}

type Adjacency = BTreeMap<Slot, Vec<Slot>>;

pub fn order_layers(graph: &LayoutGraph, ranks: &[usize]) -> Layering {
    if graph.is_empty() {
        return Layering {
            layers: Vec::new(),
            chains: Vec::new(),
            crossings: 0,
            coords: BTreeMap::new(),
        };
    }

    let depth = ranks.iter().copied().max().unwrap_or(0) + 1;
    let mut members: Vec<BTreeSet<Slot>> = vec![BTreeSet::new(); depth];
    for (node, &rank) in ranks.iter().enumerate() {
        members[rank].insert(Slot::Node(node));
    }

    let mut down: Adjacency = BTreeMap::new();
    let mut up: Adjacency = BTreeMap::new();
    let mut chains = Vec::new();
    let mut next_virtual = 0usize;

    for (from, to) in graph.edges() {
        let mut prev = Slot::Node(from);
        let mut via = Vec::new();
        for rank in ranks[from] + 1..ranks[to] {
            let slot = Slot::Virtual(next_virtual);
            next_virtual += 1;
            members[rank].insert(slot);
            link(&mut down, &mut up, prev, slot);
            via.push(slot);
            prev = slot;
        }
        link(&mut down, &mut up, prev, Slot::Node(to));
        chains.push(EdgeChain { from, to, via });
    }

    let mut layers = initial_order(&members, &down);
    let mut best = layers.clone();
    let mut best_crossings = count_crossings(&layers, &down);

    for sweep in 0..SWEEPS {
        if best_crossings == 0 {
            break;
        }
        if sweep % 2 == 0 {
            for rank in 1..layers.len() {
                reorder(&mut layers, rank, rank - 1, &up);
            }
        } else {
            for rank in (0..layers.len().saturating_sub(1)).rev() {
                reorder(&mut layers, rank, rank + 1, &down);
            }
        }

        let crossings = count_crossings(&layers, &down);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        }
    }

    let coords = best
        .iter()
        .enumerate()
        .flat_map(|(rank, layer)| {
            layer
                .iter()
                .enumerate()
                .map(move |(idx, slot)| (*slot, (rank, idx)))
        })
        .collect();

    Layering {
        layers: best,
        chains,
        crossings: best_crossings,
        coords,
    }
}

fn link(down: &mut Adjacency, up: &mut Adjacency, from: Slot, to: Slot) {
    down.entry(from).or_default().push(to);
    up.entry(to).or_default().push(from);
}

/// Depth-first placement: each rank lists the children of the previous rank
/// in parent order, then whatever is left in slot order.
fn initial_order(members: &[BTreeSet<Slot>], down: &Adjacency) -> Vec<Vec<Slot>> {
    let mut layers: Vec<Vec<Slot>> = Vec::with_capacity(members.len());

    for (rank, set) in members.iter().enumerate() {
        let mut layer: Vec<Slot> = Vec::with_capacity(set.len());
        let mut placed: BTreeSet<Slot> = BTreeSet::new();

        if rank > 0 {
            for parent in &layers[rank - 1] {
                let mut children: Vec<Slot> = down
                    .get(parent)
                    .map(|c| c.iter().copied().filter(|s| set.contains(s)).collect())
                    .unwrap_or_default();
                children.sort_unstable();
                for child in children {
                    if placed.insert(child) {
                        layer.push(child);
                    }
                }
            }
        }
        for slot in set {
            if placed.insert(*slot) {
                layer.push(*slot);
            }
        }
        layers.push(layer);
    }

    layers
}

fn reorder(layers: &mut [Vec<Slot>], rank: usize, fixed: usize, neighbors: &Adjacency) {
    let fixed_pos: BTreeMap<Slot, usize> = layers[fixed]
        .iter()
        .enumerate()
        .map(|(i, s)| (*s, i))
        .collect();

    let mut keyed: Vec<(f64, usize, Slot)> = layers[rank]
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let positions: Vec<usize> = neighbors
                .get(slot)
                .map(|n| n.iter().filter_map(|s| fixed_pos.get(s).copied()).collect())
                .unwrap_or_default();
            let bary = if positions.is_empty() {
                i as f64
            } else {
                positions.iter().sum::<usize>() as f64 / positions.len() as f64
            };
            (bary, i, *slot)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
    layers[rank] = keyed.into_iter().map(|(_, _, slot)| slot).collect();
}

/// Number of pairwise segment crossings between adjacent ranks.
pub fn count_crossings(layers: &[Vec<Slot>], down: &BTreeMap<Slot, Vec<Slot>>) -> usize {
    let mut total = 0;
    for pair in layers.windows(2) {
        let lower: BTreeMap<Slot, usize> = pair[1].iter().enumerate().map(|(i, s)| (*s, i)).collect();
        let mut segments: Vec<(usize, usize)> = Vec::new();
        for (i, slot) in pair[0].iter().enumerate() {
            if let Some(children) = down.get(slot) {
                segments.extend(children.iter().filter_map(|c| lower.get(c).map(|&j| (i, j))));
            }
        }
        for (a, &(u1, v1)) in segments.iter().enumerate() {
            for &(u2, v2) in &segments[a + 1..] {
                if (u1 < u2 && v1 > v2) || (u1 > u2 && v1 < v2) {
                    total += 1;
                }
            }
        }
    }
    total
}
