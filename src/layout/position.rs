// src/layout/position.rs

//! Coordinates, handles and edge routes.

use serde::Serialize;

use crate::layout::graph::LayoutGraph;
use crate::layout::order::{Layering, Slot};

pub const NODE_WIDTH: f64 = 200.0;
pub const NODE_HEIGHT: f64 = 50.0;
pub const RANK_SEPARATION: f64 = 50.0;
pub const NODE_SEPARATION: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Orientation {
    /// Ranks run left to right; edges leave on the right, enter on the left.
    #[default]
    LeftToRight,
    TopToBottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub orientation: Orientation,
    pub node_width: f64,
    pub node_height: f64,
    pub rank_separation: f64,
    pub node_separation: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::LeftToRight,
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            rank_separation: RANK_SEPARATION,
            node_separation: NODE_SEPARATION,
        }
    }
}

impl LayoutOptions {
    pub fn with_orientation(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLayout {
    pub id: String,
    pub atom_id: String,
    pub rank: usize,
    pub order: usize,
    /// Top-left corner.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub source_handle: Point,
    pub target_handle: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    /// Orthogonal polyline from the source handle to the target handle.
    pub points: Vec<Point>,
}

/// Positioned graph. Nodes are sorted by id, edges by `(from, to)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DagLayout {
    pub orientation: Orientation,
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub width: f64,
    pub height: f64,
}

impl DagLayout {
    pub fn empty(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn rank_count(&self) -> usize {
        self.nodes.iter().map(|n| n.rank + 1).max().unwrap_or(0)
    }
}

struct Geometry<'a> {
    options: &'a LayoutOptions,
    /// Extent of each rank along the cross axis.
    extents: Vec<f64>,
    max_extent: f64,
}

impl Geometry<'_> {
    fn along(&self) -> f64 {
        match self.options.orientation {
            Orientation::LeftToRight => self.options.node_width,
            Orientation::TopToBottom => self.options.node_height,
        }
    }

    fn across(&self) -> f64 {
        match self.options.orientation {
            Orientation::LeftToRight => self.options.node_height,
            Orientation::TopToBottom => self.options.node_width,
        }
    }

    fn top_left(&self, rank: usize, index: usize) -> Point {
        let main = rank as f64 * (self.along() + self.options.rank_separation);
        let offset = (self.max_extent - self.extents[rank]) / 2.0;
        let cross = offset + index as f64 * (self.across() + self.options.node_separation);
        match self.options.orientation {
            Orientation::LeftToRight => Point::new(main, cross),
            Orientation::TopToBottom => Point::new(cross, main),
        }
    }

    fn center(&self, rank: usize, index: usize) -> Point {
        let p = self.top_left(rank, index);
        Point::new(p.x + self.options.node_width / 2.0, p.y + self.options.node_height / 2.0)
    }

    fn source_handle(&self, p: Point) -> Point {
        let (w, h) = (self.options.node_width, self.options.node_height);
        match self.options.orientation {
            Orientation::LeftToRight => Point::new(p.x + w, p.y + h / 2.0),
            Orientation::TopToBottom => Point::new(p.x + w / 2.0, p.y + h),
        }
    }

    fn target_handle(&self, p: Point) -> Point {
        let (w, h) = (self.options.node_width, self.options.node_height);
        match self.options.orientation {
            Orientation::LeftToRight => Point::new(p.x, p.y + h / 2.0),
            Orientation::TopToBottom => Point::new(p.x + w / 2.0, p.y),
        }
    }
}

pub fn assign_positions(graph: &LayoutGraph, layering: &Layering, options: &LayoutOptions) -> DagLayout {
    if graph.is_empty() {
        return DagLayout::empty(options.orientation);
    }

    let across = match options.orientation {
        Orientation::LeftToRight => options.node_height,
        Orientation::TopToBottom => options.node_width,
    };
    let extents: Vec<f64> = layering
        .layers
        .iter()
        .map(|layer| {
            let k = layer.len() as f64;
            (k * across + (k - 1.0).max(0.0) * options.node_separation).max(0.0)
        })
        .collect();
    let max_extent = extents.iter().copied().fold(0.0, f64::max);
    let geo = Geometry {
        options,
        extents,
        max_extent,
    };

    let mut nodes = Vec::with_capacity(graph.node_count());
    for node in 0..graph.node_count() {
        let Some((rank, order)) = layering.coord(Slot::Node(node)) else {
            continue;
        };
        let position = geo.top_left(rank, order);
        nodes.push(NodeLayout {
            id: graph.id(node).to_string(),
            atom_id: graph.atom_id(node).to_string(),
            rank,
            order,
            position,
            width: options.node_width,
            height: options.node_height,
            source_handle: geo.source_handle(position),
            target_handle: geo.target_handle(position),
        });
    }

    let mut edges = Vec::with_capacity(layering.chains.len());
    for chain in &layering.chains {
        let (Some(src), Some(dst)) = (
            layering.coord(Slot::Node(chain.from)),
            layering.coord(Slot::Node(chain.to)),
        ) else {
            continue;
        };

        let mut waypoints = vec![geo.source_handle(geo.top_left(src.0, src.1))];
        waypoints.extend(
            chain
                .via
                .iter()
                .filter_map(|slot| layering.coord(*slot))
                .map(|(rank, idx)| geo.center(rank, idx)),
        );
        waypoints.push(geo.target_handle(geo.top_left(dst.0, dst.1)));

        edges.push(EdgeLayout {
            from: graph.id(chain.from).to_string(),
            to: graph.id(chain.to).to_string(),
            points: smoothstep(&waypoints, options.orientation),
        });
    }
    edges.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));

    let ranks = layering.layers.len() as f64;
    let along = match options.orientation {
        Orientation::LeftToRight => options.node_width,
        Orientation::TopToBottom => options.node_height,
    };
    let main_extent = ranks * along + (ranks - 1.0).max(0.0) * options.rank_separation;
    let (width, height) = match options.orientation {
        Orientation::LeftToRight => (main_extent, max_extent),
        Orientation::TopToBottom => (max_extent, main_extent),
    };

    DagLayout {
        orientation: options.orientation,
        nodes,
        edges,
        width,
        height,
    }
}

/// Connect consecutive waypoints with axis-aligned steps that turn halfway
/// along the rank axis.
pub fn smoothstep(waypoints: &[Point], orientation: Orientation) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(waypoints.len() * 3);
    let Some(first) = waypoints.first() else {
        return out;
    };
    out.push(*first);

    for pair in waypoints.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        match orientation {
            Orientation::LeftToRight => {
                let mid = (a.x + b.x) / 2.0;
                push_point(&mut out, Point::new(mid, a.y));
                push_point(&mut out, Point::new(mid, b.y));
            }
            Orientation::TopToBottom => {
                let mid = (a.y + b.y) / 2.0;
                push_point(&mut out, Point::new(a.x, mid));
                push_point(&mut out, Point::new(b.x, mid));
            }
        }
        push_point(&mut out, b);
    }

    out
}

/// Append `p`, skipping duplicates and folding collinear runs into one segment.
fn push_point(out: &mut Vec<Point>, p: Point) {
    if out.last() == Some(&p) {
        return;
    }
    if let [.., a, b] = out.as_slice() {
        let same_x = a.x == b.x && b.x == p.x;
        let same_y = a.y == b.y && b.y == p.y;
        if same_x || same_y {
            out.pop();
        }
    }
    out.push(p);
}
