use std::collections::BTreeMap;

use crate::ir::{EdgeDirection, Layer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Side of a node an edge attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Left,
    Right,
    Top,
    Bottom,
}

impl Handle {
    pub fn as_str(self) -> &'static str {
        match self {
            Handle::Left => "left",
            Handle::Right => "right",
            Handle::Top => "top",
            Handle::Bottom => "bottom",
        }
    }
}

/// Placed node. `x`/`y` is the center; `width`/`height` are the visual
/// (unpadded) bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub layer: Layer,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub is_root: bool,
    pub rank: Option<usize>,
}

impl NodeLayout {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn anchor(&self, handle: Handle) -> (f32, f32) {
        match handle {
            Handle::Left => (self.left(), self.y),
            Handle::Right => (self.right(), self.y),
            Handle::Top => (self.x, self.top()),
            Handle::Bottom => (self.x, self.bottom()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub id: String,
    pub source: String,
    pub target: String,
    pub layer: Layer,
    pub color: String,
    pub direction: EdgeDirection,
    pub source_handle: Handle,
    pub target_handle: Handle,
    pub points: Vec<(f32, f32)>,
}

/// One horizontal band of auxiliary nodes, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub layer: Layer,
    pub y: f32,
    pub min_gap: f32,
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    Upstream,
    Downstream,
}

impl ZoneKind {
    pub fn label(self) -> &'static str {
        match self {
            ZoneKind::Upstream => "Upstream",
            ZoneKind::Downstream => "Downstream",
        }
    }
}

/// Background band behind an external-node column.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneLayout {
    pub kind: ZoneKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    pub nodes: BTreeMap<String, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub rows: Vec<RowLayout>,
    pub zones: Vec<ZoneLayout>,
    pub bounds: Bounds,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Center of every node, keyed by id.
    pub fn positions(&self) -> BTreeMap<String, Position> {
        self.nodes
            .iter()
            .map(|(id, node)| (id.clone(), node.position()))
            .collect()
    }

    pub fn row(&self, layer: Layer) -> impl Iterator<Item = &RowLayout> {
        self.rows.iter().filter(move |row| row.layer == layer)
    }
}
