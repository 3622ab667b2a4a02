use crate::error::{Error, Result};

pub const DEFAULT_NODE_SPACING: f64 = 20.0;
pub const DEFAULT_LAYER_SPACING: f64 = 20.0;
pub const DEFAULT_THOROUGHNESS: u32 = 7;

/// A flat graph: one level of a hierarchy, laid out as a whole.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn validate(&self) -> Result<()> {
        for n in &self.nodes {
            let ok = n.width.is_finite() && n.height.is_finite() && n.width >= 0.0 && n.height >= 0.0;
            let ports_ok = n.ports.iter().all(|p| {
                p.width.is_finite() && p.height.is_finite() && p.width >= 0.0 && p.height >= 0.0
            });
            if !ok || !ports_ok {
                return Err(Error::InvalidSize {
                    node_id: n.id.clone(),
                });
            }
        }
        for e in &self.edges {
            for end in [e.source, e.target] {
                let Some(node) = self.nodes.get(end.node) else {
                    return Err(Error::MissingEndpoint {
                        edge_id: e.id.clone(),
                    });
                };
                if let Some(port) = end.port {
                    if port >= node.ports.len() {
                        return Err(Error::MissingPort {
                            edge_id: e.id.clone(),
                            port,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub ports: Vec<Port>,
}

impl Node {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            ports: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Port {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub side: PortSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortSide {
    North,
    East,
    South,
    West,
}

impl PortSide {
    /// The side facing the flow: outgoing ports face downstream, incoming ports upstream.
    pub fn for_flow(direction: Direction, outgoing: bool) -> Self {
        match (direction, outgoing) {
            (Direction::Right, true) | (Direction::Left, false) => PortSide::East,
            (Direction::Right, false) | (Direction::Left, true) => PortSide::West,
            (Direction::Down, true) | (Direction::Up, false) => PortSide::South,
            (Direction::Down, false) | (Direction::Up, true) => PortSide::North,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub node: usize,
    pub port: Option<usize>,
}

impl Endpoint {
    pub fn node(node: usize) -> Self {
        Self { node, port: None }
    }

    pub fn port(node: usize, port: usize) -> Self {
        Self {
            node,
            port: Some(port),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: String,
    pub source: Endpoint,
    pub target: Endpoint,
    /// Size of the edge's label, if it has one. Label gaps between layers grow to fit.
    pub label: Option<Size>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: Endpoint, target: Endpoint) -> Self {
        Self {
            id: id.into(),
            source,
            target,
            label: None,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source.node == self.target.node
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Right,
    Left,
    Down,
    Up,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::uniform(12.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub direction: Direction,
    pub node_spacing: f64,
    pub layer_spacing: f64,
    pub padding: Padding,
    /// Number of crossing-minimization rounds; `0` still runs one.
    pub thoroughness: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            direction: Direction::Right,
            node_spacing: DEFAULT_NODE_SPACING,
            layer_spacing: DEFAULT_LAYER_SPACING,
            padding: Padding::default(),
            thoroughness: DEFAULT_THOROUGHNESS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where a node ended up, relative to the top-left corner of the laid-out area.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePlacement {
    pub x: f64,
    pub y: f64,
    /// Port positions relative to the node's top-left corner, in port order.
    pub ports: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRoute {
    pub start: Point,
    pub bends: Vec<Point>,
    pub end: Point,
    /// Top-left corner of the edge label, when the edge has one.
    pub label: Option<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    /// Extent of the laid-out area, padding included.
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<NodePlacement>,
    pub edges: Vec<EdgeRoute>,
    /// Edge crossings between adjacent layers in the chosen ordering.
    pub crossings: usize,
}
