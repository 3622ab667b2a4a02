//! Scratch geometry.
//!
//! Engines compute into a [`Geometry`] captured from the graph and write it back in one step
//! once they have succeeded, so a failed layout never leaves half-updated coordinates behind.

use narwhal_core::geom::{Point, Rect, point};
use narwhal_core::{EdgeId, EdgeSection, Graph, LabelId, NodeId, PortId, ShapeRef};

#[derive(Debug, Clone)]
pub(crate) struct Geometry {
    pub nodes: Vec<Rect>,
    pub ports: Vec<Rect>,
    pub labels: Vec<Rect>,
    pub sections: Vec<Vec<EdgeSection>>,
}

impl Geometry {
    pub fn capture(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes().map(|(_, n)| n.bounds).collect(),
            ports: graph.ports().map(|(_, p)| p.bounds).collect(),
            labels: graph.labels().map(|(_, l)| l.bounds).collect(),
            sections: graph.edges().map(|(_, e)| e.sections.clone()).collect(),
        }
    }

    pub fn apply(self, graph: &mut Graph) {
        for (i, bounds) in self.nodes.into_iter().enumerate() {
            if let Some(n) = graph.node_mut(NodeId::from_index(i)) {
                n.bounds = bounds;
            }
        }
        for (i, bounds) in self.ports.into_iter().enumerate() {
            if let Some(p) = graph.port_mut(PortId::from_index(i)) {
                p.bounds = bounds;
            }
        }
        for (i, bounds) in self.labels.into_iter().enumerate() {
            if let Some(l) = graph.label_mut(LabelId::from_index(i)) {
                l.bounds = bounds;
            }
        }
        for (i, sections) in self.sections.into_iter().enumerate() {
            if let Some(e) = graph.edge_mut(EdgeId::from_index(i)) {
                e.sections = sections;
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Rect {
        self.nodes.get(id.index()).copied().unwrap_or_default()
    }

    pub fn port(&self, id: PortId) -> Rect {
        self.ports.get(id.index()).copied().unwrap_or_default()
    }

    pub fn label(&self, id: LabelId) -> Rect {
        self.labels.get(id.index()).copied().unwrap_or_default()
    }

    /// Top-left corner of `node` in root coordinates.
    pub fn absolute(&self, graph: &Graph, node: NodeId) -> Point {
        let mut out = point(0.0, 0.0);
        let mut cur = Some(node);
        while let Some(n) = cur {
            let Some(data) = graph.node(n) else {
                break;
            };
            let Some(parent) = data.parent() else {
                break;
            };
            out += self.node(n).origin.to_vector();
            cur = Some(parent);
        }
        out
    }

    /// Bounds of a node or port in root coordinates.
    pub fn absolute_shape(&self, graph: &Graph, shape: ShapeRef) -> Option<Rect> {
        match shape {
            ShapeRef::Node(n) => {
                graph.node(n)?;
                let r = self.node(n);
                Some(Rect::new(self.absolute(graph, n), r.size))
            }
            ShapeRef::Port(p) => {
                let owner = graph.port(p)?.node();
                let r = self.port(p);
                Some(Rect::new(self.absolute(graph, owner) + r.origin.to_vector(), r.size))
            }
        }
    }
}

/// Identifier of the section routing the `pair`-th (source, target) combination of an edge.
pub(crate) fn section_id(edge: &str, pair: usize) -> String {
    format!("{edge}_s{pair}")
}
