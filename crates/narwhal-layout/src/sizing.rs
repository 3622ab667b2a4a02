//! Node size constraints.

use crate::geometry::Geometry;
use crate::labels::{self, LABEL_SPACING};
use narwhal_core::geom::{Size, size};
use narwhal_core::{Graph, NodeId, PortLabelPlacement};
use remora::PortSide;
use remora::ports::required_side_length;

/// Gap between neighbouring ports and between a port and a corner.
pub const PORT_SPACING: f64 = 10.0;
/// Starting size of a node without children whose size is derived.
pub const EMPTY_NODE_SIZE: f64 = 20.0;

/// Final size of `node`.
///
/// `content` is the laid-out extent of the node's children, padding included, or `None` for a
/// node without children. `port_sides` is indexed by port index.
pub(crate) fn node_size(
    graph: &Graph,
    geo: &Geometry,
    node: NodeId,
    content: Option<Size>,
    port_sides: &[PortSide],
) -> Size {
    let Some(data) = graph.node(node) else {
        return size(0.0, 0.0);
    };
    let options = &data.options;
    let constraints = options.size_constraints.unwrap_or_default();
    let given = geo.node(node).size;

    let mut out = if constraints.is_fixed() && (given.width > 0.0 || given.height > 0.0) {
        given
    } else {
        let mut out = content.unwrap_or(size(EMPTY_NODE_SIZE, EMPTY_NODE_SIZE));
        out = out.max(labels::inside_extent(graph, geo, node));

        if constraints.node_labels {
            let s = labels::stack(geo, data.labels());
            if s.width > 0.0 || s.height > 0.0 {
                out = out.max(size(
                    s.width + 2.0 * LABEL_SPACING,
                    s.height + 2.0 * LABEL_SPACING,
                ));
            }
        }

        if constraints.ports {
            out = out.max(port_extent(graph, geo, node, port_sides));
        }

        let inside_port_labels =
            options.port_label_placement.unwrap_or_default() == PortLabelPlacement::Inside;
        if constraints.port_labels && inside_port_labels {
            out = out.max(labels::inside_port_label_extent(graph, geo, node, port_sides));
        }
        out
    };

    if let Some(minimum) = options.minimum_size {
        out = out.max(minimum);
    }
    out
}

/// Room needed to spread the node's ports along each side.
fn port_extent(graph: &Graph, geo: &Geometry, node: NodeId, port_sides: &[PortSide]) -> Size {
    let Some(data) = graph.node(node) else {
        return size(0.0, 0.0);
    };
    let mut count = [0usize; 4];
    let mut extent = [0.0_f64; 4];
    for &p in data.ports() {
        let side = port_sides.get(p.index()).copied().unwrap_or(PortSide::West);
        let s = geo.port(p).size;
        let (slot, along) = match side {
            PortSide::North => (0, s.width),
            PortSide::South => (1, s.width),
            PortSide::East => (2, s.height),
            PortSide::West => (3, s.height),
        };
        count[slot] += 1;
        extent[slot] = extent[slot].max(along);
    }
    let side = |slot: usize| required_side_length(count[slot], extent[slot], PORT_SPACING);
    size(side(0).max(side(1)), side(2).max(side(3)))
}
