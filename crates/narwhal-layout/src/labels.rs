//! Label measurement and placement for nodes and ports.

use crate::geometry::Geometry;
use crate::text::{TextMeasurer, TextStyle};
use narwhal_core::geom::{Size, point, size};
use narwhal_core::options::{HorizontalPlacement, LabelSide, VerticalPlacement};
use narwhal_core::{Graph, LabelId, NodeId, NodeLabelPlacement, PortId, PortLabelPlacement};
use remora::PortSide;

/// Gap between a label and whatever it is placed against.
pub const LABEL_SPACING: f64 = 5.0;

/// Gives every label without a size the size of its text.
pub(crate) fn measure(graph: &Graph, geo: &mut Geometry, measurer: &dyn TextMeasurer) {
    let style = TextStyle::default();
    for (id, label) in graph.labels() {
        let Some(bounds) = geo.labels.get_mut(id.index()) else {
            continue;
        };
        if bounds.size.width != 0.0 || bounds.size.height != 0.0 {
            continue;
        }
        let metrics = measurer.measure(&label.text, &style);
        bounds.size = size(metrics.width, metrics.height);
    }
}

/// Size of `labels` stacked vertically with [`LABEL_SPACING`] between them.
pub(crate) fn stack(geo: &Geometry, labels: &[LabelId]) -> Size {
    let mut out = size(0.0, 0.0);
    for (i, &l) in labels.iter().enumerate() {
        let s = geo.label(l).size;
        out.width = out.width.max(s.width);
        out.height += s.height;
        if i > 0 {
            out.height += LABEL_SPACING;
        }
    }
    out
}

fn node_placement(graph: &Graph, node: NodeId) -> NodeLabelPlacement {
    graph
        .node(node)
        .and_then(|n| n.options.node_label_placement)
        .unwrap_or_default()
}

fn resolved(p: NodeLabelPlacement) -> (HorizontalPlacement, VerticalPlacement, LabelSide) {
    (
        p.horizontal.unwrap_or(HorizontalPlacement::Center),
        p.vertical.unwrap_or(VerticalPlacement::Top),
        p.side.unwrap_or(LabelSide::Inside),
    )
}

/// Vertical room inside-top labels take away from a node's content area.
pub(crate) fn top_reserve(graph: &Graph, geo: &Geometry, node: NodeId) -> f64 {
    let placement = node_placement(graph, node);
    if placement.is_fixed() {
        return 0.0;
    }
    let labels = match graph.node(node) {
        Some(n) if !n.labels().is_empty() => n.labels(),
        _ => return 0.0,
    };
    match resolved(placement) {
        (_, VerticalPlacement::Top, LabelSide::Inside) => stack(geo, labels).height + LABEL_SPACING,
        _ => 0.0,
    }
}

/// Room inside labels need in a node with no content: the label stack plus spacing on all
/// sides.
pub(crate) fn inside_extent(graph: &Graph, geo: &Geometry, node: NodeId) -> Size {
    let placement = node_placement(graph, node);
    let labels = match graph.node(node) {
        Some(n) if !n.labels().is_empty() => n.labels(),
        _ => return size(0.0, 0.0),
    };
    if placement.is_fixed() || resolved(placement).2 == LabelSide::Outside {
        return size(0.0, 0.0);
    }
    let s = stack(geo, labels);
    size(s.width + 2.0 * LABEL_SPACING, s.height + 2.0 * LABEL_SPACING)
}

/// Positions a node's labels relative to the node, which must already be sized.
///
/// `padding_top` is where inside-top labels start: the node's top padding when it has children,
/// [`LABEL_SPACING`] otherwise.
pub(crate) fn place_node_labels(graph: &Graph, geo: &mut Geometry, node: NodeId, padding_top: f64) {
    let placement = node_placement(graph, node);
    if placement.is_fixed() {
        return;
    }
    let Some(data) = graph.node(node) else {
        return;
    };
    let labels = data.labels();
    if labels.is_empty() {
        return;
    }
    let (h, v, side) = resolved(placement);
    let node_size = geo.node(node).size;
    let total = stack(geo, labels);

    let top = match (side, v) {
        (LabelSide::Inside, VerticalPlacement::Top) => padding_top,
        (LabelSide::Inside, VerticalPlacement::Center) => (node_size.height - total.height) / 2.0,
        (LabelSide::Inside, VerticalPlacement::Bottom) => {
            node_size.height - total.height - LABEL_SPACING
        }
        (LabelSide::Outside, VerticalPlacement::Top) => -total.height - LABEL_SPACING,
        (LabelSide::Outside, VerticalPlacement::Center) => (node_size.height - total.height) / 2.0,
        (LabelSide::Outside, VerticalPlacement::Bottom) => node_size.height + LABEL_SPACING,
    };

    let mut y = top;
    for &l in labels {
        let s = geo.label(l).size;
        let x = match (side, h, v) {
            (LabelSide::Outside, HorizontalPlacement::Left, VerticalPlacement::Center) => {
                -s.width - LABEL_SPACING
            }
            (LabelSide::Outside, HorizontalPlacement::Right, VerticalPlacement::Center) => {
                node_size.width + LABEL_SPACING
            }
            (_, HorizontalPlacement::Left, _) => LABEL_SPACING,
            (_, HorizontalPlacement::Center, _) => (node_size.width - s.width) / 2.0,
            (_, HorizontalPlacement::Right, _) => node_size.width - s.width - LABEL_SPACING,
        };
        if let Some(b) = geo.labels.get_mut(l.index()) {
            b.origin = point(x, y);
        }
        y += s.height + LABEL_SPACING;
    }
}

/// Positions the labels of `port`, relative to the port.
pub(crate) fn place_port_labels(
    graph: &Graph,
    geo: &mut Geometry,
    port: PortId,
    side: PortSide,
    placement: PortLabelPlacement,
    next_to_port: bool,
) {
    if placement == PortLabelPlacement::Fixed {
        return;
    }
    let Some(data) = graph.port(port) else {
        return;
    };
    let ps = geo.port(port).size;
    let mut offset = 0.0;
    for &l in data.labels() {
        let ls = geo.label(l).size;
        let s = LABEL_SPACING;
        let (x, y) = match (placement, side, next_to_port) {
            (PortLabelPlacement::Inside, PortSide::West, true) => {
                (ps.width + s, (ps.height - ls.height) / 2.0)
            }
            (PortLabelPlacement::Inside, PortSide::West, false) => (ps.width + s, ps.height),
            (PortLabelPlacement::Inside, PortSide::East, true) => {
                (-ls.width - s, (ps.height - ls.height) / 2.0)
            }
            (PortLabelPlacement::Inside, PortSide::East, false) => (-ls.width - s, ps.height),
            (PortLabelPlacement::Inside, PortSide::North, true) => {
                ((ps.width - ls.width) / 2.0, ps.height + s)
            }
            (PortLabelPlacement::Inside, PortSide::North, false) => (ps.width + s, ps.height + s),
            (PortLabelPlacement::Inside, PortSide::South, true) => {
                ((ps.width - ls.width) / 2.0, -ls.height - s)
            }
            (PortLabelPlacement::Inside, PortSide::South, false) => {
                (ps.width + s, -ls.height - s)
            }
            (_, PortSide::West, true) => (-ls.width - s, (ps.height - ls.height) / 2.0),
            (_, PortSide::West, false) => (-ls.width, -ls.height - s),
            (_, PortSide::East, true) => (ps.width + s, (ps.height - ls.height) / 2.0),
            (_, PortSide::East, false) => (ps.width, -ls.height - s),
            (_, PortSide::North, true) => ((ps.width - ls.width) / 2.0, -ls.height - s),
            (_, PortSide::North, false) => (ps.width + s, -ls.height),
            (_, PortSide::South, true) => ((ps.width - ls.width) / 2.0, ps.height + s),
            (_, PortSide::South, false) => (ps.width + s, ps.height),
        };
        if let Some(b) = geo.labels.get_mut(l.index()) {
            b.origin = point(x, y + offset);
        }
        offset += ls.height + s;
    }
}

/// Room inside a node that its inside port labels need, across each pair of opposite sides.
pub(crate) fn inside_port_label_extent(
    graph: &Graph,
    geo: &Geometry,
    node: NodeId,
    sides: &[PortSide],
) -> Size {
    let Some(data) = graph.node(node) else {
        return size(0.0, 0.0);
    };
    let mut widest = [0.0_f64; 4];
    let mut tallest = [0.0_f64; 4];
    for &p in data.ports() {
        let Some(port) = graph.port(p) else {
            continue;
        };
        let s = stack(geo, port.labels());
        let side = sides.get(p.index()).copied().unwrap_or(PortSide::West);
        let slot = side_slot(side);
        widest[slot] = widest[slot].max(s.width);
        tallest[slot] = tallest[slot].max(s.height);
    }
    let n = side_slot(PortSide::North);
    let e = side_slot(PortSide::East);
    let so = side_slot(PortSide::South);
    let w = side_slot(PortSide::West);
    let width = if widest[w] + widest[e] > 0.0 {
        widest[w] + widest[e] + 3.0 * LABEL_SPACING
    } else {
        0.0
    };
    let height = if tallest[n] + tallest[so] > 0.0 {
        tallest[n] + tallest[so] + 3.0 * LABEL_SPACING
    } else {
        0.0
    };
    size(width, height)
}

fn side_slot(side: PortSide) -> usize {
    match side {
        PortSide::North => 0,
        PortSide::East => 1,
        PortSide::South => 2,
        PortSide::West => 3,
    }
}
