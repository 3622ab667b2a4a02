#![forbid(unsafe_code)]

//! Headless layered layout for flat graphs with ports.
//!
//! The pipeline follows the classic Sugiyama scheme:
//!
//! 1. cycle breaking (DFS back edges are reversed)
//! 2. longest-path layering, with dummy vertices splitting long edges
//! 3. barycenter crossing minimization
//! 4. coordinate assignment in flow coordinates, then mapping to the requested [`Direction`]
//! 5. orthogonal edge routing
//!
//! Hierarchy is the caller's business: lay out the innermost level first and feed the resulting
//! sizes into the enclosing level.

mod acyclic;
pub mod error;
pub mod graph;
mod order;
pub mod ports;
mod position;
mod rank;
mod route;

pub use error::{Error, Result};
pub use graph::{
    Direction, Edge, EdgeRoute, Endpoint, Graph, LayoutResult, Node, NodePlacement, Options,
    Padding, Point, Port, PortSide, Rect, Size,
};

use position::Frame;
use std::sync::atomic::{AtomicBool, Ordering};

/// Distance between an edge label and its edge.
pub const LABEL_SPACING: f64 = 5.0;
/// How far a self-loop reaches out of its node.
pub const SELF_LOOP_SIZE: f64 = 10.0;

/// Polled between phases and crossing-minimization rounds; returning `true` aborts the layout.
pub trait Interrupt {
    fn interrupted(&self) -> bool;
}

impl Interrupt for () {
    fn interrupted(&self) -> bool {
        false
    }
}

impl Interrupt for AtomicBool {
    fn interrupted(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

fn check(interrupt: &dyn Interrupt, phase: &'static str) -> Result<()> {
    if interrupt.interrupted() {
        return Err(Error::Interrupted { phase });
    }
    Ok(())
}

/// Headless layout entry point.
pub fn layout(graph: &Graph, options: &Options) -> Result<LayoutResult> {
    layout_with(graph, options, &())
}

pub fn layout_with(
    graph: &Graph,
    options: &Options,
    interrupt: &dyn Interrupt,
) -> Result<LayoutResult> {
    graph.validate()?;
    check(interrupt, "cycle breaking")?;

    let node_count = graph.nodes.len();
    let layered: Vec<usize> = (0..graph.edges.len())
        .filter(|i| !graph.edges[*i].is_self_loop())
        .collect();
    let pairs: Vec<(usize, usize)> = layered
        .iter()
        .map(|i| (graph.edges[*i].source.node, graph.edges[*i].target.node))
        .collect();
    let reversed = acyclic::reversed_edges(node_count, &pairs);
    let dag: Vec<(usize, usize)> = pairs
        .iter()
        .zip(&reversed)
        .map(|(&(u, v), &r)| if r { (v, u) } else { (u, v) })
        .collect();

    check(interrupt, "layering")?;
    let rank = rank::longest_path(node_count, &dag);
    let mut layer_of = rank.clone();
    let mut segments: Vec<(usize, usize)> = Vec::new();
    let mut chains: Vec<Vec<usize>> = Vec::with_capacity(dag.len());
    for &(u, v) in &dag {
        let mut chain = vec![u];
        let mut prev = u;
        for layer in rank[u] + 1..rank[v] {
            let dummy = layer_of.len();
            layer_of.push(layer);
            segments.push((prev, dummy));
            chain.push(dummy);
            prev = dummy;
        }
        segments.push((prev, v));
        chain.push(v);
        chains.push(chain);
    }
    let mut lg = order::LayerGraph::new(layer_of, &segments);
    let crossings = order::minimize_crossings(&mut lg, options.thoroughness, interrupt)?;

    check(interrupt, "placement")?;
    let direction = options.direction;
    let probe = Frame::new(direction, 0.0, Point::default());
    let margins: Vec<ports::Margins> = graph.nodes.iter().map(ports::margins).collect();
    let mut extents = vec![(0.0, 0.0); lg.layer_of.len()];
    for (i, node) in graph.nodes.iter().enumerate() {
        let m = margins[i];
        extents[i] = probe.flow_size(m.left + node.width + m.right, m.top + node.height + m.bottom);
    }
    let mut gaps = vec![options.layer_spacing; lg.layers.len().saturating_sub(1)];
    for (k, &e) in layered.iter().enumerate() {
        let Some(label) = graph.edges[e].label else {
            continue;
        };
        let tail_layer = lg.layer_of[chains[k][0]];
        if let Some(gap) = gaps.get_mut(tail_layer) {
            let (label_along, _) = probe.flow_size(label.width, label.height);
            *gap = gap.max(label_along + 2.0 * LABEL_SPACING);
        }
    }
    let placement = position::place(&lg, &extents, &gaps, options.node_spacing);
    let pad = options.padding;
    let frame = Frame::new(
        direction,
        placement.total_along,
        Point::new(pad.left, pad.top),
    );

    let mut boxes: Vec<Rect> = Vec::with_capacity(node_count);
    let mut nodes: Vec<NodePlacement> = Vec::with_capacity(node_count);
    for (i, node) in graph.nodes.iter().enumerate() {
        let (len_along, len_across) = extents[i];
        let outer = frame.rect(
            placement.along[i],
            placement.across[i],
            len_along,
            len_across,
        );
        let x = outer.x + margins[i].left;
        let y = outer.y + margins[i].top;
        boxes.push(Rect {
            x,
            y,
            width: node.width,
            height: node.height,
        });
        nodes.push(NodePlacement {
            x,
            y,
            ports: ports::distribute(node),
        });
    }

    check(interrupt, "edge routing")?;
    let attach = |end: Endpoint, outgoing: bool| -> Point {
        let b = boxes[end.node];
        match end.port {
            Some(p) => {
                let port = &graph.nodes[end.node].ports[p];
                let a = ports::anchor(port, nodes[end.node].ports[p]);
                Point::new(b.x + a.x, b.y + a.y)
            }
            None => route::side_midpoint(&b, PortSide::for_flow(direction, outgoing)),
        }
    };

    let mut routes: Vec<Option<EdgeRoute>> = vec![None; graph.edges.len()];
    let mut label_reach = 0.0_f64;
    for (k, &e) in layered.iter().enumerate() {
        let edge = &graph.edges[e];
        let (tail, head) = if reversed[k] {
            (edge.target, edge.source)
        } else {
            (edge.source, edge.target)
        };
        let start = frame.to_flow(attach(tail, true));
        let end = frame.to_flow(attach(head, false));
        let chain = &chains[k];
        let through: Vec<(f64, f64)> = chain[1..chain.len() - 1]
            .iter()
            .map(|d| (placement.along[*d], placement.across[*d]))
            .collect();
        let first_layer = lg.layer_of[chain[0]];
        let mids: Vec<f64> = (0..chain.len() - 1)
            .map(|hop| placement.gap_mid(first_layer + hop))
            .collect();
        let mut bends: Vec<Point> = route::orthogonal_bends(start, &through, end, &mids)
            .into_iter()
            .map(|(a, c)| frame.point(a, c))
            .collect();
        let mut start_xy = frame.point(start.0, start.1);
        let mut end_xy = frame.point(end.0, end.1);
        if reversed[k] {
            bends.reverse();
            std::mem::swap(&mut start_xy, &mut end_xy);
        }

        let label = edge.label.map(|size| {
            let (len_along, len_across) = probe.flow_size(size.width, size.height);
            let mut across = start.1 - len_across - LABEL_SPACING;
            if across < 0.0 {
                across = start.1 + LABEL_SPACING;
            }
            label_reach = label_reach.max(across + len_across);
            let mid = placement.gap_mid(first_layer);
            let r = frame.rect(mid - len_along / 2.0, across, len_along, len_across);
            Point::new(r.x, r.y)
        });

        routes[e] = Some(EdgeRoute {
            start: start_xy,
            bends,
            end: end_xy,
            label,
        });
    }

    for (e, edge) in graph.edges.iter().enumerate() {
        if !edge.is_self_loop() {
            continue;
        }
        let node = boxes[edge.source.node];
        let start = match edge.source.port {
            Some(_) => attach(edge.source, true),
            None => route::side_midpoint(&node, PortSide::East),
        };
        let end = match edge.target.port {
            Some(_) => attach(edge.target, false),
            None => route::side_midpoint(&node, PortSide::North),
        };
        let bends = route::self_loop(start, end, &node, SELF_LOOP_SIZE);
        let label = edge.label.map(|_| {
            let corner = bends.get(1).copied().unwrap_or(start);
            Point::new(corner.x + LABEL_SPACING, corner.y)
        });
        routes[e] = Some(EdgeRoute {
            start,
            bends,
            end,
            label,
        });
    }

    let total_across = placement.total_across.max(label_reach);
    let (content_w, content_h) = if direction.is_horizontal() {
        (placement.total_along, total_across)
    } else {
        (total_across, placement.total_along)
    };

    tracing::debug!(
        nodes = node_count,
        edges = graph.edges.len(),
        layers = lg.layers.len(),
        crossings,
        "layered layout finished"
    );

    Ok(LayoutResult {
        width: content_w + pad.left + pad.right,
        height: content_h + pad.top + pad.bottom,
        nodes,
        edges: routes.into_iter().flatten().collect(),
        crossings,
    })
}
