//! Layered engine: lays out each compound node with remora, innermost first.

mod hierarchy;
mod routes;

use crate::engine::LayoutEngine;
use crate::error::Result;
use crate::geometry::{Geometry, section_id};
use crate::inherit::{self, Effective};
use crate::labels::{self, LABEL_SPACING};
use crate::monitor::LayoutMonitor;
use crate::sizing;
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use narwhal_core::geom::{Point, Vector, point, size};
use narwhal_core::{
    Algorithm, EdgeId, EdgeSection, Graph, NodeId, PortLabelPlacement, ShapeRef,
};
use remora::PortSide;
use rustc_hash::{FxHashMap, FxHashSet};

pub(crate) fn flow_direction(direction: narwhal_core::Direction) -> remora::Direction {
    match direction {
        narwhal_core::Direction::Right => remora::Direction::Right,
        narwhal_core::Direction::Left => remora::Direction::Left,
        narwhal_core::Direction::Down => remora::Direction::Down,
        narwhal_core::Direction::Up => remora::Direction::Up,
    }
}

/// A route computed while laying out `level`, relative to the level's top-left corner.
struct LevelRoute {
    level: NodeId,
    edge: EdgeId,
    pair: usize,
    route: remora::EdgeRoute,
}

/// State shared by all levels of one layout run.
struct Run<'a> {
    graph: &'a Graph,
    effective: Vec<Effective>,
    sides: Vec<PortSide>,
    geo: Geometry,
    routes: Vec<LevelRoute>,
}

pub struct LayeredEngine {
    measurer: Box<dyn TextMeasurer>,
}

impl Default for LayeredEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayeredEngine {
    pub fn new() -> Self {
        Self::with_measurer(DeterministicTextMeasurer::default())
    }

    /// Uses `measurer` for labels that come without a size.
    pub fn with_measurer(measurer: impl TextMeasurer + 'static) -> Self {
        Self {
            measurer: Box::new(measurer),
        }
    }

    fn compute(&self, graph: &Graph, monitor: &LayoutMonitor) -> Result<Geometry> {
        check_endpoints(graph)?;

        let mut geo = Geometry::capture(graph);
        for sections in &mut geo.sections {
            sections.clear();
        }
        labels::measure(graph, &mut geo, self.measurer.as_ref());
        let effective = inherit::resolve(graph);
        let sides = hierarchy::port_sides(graph, &effective);
        let mut run = Run {
            graph,
            effective,
            sides,
            geo,
            routes: Vec::new(),
        };

        // Reversed pre-order puts every node after all of its descendants.
        let mut order = graph.subtree(graph.root());
        order.reverse();
        for node in order {
            monitor.check()?;
            run.level(node, monitor)?;
        }
        monitor.check()?;

        run.place_root_ports();
        run.place_port_labels();
        run.finish_edges();
        Ok(run.geo)
    }
}

impl LayoutEngine for LayeredEngine {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Layered
    }

    fn layout(&self, graph: &mut Graph, monitor: &LayoutMonitor) -> Result<()> {
        let geo = self.compute(graph, monitor)?;
        geo.apply(graph);
        Ok(())
    }
}

/// Every edge end must name a shape of this graph.
pub(crate) fn check_endpoints(graph: &Graph) -> Result<()> {
    for (_, edge) in graph.edges() {
        for &shape in edge.sources().iter().chain(edge.targets()) {
            if graph.shape_node(shape).is_none() {
                let (kind, index) = match shape {
                    ShapeRef::Node(n) => (NodeId::KIND, n.index()),
                    ShapeRef::Port(p) => (narwhal_core::PortId::KIND, p.index()),
                };
                return Err(narwhal_core::Error::UnknownElement { kind, index }.into());
            }
        }
    }
    Ok(())
}

impl Run<'_> {
    fn level(&mut self, node: NodeId, monitor: &LayoutMonitor) -> Result<()> {
        let graph = self.graph;
        let Some(data) = graph.node(node) else {
            return Ok(());
        };
        let children = data.children();
        if children.is_empty() {
            let s = sizing::node_size(graph, &self.geo, node, None, &self.sides);
            self.geo.nodes[node.index()].size = s;
            labels::place_node_labels(graph, &mut self.geo, node, LABEL_SPACING);
            return Ok(());
        }

        let eff = inherit::get(&self.effective, node);
        let index_of: FxHashMap<NodeId, usize> =
            children.iter().enumerate().map(|(i, &c)| (c, i)).collect();

        let mut flat = remora::Graph::default();
        for &c in children {
            let Some(child) = graph.node(c) else {
                continue;
            };
            let s = self.geo.node(c).size;
            let mut n = remora::Node::new(child.identifier(), s.width, s.height);
            for &p in child.ports() {
                let ps = self.geo.port(p).size;
                n.ports.push(remora::Port {
                    id: graph.port(p).map(|p| p.identifier().to_string()).unwrap_or_default(),
                    width: ps.width,
                    height: ps.height,
                    side: self.sides.get(p.index()).copied().unwrap_or(PortSide::West),
                });
            }
            flat.nodes.push(n);
        }

        let projected = hierarchy::project(graph, node, eff.hierarchy, &index_of);
        for pr in &projected {
            let Some(edge) = graph.edge(pr.edge) else {
                continue;
            };
            let mut e = remora::Edge::new(
                format!("{}#{}", edge.identifier(), pr.pair),
                pr.source,
                pr.target,
            );
            if pr.direct && pr.pair == 0 && !edge.labels().is_empty() {
                let s = labels::stack(&self.geo, edge.labels());
                e.label = Some(remora::Size::new(s.width, s.height));
            }
            flat.edges.push(e);
        }

        let pad = eff.padding;
        let reserve = labels::top_reserve(graph, &self.geo, node);
        let options = remora::Options {
            direction: flow_direction(eff.direction),
            node_spacing: eff.node_spacing,
            layer_spacing: eff.layer_spacing,
            padding: remora::Padding {
                top: pad.top + reserve,
                left: pad.left,
                bottom: pad.bottom,
                right: pad.right,
            },
            thoroughness: eff.thoroughness,
        };
        let result =
            remora::layout_with(&flat, &options, monitor).map_err(|e| monitor.engine_error(e))?;

        for (i, &c) in children.iter().enumerate() {
            let Some(placed) = result.nodes.get(i) else {
                continue;
            };
            self.geo.nodes[c.index()].origin = point(placed.x, placed.y);
            let ports = graph.node(c).map(|n| n.ports()).unwrap_or_default();
            for (k, &p) in ports.iter().enumerate() {
                if let Some(at) = placed.ports.get(k) {
                    self.geo.ports[p.index()].origin = point(at.x, at.y);
                }
            }
        }
        for (pr, route) in projected.iter().zip(result.edges) {
            if pr.direct {
                self.routes.push(LevelRoute {
                    level: node,
                    edge: pr.edge,
                    pair: pr.pair,
                    route,
                });
            }
        }

        let content = size(result.width, result.height);
        let s = sizing::node_size(graph, &self.geo, node, Some(content), &self.sides);
        self.geo.nodes[node.index()].size = s;
        labels::place_node_labels(graph, &mut self.geo, node, pad.top);

        tracing::trace!(
            node = %data.identifier(),
            children = children.len(),
            edges = projected.len(),
            crossings = result.crossings,
            "level laid out"
        );
        Ok(())
    }

    /// The root is never placed by a parent level, so its ports are spread here.
    fn place_root_ports(&mut self) {
        let graph = self.graph;
        let root = graph.root();
        let Some(data) = graph.node(root) else {
            return;
        };
        if data.ports().is_empty() {
            return;
        }
        let s = self.geo.node(root).size;
        let mut n = remora::Node::new(data.identifier(), s.width, s.height);
        for &p in data.ports() {
            let ps = self.geo.port(p).size;
            n.ports.push(remora::Port {
                id: String::new(),
                width: ps.width,
                height: ps.height,
                side: self.sides.get(p.index()).copied().unwrap_or(PortSide::West),
            });
        }
        for (&p, at) in data.ports().iter().zip(remora::ports::distribute(&n)) {
            self.geo.ports[p.index()].origin = point(at.x, at.y);
        }
    }

    fn place_port_labels(&mut self) {
        let graph = self.graph;
        for (id, port) in graph.ports() {
            let options = graph.node(port.node()).map(|n| &n.options);
            let placement = options
                .and_then(|o| o.port_label_placement)
                .unwrap_or(PortLabelPlacement::Outside);
            let next_to_port = options
                .and_then(|o| o.port_labels_next_to_port)
                .unwrap_or(false);
            let side = self.sides.get(id.index()).copied().unwrap_or(PortSide::West);
            labels::place_port_labels(graph, &mut self.geo, id, side, placement, next_to_port);
        }
    }

    /// Turns level routes into sections and routes every remaining edge pair.
    fn finish_edges(&mut self) {
        let graph = self.graph;
        let mut sections: Vec<Vec<(usize, EdgeSection)>> = vec![Vec::new(); graph.edge_count()];
        let mut covered: FxHashSet<(EdgeId, usize)> = FxHashSet::default();
        let mut labelled: FxHashSet<EdgeId> = FxHashSet::default();

        for lr in std::mem::take(&mut self.routes) {
            let Some(edge) = graph.edge(lr.edge) else {
                continue;
            };
            let offset: Vector = self.geo.absolute(graph, lr.level)
                - self.geo.absolute(graph, edge.container());
            let at = |p: remora::Point| point(p.x, p.y) + offset;
            let (incoming, outgoing) = pair_shapes(edge.sources(), edge.targets(), lr.pair);
            sections[lr.edge.index()].push((
                lr.pair,
                EdgeSection {
                    id: section_id(edge.identifier(), lr.pair),
                    start: at(lr.route.start),
                    end: at(lr.route.end),
                    bend_points: lr.route.bends.iter().map(|&b| at(b)).collect(),
                    incoming_shape: incoming,
                    outgoing_shape: outgoing,
                },
            ));
            covered.insert((lr.edge, lr.pair));
            if let Some(origin) = lr.route.label {
                let stack = labels::stack(&self.geo, edge.labels());
                let mut y = origin.y;
                for &l in edge.labels() {
                    let ls = self.geo.label(l).size;
                    // Each label is centred within the slot reserved for the whole stack.
                    let x = origin.x + (stack.width - ls.width) / 2.0;
                    self.geo.labels[l.index()].origin = point(x, y) + offset;
                    y += ls.height + LABEL_SPACING;
                }
                labelled.insert(lr.edge);
            }
        }

        for (id, edge) in graph.edges() {
            let container_origin = self.geo.absolute(graph, edge.container());
            let direction =
                flow_direction(inherit::get(&self.effective, edge.container()).direction);
            let targets = edge.targets();
            let mut first_route: Option<Vec<Point>> = None;
            for (si, &source) in edge.sources().iter().enumerate() {
                for (ti, &target) in targets.iter().enumerate() {
                    let pair = si * targets.len() + ti;
                    if covered.contains(&(id, pair)) {
                        continue;
                    }
                    let Some(points) = self.free_route(source, target, direction) else {
                        continue;
                    };
                    let local: Vec<Point> = points
                        .iter()
                        .map(|&p| p - container_origin.to_vector())
                        .collect();
                    if first_route.is_none() {
                        first_route = Some(points);
                    }
                    let (Some(&start), Some(&end)) = (local.first(), local.last()) else {
                        continue;
                    };
                    sections[id.index()].push((
                        pair,
                        EdgeSection {
                            id: section_id(edge.identifier(), pair),
                            start,
                            end,
                            bend_points: local[1..local.len() - 1].to_vec(),
                            incoming_shape: Some(source),
                            outgoing_shape: Some(target),
                        },
                    ));
                }
            }

            if labelled.contains(&id) || edge.labels().is_empty() {
                continue;
            }
            let Some(mid) = first_route.as_deref().and_then(routes::halfway) else {
                continue;
            };
            let sizes: Vec<_> = edge.labels().iter().map(|&l| self.geo.label(l).size).collect();
            for (&l, origin) in edge
                .labels()
                .iter()
                .zip(routes::stacked_label_origins(mid, &sizes))
            {
                self.geo.labels[l.index()].origin = origin - container_origin.to_vector();
            }
        }

        for (i, mut list) in sections.into_iter().enumerate() {
            list.sort_by_key(|(pair, _)| *pair);
            if let Some(slot) = self.geo.sections.get_mut(i) {
                *slot = list.into_iter().map(|(_, s)| s).collect();
            }
        }
    }

    /// A route in root coordinates between two shapes that no level routed.
    fn free_route(
        &self,
        source: ShapeRef,
        target: ShapeRef,
        direction: remora::Direction,
    ) -> Option<Vec<Point>> {
        let graph = self.graph;
        let start = routes::anchor(graph, &self.geo, &self.sides, source, direction, true)?;
        let end = routes::anchor(graph, &self.geo, &self.sides, target, direction, false)?;
        let owner = graph.shape_node(source)?;
        if owner == graph.shape_node(target)? {
            let node = self.geo.absolute_shape(graph, ShapeRef::Node(owner))?;
            let port_anchor = |shape: ShapeRef, at: Point| match shape {
                ShapeRef::Port(_) => Some(at),
                ShapeRef::Node(_) => None,
            };
            return Some(routes::self_loop(
                &node,
                port_anchor(source, start),
                port_anchor(target, end),
            ));
        }
        Some(routes::orthogonal(start, end, direction))
    }
}

fn pair_shapes(
    sources: &[ShapeRef],
    targets: &[ShapeRef],
    pair: usize,
) -> (Option<ShapeRef>, Option<ShapeRef>) {
    if targets.is_empty() {
        return (None, None);
    }
    let si = pair / targets.len();
    let ti = pair % targets.len();
    (sources.get(si).copied(), targets.get(ti).copied())
}
