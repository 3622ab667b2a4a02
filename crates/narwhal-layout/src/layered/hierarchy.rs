//! Which edges take part in laying out one level of the hierarchy.

use super::flow_direction;
use crate::inherit::{self, Effective};
use narwhal_core::{EdgeId, Graph, HierarchyHandling, NodeId, ShapeRef};
use remora::{Endpoint, PortSide};
use rustc_hash::FxHashMap;

/// One (source, target) pair of an edge, as seen from the level being laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Projected {
    pub edge: EdgeId,
    pub pair: usize,
    pub source: Endpoint,
    pub target: Endpoint,
    /// Both ends are children of the level (or their ports); the level's route is final.
    pub direct: bool,
}

/// Picks a side for every port, indexed by port index.
///
/// A port with more outgoing than incoming edges faces downstream, any other port upstream. The
/// flow is the one its node is laid out in, i.e. the parent's direction.
pub(crate) fn port_sides(graph: &Graph, effective: &[Effective]) -> Vec<PortSide> {
    let mut outgoing = vec![0usize; graph.port_count()];
    let mut incoming = vec![0usize; graph.port_count()];
    for (_, edge) in graph.edges() {
        for shape in edge.sources() {
            if let ShapeRef::Port(p) = shape {
                if let Some(n) = outgoing.get_mut(p.index()) {
                    *n += 1;
                }
            }
        }
        for shape in edge.targets() {
            if let ShapeRef::Port(p) = shape {
                if let Some(n) = incoming.get_mut(p.index()) {
                    *n += 1;
                }
            }
        }
    }

    graph
        .ports()
        .map(|(id, port)| {
            let owner = port.node();
            let level = graph.node(owner).and_then(|n| n.parent()).unwrap_or(owner);
            let direction = flow_direction(inherit::get(effective, level).direction);
            let out = outgoing[id.index()];
            let inc = incoming[id.index()];
            PortSide::for_flow(direction, out > 0 && out >= inc)
        })
        .collect()
}

struct Lifted {
    child: usize,
    endpoint: Endpoint,
    direct: bool,
}

/// Maps a shape onto the child of `level` that contains it.
fn lift(
    graph: &Graph,
    level: NodeId,
    shape: ShapeRef,
    index_of: &FxHashMap<NodeId, usize>,
) -> Option<Lifted> {
    let owner = graph.shape_node(shape)?;
    let mut cur = owner;
    loop {
        let parent = graph.node(cur)?.parent()?;
        if parent == level {
            break;
        }
        cur = parent;
    }
    let child = *index_of.get(&cur)?;
    let direct = cur == owner;
    let port = match shape {
        ShapeRef::Port(p) if direct => graph.node(cur)?.ports().iter().position(|&q| q == p),
        _ => None,
    };
    Some(Lifted {
        child,
        endpoint: Endpoint { node: child, port },
        direct,
    })
}

/// Edge pairs relevant to laying out the children of `level`.
///
/// With [`HierarchyHandling::IncludeChildren`] every edge whose ends lie below two different
/// children counts, lifted to those children. Otherwise only edges contained in `level` that
/// connect two of its children (or their ports) directly count.
pub(crate) fn project(
    graph: &Graph,
    level: NodeId,
    mode: HierarchyHandling,
    index_of: &FxHashMap<NodeId, usize>,
) -> Vec<Projected> {
    let candidates: Vec<EdgeId> = match mode {
        HierarchyHandling::IncludeChildren => graph.edges().map(|(id, _)| id).collect(),
        _ => graph
            .node(level)
            .map(|n| n.edges().to_vec())
            .unwrap_or_default(),
    };
    let include = mode == HierarchyHandling::IncludeChildren;

    let mut out = Vec::new();
    for id in candidates {
        let Some(edge) = graph.edge(id) else {
            continue;
        };
        let targets = edge.targets();
        for (si, &source) in edge.sources().iter().enumerate() {
            let Some(s) = lift(graph, level, source, index_of) else {
                continue;
            };
            for (ti, &target) in targets.iter().enumerate() {
                let Some(t) = lift(graph, level, target, index_of) else {
                    continue;
                };
                let direct = s.direct && t.direct;
                if !include && !direct {
                    continue;
                }
                if s.child == t.child && !direct {
                    continue;
                }
                out.push(Projected {
                    edge: id,
                    pair: si * targets.len() + ti,
                    source: s.endpoint,
                    target: t.endpoint,
                    direct,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(graph: &Graph, level: NodeId) -> FxHashMap<NodeId, usize> {
        graph
            .node(level)
            .unwrap()
            .children()
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i))
            .collect()
    }

    #[test]
    fn include_lifts_edges_to_the_containers() {
        let mut g = Graph::new();
        let root = g.root();
        let n = g.create_node(root, "N").unwrap();
        let c1 = g.create_node(n, "C1").unwrap();
        let m = g.create_node(root, "M").unwrap();
        let e = g.create_edge_between(root, "e", c1, m).unwrap();

        let lifted = project(&g, root, HierarchyHandling::IncludeChildren, &index_of(&g, root));
        assert_eq!(
            lifted,
            vec![Projected {
                edge: e,
                pair: 0,
                source: Endpoint::node(0),
                target: Endpoint::node(1),
                direct: false,
            }]
        );

        let separate = project(&g, root, HierarchyHandling::SeparateChildren, &index_of(&g, root));
        assert!(separate.is_empty());
    }

    #[test]
    fn ports_on_children_are_kept() {
        let mut g = Graph::new();
        let root = g.root();
        let a = g.create_node(root, "A").unwrap();
        let b = g.create_node(root, "B").unwrap();
        let _pa = g.create_port(a, "out").unwrap();
        let pb = g.create_port(b, "in").unwrap();
        g.create_edge_between(root, "e", a, pb).unwrap();

        let projected =
            project(&g, root, HierarchyHandling::SeparateChildren, &index_of(&g, root));
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].source, Endpoint::node(0));
        assert_eq!(projected[0].target, Endpoint::port(1, 0));
        assert!(projected[0].direct);

        let sides = port_sides(&g, &inherit::resolve(&g));
        assert_eq!(sides[pb.index()], PortSide::West);
    }
}
