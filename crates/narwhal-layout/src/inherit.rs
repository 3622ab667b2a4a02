//! Effective option values after inheritance.

use narwhal_core::options::{
    DEFAULT_LAYER_SPACING, DEFAULT_NODE_SPACING, DEFAULT_THOROUGHNESS,
};
use narwhal_core::{Direction, Graph, HierarchyHandling, NodeId, Padding};

/// Options a node lays its children out with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Effective {
    pub direction: Direction,
    pub node_spacing: f64,
    pub layer_spacing: f64,
    pub padding: Padding,
    pub thoroughness: u32,
    /// Never [`HierarchyHandling::Inherit`].
    pub hierarchy: HierarchyHandling,
}

impl Default for Effective {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            node_spacing: DEFAULT_NODE_SPACING,
            layer_spacing: DEFAULT_LAYER_SPACING,
            padding: Padding::default(),
            thoroughness: DEFAULT_THOROUGHNESS,
            hierarchy: HierarchyHandling::SeparateChildren,
        }
    }
}

/// Resolves every node's effective options, indexed by node index. Unset values come from the
/// nearest ancestor that sets them, then from the defaults.
pub(crate) fn resolve(graph: &Graph) -> Vec<Effective> {
    let mut out = vec![Effective::default(); graph.node_count()];
    for node in graph.subtree(graph.root()) {
        let Some(data) = graph.node(node) else {
            continue;
        };
        let inherited = data
            .parent()
            .map(|p| out[p.index()])
            .unwrap_or_default();
        let o = &data.options;
        out[node.index()] = Effective {
            direction: o.direction.unwrap_or(inherited.direction),
            node_spacing: o.node_spacing.unwrap_or(inherited.node_spacing),
            layer_spacing: o.layer_spacing.unwrap_or(inherited.layer_spacing),
            padding: o.padding.unwrap_or(inherited.padding),
            thoroughness: o.thoroughness.unwrap_or(inherited.thoroughness),
            hierarchy: match o.hierarchy_handling {
                None | Some(HierarchyHandling::Inherit) => inherited.hierarchy,
                Some(mode) => mode,
            },
        };
    }
    out
}

pub(crate) fn get(effective: &[Effective], node: NodeId) -> Effective {
    effective.get(node.index()).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_flow_down_until_overridden() {
        let mut g = Graph::new();
        let root = g.root();
        let a = g.create_node(root, "A").unwrap();
        let b = g.create_node(a, "B").unwrap();
        g.node_mut(root).unwrap().options.direction = Some(Direction::Down);
        g.node_mut(a).unwrap().options.node_spacing = Some(40.0);
        g.node_mut(b).unwrap().options.direction = Some(Direction::Left);

        let eff = resolve(&g);
        assert_eq!(eff[a.index()].direction, Direction::Down);
        assert_eq!(eff[a.index()].node_spacing, 40.0);
        assert_eq!(eff[b.index()].direction, Direction::Left);
        assert_eq!(eff[b.index()].node_spacing, 40.0);
        assert_eq!(eff[b.index()].thoroughness, 7);
        assert_eq!(eff[b.index()].hierarchy, HierarchyHandling::IncludeChildren);
    }

    #[test]
    fn inherit_at_the_root_means_separate() {
        let mut g = Graph::new();
        let root = g.root();
        g.node_mut(root).unwrap().options.hierarchy_handling = Some(HierarchyHandling::Inherit);
        let a = g.create_node(root, "A").unwrap();
        let eff = resolve(&g);
        assert_eq!(eff[root.index()].hierarchy, HierarchyHandling::SeparateChildren);
        assert_eq!(eff[a.index()].hierarchy, HierarchyHandling::SeparateChildren);
    }
}
