use narwhal_core::geom::{rect, size};
use narwhal_core::{
    Algorithm, ElementRef, Error, Graph, HierarchyHandling, LabelOwner, NodeId, PortLabelPlacement,
    ShapeRef, SizeConstraints,
};

#[test]
fn new_graph_root_is_configured_for_layered_hierarchical_layout() {
    let g = Graph::new();
    let root = g.node(g.root()).unwrap();
    assert_eq!(root.identifier(), "root");
    assert_eq!(root.parent(), None);
    assert_eq!(root.options.algorithm, Some(Algorithm::Layered));
    assert_eq!(
        root.options.hierarchy_handling,
        Some(HierarchyHandling::IncludeChildren)
    );
    assert_eq!(root.options.thoroughness, Some(7));
    assert_eq!(g.node_count(), 1);
    assert_eq!(g.label_count(), 0);
}

#[test]
fn create_node_adds_child_with_label_and_defaults() {
    let mut g = Graph::new();
    let root = g.root();
    let a = g.create_node(root, "A").unwrap();

    let node = g.node(a).unwrap();
    assert_eq!(node.identifier(), "root-A");
    assert_eq!(node.parent(), Some(root));
    assert_eq!(g.node(root).unwrap().children(), &[a]);

    assert_eq!(node.labels().len(), 1);
    let label = g.label(node.labels()[0]).unwrap();
    assert_eq!(label.identifier(), "root-A-label");
    assert_eq!(label.text, "A");
    assert_eq!(label.owner(), LabelOwner::Node(a));

    assert_eq!(
        node.options.port_label_placement,
        Some(PortLabelPlacement::Inside)
    );
    assert_eq!(node.options.port_labels_next_to_port, Some(true));
    assert_eq!(
        node.options.size_constraints,
        Some(SizeConstraints::minimum_size_with_ports())
    );
    assert_eq!(node.options.algorithm, None);
}

#[test]
fn create_node_with_suffix_appends_to_the_text() {
    let mut g = Graph::new();
    let root = g.root();
    let n = g.create_node_with_suffix(root, "X", "#2").unwrap();
    assert_eq!(g.node(n).unwrap().identifier(), "root-X#2");
    let label = g.node(n).unwrap().labels()[0];
    assert_eq!(g.label(label).unwrap().text, "X");
}

#[test]
fn nested_identifiers_follow_the_parent_chain() {
    let mut g = Graph::new();
    let root = g.root();
    let n = g.create_node(root, "N").unwrap();
    let c = g.create_node(n, "C1").unwrap();
    let p = g.create_port(c, "P").unwrap();
    assert_eq!(g.node(c).unwrap().identifier(), "root-N-C1");
    assert_eq!(g.port(p).unwrap().identifier(), "root-N-C1-P");
    assert_eq!(g.subtree(root), vec![root, n, c]);
    assert!(g.is_ancestor_or_self(root, c));
    assert!(g.is_ancestor_or_self(c, c));
    assert!(!g.is_ancestor_or_self(c, n));
}

#[test]
fn set_min_size_enables_the_minimum_size_constraint() {
    let mut g = Graph::new();
    let root = g.root();
    let n = g.create_node(root, "N").unwrap();
    g.node_mut(n).unwrap().options.size_constraints = Some(SizeConstraints::default());

    g.set_min_size(n, 200.0, 0.0).unwrap();
    let options = &g.node(n).unwrap().options;
    assert_eq!(options.minimum_size, Some(size(200.0, 0.0)));
    assert_eq!(
        options.size_constraints,
        Some(SizeConstraints::minimum_size_with_ports())
    );
}

#[test]
fn set_min_size_rejects_sizes_the_codec_cannot_read() {
    let mut g = Graph::new();
    let root = g.root();
    let n = g.create_node(root, "N").unwrap();
    let before = g.node(n).unwrap().options.clone();

    for (w, h) in [(-5.0, 10.0), (10.0, -0.5), (f64::NAN, 1.0), (1.0, f64::INFINITY)] {
        let err = g.set_min_size(n, w, h).unwrap_err();
        assert!(matches!(err, Error::InvalidMinimumSize { .. }), "{w} x {h}: {err:?}");
    }
    assert_eq!(g.node(n).unwrap().options, before);

    g.set_min_size(n, 0.0, 0.0).unwrap();
    let back = narwhal_core::decode(&narwhal_core::encode(&g, false).unwrap()).unwrap();
    let Some(ElementRef::Node(m)) = back.find("root-N") else {
        panic!("root-N missing after decode");
    };
    assert_eq!(back.node(m).unwrap().options.minimum_size, Some(size(0.0, 0.0)));
}

#[test]
fn create_port_is_ten_by_ten_with_a_label() {
    let mut g = Graph::new();
    let root = g.root();
    let n = g.create_node(root, "N").unwrap();
    let p = g.create_port(n, "in").unwrap();

    let port = g.port(p).unwrap();
    assert_eq!(port.identifier(), "root-N-in");
    assert_eq!(port.node(), n);
    assert_eq!(port.bounds, rect(0.0, 0.0, 10.0, 10.0));
    assert_eq!(g.node(n).unwrap().ports(), &[p]);

    let label = g.label(port.labels()[0]).unwrap();
    assert_eq!(label.identifier(), "root-N-in-label");
    assert_eq!(label.text, "in");
    assert_eq!(label.owner(), LabelOwner::Port(p));
}

#[test]
fn create_edge_scopes_the_edge_to_its_container() {
    let mut g = Graph::new();
    let root = g.root();
    let a = g.create_node(root, "A").unwrap();
    let b = g.create_node(root, "B").unwrap();
    let p = g.create_port(b, "in").unwrap();

    let e1 = g.create_edge_between(root, "e1", a, p).unwrap();
    let edge = g.edge(e1).unwrap();
    assert_eq!(edge.identifier(), "root-e1");
    assert_eq!(edge.container(), root);
    assert_eq!(edge.sources(), &[ShapeRef::Node(a)]);
    assert_eq!(edge.targets(), &[ShapeRef::Port(p)]);
    assert!(edge.labels().is_empty());
    assert_eq!(g.node(root).unwrap().edges(), &[e1]);

    let bare = g.create_edge(a, "loose").unwrap();
    assert_eq!(g.edge(bare).unwrap().identifier(), "root-A-loose");
    assert!(g.edge(bare).unwrap().sources().is_empty());
}

#[test]
fn create_label_attaches_to_nodes_ports_and_edges() {
    let mut g = Graph::new();
    let root = g.root();
    let a = g.create_node(root, "A").unwrap();
    let e = g.create_edge_between(root, "e1", a, a).unwrap();

    let l = g.create_label("calls", e, "lbl").unwrap();
    let label = g.label(l).unwrap();
    assert_eq!(label.identifier(), "root-e1-lbl");
    assert_eq!(label.owner(), LabelOwner::Edge(e));
    assert_eq!(g.edge(e).unwrap().labels(), &[l]);

    let extra = g.create_label("note", a, "note").unwrap();
    assert_eq!(g.label(extra).unwrap().identifier(), "root-A-note");
    assert_eq!(g.node(a).unwrap().labels().len(), 2);
}

#[test]
fn unknown_parent_handles_are_rejected() {
    let mut g = Graph::new();
    let missing = NodeId::from_index(42);
    assert_eq!(
        g.create_node(missing, "A"),
        Err(Error::UnknownElement {
            kind: "node",
            index: 42
        })
    );
    assert!(g.create_port(missing, "P").is_err());
    assert!(g.create_edge(missing, "e").is_err());
    assert!(g.set_min_size(missing, 1.0, 1.0).is_err());
    assert!(g.create_label("t", missing, "l").is_err());
    assert_eq!(g.node_count(), 1);
}

#[test]
fn identifier_and_find_resolve_every_element_kind() {
    let mut g = Graph::new();
    let root = g.root();
    let a = g.create_node(root, "A").unwrap();
    let p = g.create_port(a, "P").unwrap();
    let e = g.create_edge_between(root, "e1", a, p).unwrap();

    assert_eq!(g.identifier(ElementRef::Port(p)), Some("root-A-P"));
    assert_eq!(g.identifier(e.into()), Some("root-e1"));
    assert_eq!(g.find("root-A"), Some(ElementRef::Node(a)));
    assert_eq!(g.find("root-A-P"), Some(ElementRef::Port(p)));
    assert_eq!(g.find("root-e1"), Some(ElementRef::Edge(e)));
    assert!(matches!(g.find("root-A-P-label"), Some(ElementRef::Label(_))));
    assert_eq!(g.find("nope"), None);
    assert_eq!(g.shape_node(ShapeRef::Port(p)), Some(a));
}
