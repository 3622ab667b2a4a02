use narwhal_core::geom::{point, rect};
use narwhal_core::{
    DecodeError, DecodeOptions, EdgeSection, Error, Graph, IdPolicy, NodeId, ShapeRef, decode,
    encode,
};
use narwhal_core::codec::decode_with;
use serde_json::Value;

fn sample_graph() -> Graph {
    let mut g = Graph::new();
    let root = g.root();
    let a = g.create_node(root, "A").unwrap();
    let b = g.create_node(root, "B").unwrap();
    let out = g.create_port(a, "out").unwrap();
    let inner = g.create_node(b, "inner").unwrap();
    g.set_min_size(b, 200.0, 0.0).unwrap();
    let e = g.create_edge_between(root, "e1", out, inner).unwrap();
    g.create_label("calls", e, "label").unwrap();

    g.node_mut(a).unwrap().bounds = rect(12.0, 12.0, 40.0, 30.0);
    g.node_mut(b).unwrap().bounds = rect(72.0, 12.0, 200.0, 60.0);
    g.port_mut(out).unwrap().bounds = rect(40.0, 10.0, 10.0, 10.0);
    g.edge_mut(e).unwrap().sections = vec![EdgeSection {
        id: "root-e1_s0".to_string(),
        start: point(62.0, 27.0),
        end: point(84.0, 40.0),
        bend_points: vec![point(70.0, 27.0), point(70.0, 40.0)],
        incoming_shape: Some(ShapeRef::Port(out)),
        outgoing_shape: Some(ShapeRef::Node(inner)),
    }];
    g
}

fn ids_in_order(g: &Graph) -> Vec<String> {
    let mut out: Vec<String> = g.nodes().map(|(_, n)| n.identifier().to_string()).collect();
    out.extend(g.ports().map(|(_, p)| p.identifier().to_string()));
    out.extend(g.edges().map(|(_, e)| e.identifier().to_string()));
    out.sort();
    out
}

fn collect_keys(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                out.push(k.clone());
                collect_keys(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_keys(v, out);
            }
        }
        _ => {}
    }
}

#[test]
fn encode_writes_tree_with_full_option_keys() {
    let g = sample_graph();
    let text = encode(&g, false).unwrap();
    assert!(text.contains('\n'), "output should be pretty-printed");

    let v: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["id"], "root");
    assert_eq!(v["layoutOptions"]["org.eclipse.elk.algorithm"], "org.eclipse.elk.layered");
    assert_eq!(
        v["layoutOptions"]["org.eclipse.elk.hierarchyHandling"],
        "INCLUDE_CHILDREN"
    );
    assert_eq!(v["children"][0]["id"], "root-A");
    assert_eq!(v["children"][0]["ports"][0]["id"], "root-A-out");
    assert_eq!(v["children"][1]["children"][0]["id"], "root-B-inner");
    assert_eq!(
        v["children"][1]["layoutOptions"]["org.eclipse.elk.nodeSize.minimum"],
        "(200.0,0.0)"
    );

    let edge = &v["edges"][0];
    assert_eq!(edge["id"], "root-e1");
    assert_eq!(edge["sources"], serde_json::json!(["root-A-out"]));
    assert_eq!(edge["targets"], serde_json::json!(["root-B-inner"]));
    assert_eq!(edge["labels"][0]["text"], "calls");
    assert_eq!(edge["sections"][0]["incomingShape"], "root-A-out");
    assert_eq!(edge["sections"][0]["bendPoints"][1]["y"], 40.0);
}

#[test]
fn encode_omits_zero_positions_and_zero_dimensions() {
    let mut g = Graph::new();
    let root = g.root();
    let a = g.create_node(root, "A").unwrap();
    g.node_mut(a).unwrap().bounds = rect(0.0, 0.0, 30.0, 20.0);

    let v: Value = serde_json::from_str(&encode(&g, false).unwrap()).unwrap();
    assert!(v.get("x").is_none());
    assert!(v.get("width").is_none());
    let child = &v["children"][0];
    assert!(child.get("x").is_none());
    assert!(child.get("y").is_none());
    assert_eq!(child["width"], 30.0);
    assert_eq!(child["height"], 20.0);
}

#[test]
fn encode_without_layout_never_emits_geometry() {
    let g = sample_graph();
    let v: Value = serde_json::from_str(&encode(&g, true).unwrap()).unwrap();
    let mut keys = Vec::new();
    collect_keys(&v, &mut keys);
    for forbidden in ["x", "y", "width", "height", "sections"] {
        assert!(
            !keys.iter().any(|k| k == forbidden),
            "omitLayout output contains `{forbidden}`"
        );
    }
    assert!(keys.iter().any(|k| k == "layoutOptions"));
}

#[test]
fn inexact_coordinates_survive_a_round_trip() {
    let mut g = sample_graph();
    let a = g.node(g.root()).unwrap().children()[0];
    g.node_mut(a).unwrap().bounds = rect(0.1 + 0.2, 12.0 * 1.2, 40.0 / 3.0, 1e-7 + 0.3);
    let label = g.node(a).unwrap().labels()[0];
    g.label_mut(label).unwrap().bounds = rect(5.0, 5.0, 2.0 * 0.6 * 12.0, 12.0 * 1.2);

    let first = encode(&g, false).unwrap();
    let back = decode(&first).unwrap();
    assert_eq!(encode(&back, false).unwrap(), first);

    let Some(narwhal_core::ElementRef::Node(n)) = back.find("root-A") else {
        panic!("root-A missing after decode");
    };
    assert_eq!(back.node(n).unwrap().bounds, g.node(a).unwrap().bounds);
}

#[test]
fn decode_of_encode_reproduces_the_graph() {
    let g = sample_graph();
    let back = decode(&encode(&g, false).unwrap()).unwrap();

    assert_eq!(ids_in_order(&back), ids_in_order(&g));
    assert_eq!(back.label_count(), g.label_count());
    for (id, node) in g.nodes() {
        let other = match back.find(node.identifier()) {
            Some(narwhal_core::ElementRef::Node(n)) => back.node(n).unwrap(),
            other => panic!("{} decoded as {other:?}", node.identifier()),
        };
        assert_eq!(other.options, node.options, "options of {}", node.identifier());
        assert_eq!(other.bounds, node.bounds, "bounds of {}", node.identifier());
        assert_eq!(other.children().len(), node.children().len());
        let parent_id = node.parent().map(|p| g.node(p).unwrap().identifier());
        let other_parent = other.parent().map(|p| back.node(p).unwrap().identifier());
        assert_eq!(parent_id, other_parent, "parent of {:?}", id);
    }

    let (_, edge) = back.edges().next().unwrap();
    assert_eq!(edge.sections.len(), 1);
    assert_eq!(edge.sections[0].bend_points.len(), 2);
    assert_eq!(
        back.shape_identifier(edge.sources()[0]),
        Some("root-A-out")
    );
    assert_eq!(
        back.shape_identifier(edge.targets()[0]),
        Some("root-B-inner")
    );
    assert_eq!(encode(&back, false).unwrap(), encode(&g, false).unwrap());
}

#[test]
fn decode_accepts_properties_alias_and_short_keys() {
    let text = r#"{
        "id": "g",
        "properties": { "algorithm": "layered", "direction": "DOWN" },
        "children": [
            { "id": "n1", "width": 30, "height": 20, "ports": [ { "id": "p1" } ] },
            { "id": "n2" }
        ],
        "edges": [ { "id": "e", "sources": ["p1"], "targets": ["n2"] } ]
    }"#;
    let g = decode(text).unwrap();
    let root = g.node(g.root()).unwrap();
    assert_eq!(root.identifier(), "g");
    assert_eq!(root.options.direction, Some(narwhal_core::Direction::Down));

    let (_, port) = g.ports().next().unwrap();
    assert_eq!(port.bounds, rect(0.0, 0.0, 10.0, 10.0));

    let (_, edge) = g.edges().next().unwrap();
    assert_eq!(edge.container(), g.root());
    assert!(matches!(edge.sources()[0], ShapeRef::Port(_)));
    assert_eq!(edge.targets()[0], ShapeRef::Node(NodeId::from_index(2)));
}

#[test]
fn decode_resolves_edges_declared_before_their_shapes() {
    let text = r#"{
        "id": "root",
        "edges": [ { "id": "e", "sources": ["a"], "targets": ["b"] } ],
        "children": [
            { "id": "a", "edges": [ { "id": "inner", "sources": ["b"], "targets": ["a"] } ] },
            { "id": "b" }
        ]
    }"#;
    let g = decode(text).unwrap();
    assert_eq!(g.edge_count(), 2);
    let a = g.find("a");
    let inner = g.edges().find(|(_, e)| e.identifier() == "inner").unwrap().1;
    assert_eq!(inner.container(), NodeId::from_index(1));
    assert_eq!(a, Some(narwhal_core::ElementRef::Node(NodeId::from_index(1))));
}

#[test]
fn decode_reports_malformed_input() {
    assert!(matches!(decode("{ not json"), Err(DecodeError::Json(_))));
    assert!(matches!(
        decode(r#"{ "children": [] }"#),
        Err(DecodeError::MissingId { .. })
    ));

    let err = decode(r#"{ "id": "r", "children": [ { "width": 3 } ] }"#).unwrap_err();
    match err {
        DecodeError::MissingId { path } => assert_eq!(path, "$.children[0]"),
        other => panic!("unexpected error {other:?}"),
    }

    let err =
        decode(r#"{ "id": "r", "edges": [ { "id": "e", "sources": ["ghost"] } ] }"#).unwrap_err();
    match err {
        DecodeError::UnknownShape {
            edge, reference, ..
        } => {
            assert_eq!(edge, "e");
            assert_eq!(reference, "ghost");
        }
        other => panic!("unexpected error {other:?}"),
    }

    let err = decode(
        r#"{ "id": "r", "children": [ { "id": "n", "layoutOptions": { "direction": "NORTHWEST" } } ] }"#,
    )
    .unwrap_err();
    match err {
        DecodeError::InvalidOption { path, element, .. } => {
            assert_eq!(path, "$.children[0]");
            assert_eq!(element, "n");
        }
        other => panic!("unexpected error {other:?}"),
    }

    assert!(matches!(
        decode(r#"{ "id": "r", "layoutOptions": { "org.example.nope": "1" } }"#),
        Err(DecodeError::InvalidOption { .. })
    ));
}

#[test]
fn decode_keeps_duplicates_unless_strict() {
    let text = r#"{ "id": "r", "children": [ { "id": "x" }, { "id": "x" } ],
        "edges": [ { "id": "e", "sources": ["x"], "targets": ["x"] } ] }"#;

    let g = decode(text).unwrap();
    assert_eq!(g.node_count(), 3);
    assert_eq!(g.id_allocator().collisions(), vec!["x"]);
    let (_, edge) = g.edges().next().unwrap();
    assert_eq!(edge.sources()[0], ShapeRef::Node(NodeId::from_index(1)));

    let err = decode_with(
        text,
        DecodeOptions {
            id_policy: IdPolicy::Strict,
        },
    )
    .unwrap_err();
    match err {
        DecodeError::Model { path, source } => {
            assert_eq!(path, "$.children[1]");
            assert_eq!(
                source,
                Error::DuplicateIdentifier {
                    identifier: "x".to_string()
                }
            );
        }
        other => panic!("unexpected error {other:?}"),
    }
}
