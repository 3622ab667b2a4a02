use narwhal_core::{Algorithm, Graph};
use narwhal_gateway::{Dispatcher, ErrorCode, GatewayConfig, WireError};
use narwhal_layout::{AlgorithmRegistry, LayoutEngine, LayoutInvoker, LayoutMonitor};
use serde_json::{Value, json};
use std::time::Duration;

fn dispatcher() -> Dispatcher {
    Dispatcher::new(&GatewayConfig::default())
}

async fn call(d: &Dispatcher, method: &str, params: Value) -> Result<Value, WireError> {
    d.call(method, params).await
}

async fn ok(d: &Dispatcher, method: &str, params: Value) -> Value {
    match call(d, method, params).await {
        Ok(value) => value,
        Err(err) => panic!("{method} failed: {err}"),
    }
}

async fn code(d: &Dispatcher, method: &str, params: Value) -> ErrorCode {
    call(d, method, params).await.unwrap_err().code
}

fn encoded(value: Value) -> Value {
    serde_json::from_str(value.as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn two_nodes_and_an_edge_round_trip() {
    let d = dispatcher();
    let root = ok(&d, "createGraph", Value::Null).await;
    assert_eq!(root, json!({ "graph": 1, "node": 0 }));

    let a = ok(&d, "createNode", json!({ "parent": root, "text": "A" })).await;
    let b = ok(&d, "createNode", json!({ "parent": root, "text": "B" })).await;
    let e = ok(
        &d,
        "createEdge",
        json!({ "parent": root, "relId": "e1", "source": a, "target": b }),
    )
    .await;
    assert_eq!(e, json!({ "graph": 1, "edge": 0 }));

    ok(&d, "layout", json!({ "graph": 1 })).await;
    let doc = encoded(ok(&d, "encode", json!({ "graph": 1 })).await);

    let children = doc["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["id"], "root-A");
    assert_eq!(children[1]["id"], "root-B");
    for child in children {
        assert!(child["width"].as_f64().unwrap() > 0.0);
        assert!(child["height"].as_f64().unwrap() > 0.0);
    }
    let x = |node: &Value| node["x"].as_f64().unwrap_or(0.0);
    assert!(x(&children[1]) > x(&children[0]));
    let edge = &doc["edges"][0];
    assert_eq!(edge["id"], "root-e1");
    assert_eq!(edge["sources"], json!(["root-A"]));
    assert_eq!(edge["targets"], json!(["root-B"]));

    let bare = encoded(ok(&d, "encode", json!({ "graph": 1, "omitLayout": true })).await);
    assert!(bare["children"][0].get("x").is_none());
    assert!(bare["edges"][0].get("sections").is_none());
}

#[tokio::test]
async fn identifiers_follow_the_graph_policy() {
    let d = dispatcher();
    let root = ok(&d, "createGraph", json!({})).await;
    let x1 = ok(&d, "createNode", json!({ "parent": root, "text": "X" })).await;
    let x2 = ok(&d, "createNode", json!({ "parent": root, "text": "X" })).await;
    assert_ne!(x1, x2);
    assert_eq!(ok(&d, "identifier", json!({ "element": x1 })).await, "root-X");
    assert_eq!(ok(&d, "identifier", json!({ "element": x2 })).await, "root-X");

    let strict = ok(&d, "createGraph", json!({ "idPolicy": "strict" })).await;
    ok(&d, "createNode", json!({ "parent": strict, "text": "X" })).await;
    assert_eq!(
        code(&d, "createNode", json!({ "parent": strict, "text": "X" })).await,
        ErrorCode::DuplicateIdentifier
    );

    let auto = ok(&d, "createGraph", json!({ "idPolicy": "autoSuffix" })).await;
    ok(&d, "createNode", json!({ "parent": auto, "text": "X" })).await;
    let second = ok(&d, "createNode", json!({ "parent": auto, "text": "X" })).await;
    assert_eq!(ok(&d, "identifier", json!({ "element": second })).await, "root-X_1");

    let suffixed = ok(
        &d,
        "createNode",
        json!({ "parent": root, "text": "Y", "idSuffix": "#2" }),
    )
    .await;
    assert_eq!(ok(&d, "identifier", json!({ "element": suffixed })).await, "root-Y#2");
}

#[tokio::test]
async fn ports_labels_and_min_sizes() {
    let d = dispatcher();
    let root = ok(&d, "createGraph", json!({})).await;
    let a = ok(&d, "createNode", json!({ "parent": root, "text": "A" })).await;
    let p = ok(&d, "createPort", json!({ "parent": a, "text": "out" })).await;
    assert_eq!(ok(&d, "identifier", json!({ "element": p })).await, "root-A-out");

    let e = ok(&d, "createEdge", json!({ "parent": root, "relId": "e" })).await;
    let label = ok(
        &d,
        "createLabel",
        json!({ "text": "calls", "parent": e, "relId": "lbl" }),
    )
    .await;
    assert_eq!(ok(&d, "identifier", json!({ "element": label })).await, "root-e-lbl");

    let min = ok(
        &d,
        "setMinSize",
        json!({ "node": a, "width": 120.0, "height": 80.0 }),
    )
    .await;
    assert_eq!(min, Value::Null);
    assert_eq!(
        code(&d, "setMinSize", json!({ "node": a, "width": -5.0, "height": 10.0 })).await,
        ErrorCode::InvalidParams
    );
    ok(&d, "layout", json!({ "graph": 1 })).await;
    let doc = encoded(ok(&d, "encode", json!({ "graph": 1 })).await);
    let node = &doc["children"][0];
    assert!(node["width"].as_f64().unwrap() >= 120.0);
    assert!(node["height"].as_f64().unwrap() >= 80.0);
    assert_eq!(node["ports"][0]["width"], 10.0);
    assert_eq!(node["ports"][0]["height"], 10.0);
}

#[tokio::test]
async fn bad_requests_get_specific_codes() {
    let d = dispatcher();
    assert_eq!(code(&d, "encode", json!({ "graph": 9 })).await, ErrorCode::UnknownGraph);
    assert_eq!(code(&d, "shutdown", Value::Null).await, ErrorCode::UnknownMethod);

    let root = ok(&d, "createGraph", Value::Null).await;
    assert_eq!(
        code(&d, "createNode", json!({ "parent": root })).await,
        ErrorCode::InvalidParams
    );
    assert_eq!(
        code(
            &d,
            "createNode",
            json!({ "parent": { "graph": 1, "node": 0, "port": 0 }, "text": "A" })
        )
        .await,
        ErrorCode::InvalidParams
    );
    assert_eq!(
        code(
            &d,
            "createNode",
            json!({ "parent": { "graph": 1, "node": 42 }, "text": "A" })
        )
        .await,
        ErrorCode::UnknownElement
    );
    assert_eq!(
        code(
            &d,
            "createEdge",
            json!({ "parent": root, "relId": "e", "source": { "graph": 1, "node": 0 } })
        )
        .await,
        ErrorCode::InvalidParams
    );
    assert_eq!(
        code(
            &d,
            "createEdge",
            json!({
                "parent": root,
                "relId": "e",
                "source": { "graph": 1, "node": 0 },
                "target": { "graph": 1, "port": 3 }
            })
        )
        .await,
        ErrorCode::UnknownElement
    );
    assert_eq!(
        code(&d, "identifier", json!({ "element": { "graph": 1, "label": 99 } })).await,
        ErrorCode::UnknownElement
    );
    assert_eq!(
        code(&d, "decode", json!({ "json": "{ \"children\": [] }" })).await,
        ErrorCode::Decode
    );
}

#[tokio::test]
async fn malformed_lines_are_answered() {
    let d = dispatcher();
    let garbage = d.handle_line("not json").await;
    assert_eq!(garbage.id, Value::Null);
    assert_eq!(garbage.error.unwrap().code, ErrorCode::InvalidRequest);

    let no_method = d.handle_line(r#"{"id": 5, "params": {}}"#).await;
    assert_eq!(no_method.id, json!(5));
    assert_eq!(no_method.error.unwrap().code, ErrorCode::InvalidRequest);

    let fine = d
        .handle_line(r#"{"id": "x", "method": "createGraph"}"#)
        .await;
    assert_eq!(fine.id, json!("x"));
    assert_eq!(fine.result.unwrap(), json!({ "graph": 1, "node": 0 }));
}

#[tokio::test]
async fn decoded_graphs_need_root_options_to_lay_out() {
    let d = dispatcher();
    let bare = ok(
        &d,
        "decode",
        json!({ "json": r#"{ "id": "g", "children": [{ "id": "n" }] }"# }),
    )
    .await;
    assert_eq!(bare, json!({ "graph": 1, "node": 0 }));
    assert_eq!(code(&d, "layout", json!({ "graph": 1 })).await, ErrorCode::Layout);

    let text = r#"{
        "id": "g",
        "layoutOptions": { "algorithm": "layered", "hierarchyHandling": "INCLUDE_CHILDREN" },
        "children": [{ "id": "n", "width": 30, "height": 20 }]
    }"#;
    ok(&d, "decode", json!({ "json": text })).await;
    ok(&d, "layout", json!({ "graph": 2 })).await;
    let doc = encoded(ok(&d, "encode", json!({ "graph": 2 })).await);
    assert_eq!(doc["id"], "g");
    assert_eq!(doc["children"][0]["id"], "n");
}

#[tokio::test]
async fn layout_only_offers_configured_algorithms() {
    let config = GatewayConfig {
        algorithms: vec![Algorithm::Fixed],
        ..GatewayConfig::default()
    };
    let d = Dispatcher::new(&config);
    assert_eq!(
        ok(&d, "algorithms", Value::Null).await,
        json!(["org.eclipse.elk.fixed"])
    );
    ok(&d, "createGraph", Value::Null).await;
    let err = call(&d, "layout", json!({ "graph": 1 })).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Layout);
    assert!(err.message.contains("org.eclipse.elk.layered"));
}

#[tokio::test]
async fn released_graphs_are_gone() {
    let d = dispatcher();
    ok(&d, "createGraph", Value::Null).await;
    assert_eq!(ok(&d, "releaseGraph", json!({ "graph": 1 })).await, json!(true));
    assert!(d.store().is_empty());
    assert_eq!(code(&d, "releaseGraph", json!({ "graph": 1 })).await, ErrorCode::UnknownGraph);
    assert_eq!(code(&d, "encode", json!({ "graph": 1 })).await, ErrorCode::UnknownGraph);
    let next = ok(&d, "createGraph", Value::Null).await;
    assert_eq!(next["graph"], 2);
}

/// Spins until the monitor interrupts it.
struct Stalling;

impl LayoutEngine for Stalling {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Layered
    }

    fn layout(&self, _graph: &mut Graph, monitor: &LayoutMonitor) -> narwhal_layout::Result<()> {
        loop {
            monitor.check()?;
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

#[tokio::test]
async fn slow_layouts_time_out_and_release_the_graph() {
    let mut registry = AlgorithmRegistry::new();
    registry.register(Stalling);
    let config = GatewayConfig {
        layout_timeout_ms: Some(5_000),
        ..GatewayConfig::default()
    };
    let d = Dispatcher::with_invoker(&config, LayoutInvoker::new(registry));
    let root = ok(&d, "createGraph", Value::Null).await;
    ok(&d, "createNode", json!({ "parent": root, "text": "A" })).await;

    let err = call(&d, "layout", json!({ "graph": 1, "timeoutMs": 20 })).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Timeout);

    // The worker gives the graph back once it notices the cancellation.
    let doc = tokio::time::timeout(
        Duration::from_secs(5),
        call(&d, "encode", json!({ "graph": 1, "omitLayout": true })),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(encoded(doc)["children"][0]["id"], "root-A");
}
