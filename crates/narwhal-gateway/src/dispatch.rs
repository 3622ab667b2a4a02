//! Maps wire requests onto graph, codec and layout calls.

use crate::config::GatewayConfig;
use crate::protocol::{
    CreateEdgeParams, CreateGraphParams, CreateLabelParams, CreateNodeParams, CreatePortParams,
    DecodeParams, EncodeParams, ErrorCode, GraphParams, Handle, IdentifierParams, LayoutParams,
    Request, Response, SetMinSizeParams, WireError,
};
use crate::store::{GraphStore, SharedGraph};
use narwhal_core::codec::{DecodeOptions, decode_with};
use narwhal_core::{EdgeId, ElementRef, Graph, IdPolicy, LabelId, NodeId, PortId, ShapeRef};
use narwhal_layout::{AlgorithmRegistry, CancelToken, LayoutInvoker, LayoutMonitor};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

type CallResult = std::result::Result<Value, WireError>;

/// Executes requests against a shared [`GraphStore`]. Clones share the store and the engines.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<GraphStore>,
    invoker: Arc<LayoutInvoker>,
    id_policy: IdPolicy,
    layout_timeout_ms: Option<u64>,
}

impl Dispatcher {
    pub fn new(config: &GatewayConfig) -> Self {
        Self::with_invoker(
            config,
            LayoutInvoker::new(AlgorithmRegistry::with_algorithms(&config.algorithms)),
        )
    }

    pub fn with_invoker(config: &GatewayConfig, invoker: LayoutInvoker) -> Self {
        Self {
            store: Arc::new(GraphStore::new()),
            invoker: Arc::new(invoker),
            id_policy: config.id_policy,
            layout_timeout_ms: config.layout_timeout_ms,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Handles one request line. Malformed input is answered with `invalidRequest`.
    pub async fn handle_line(&self, line: &str) -> Response {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                return Response::err(
                    Value::Null,
                    WireError::new(ErrorCode::InvalidRequest, err.to_string()),
                );
            }
        };
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: Request = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(err) => {
                return Response::err(id, WireError::new(ErrorCode::InvalidRequest, err.to_string()));
            }
        };
        self.handle(request).await
    }

    pub async fn handle(&self, request: Request) -> Response {
        let Request { id, method, params } = request;
        match self.call(&method, params).await {
            Ok(result) => Response::ok(id, result),
            Err(err) => {
                tracing::debug!(%method, code = %err.code, message = %err.message, "call failed");
                Response::err(id, err)
            }
        }
    }

    pub async fn call(&self, method: &str, params: Value) -> CallResult {
        match method {
            "createGraph" => self.create_graph(parse(params)?),
            "createNode" => self.create_node(parse(params)?).await,
            "setMinSize" => self.set_min_size(parse(params)?).await,
            "createPort" => self.create_port(parse(params)?).await,
            "createEdge" => self.create_edge(parse(params)?).await,
            "createLabel" => self.create_label(parse(params)?).await,
            "layout" => self.layout(parse(params)?).await,
            "decode" => self.decode(parse(params)?),
            "encode" => self.encode(parse(params)?).await,
            "identifier" => self.identifier(parse(params)?).await,
            "releaseGraph" => self.release_graph(parse(params)?),
            "algorithms" => to_value(&self.invoker.registry().algorithms()),
            other => Err(WireError::new(
                ErrorCode::UnknownMethod,
                format!("unknown method `{other}`"),
            )),
        }
    }

    fn graph(&self, id: u64) -> Result<SharedGraph, WireError> {
        self.store
            .get(id)
            .ok_or_else(|| WireError::new(ErrorCode::UnknownGraph, format!("no graph with id {id}")))
    }

    fn create_graph(&self, params: CreateGraphParams) -> CallResult {
        let graph = Graph::with_id_policy(params.id_policy.unwrap_or(self.id_policy));
        let root = graph.root();
        let id = self.store.insert(graph);
        tracing::debug!(graph = id, "graph created");
        to_value(&Handle::new(id, root))
    }

    async fn create_node(&self, params: CreateNodeParams) -> CallResult {
        let parent = params.parent.node()?;
        let shared = self.graph(params.parent.graph)?;
        let mut graph = shared.lock().await;
        let node = graph.create_node_with_suffix(parent, &params.text, &params.id_suffix)?;
        to_value(&Handle::new(params.parent.graph, node))
    }

    async fn set_min_size(&self, params: SetMinSizeParams) -> CallResult {
        let node = params.node.node()?;
        let shared = self.graph(params.node.graph)?;
        let mut graph = shared.lock().await;
        graph.set_min_size(node, params.width, params.height)?;
        Ok(Value::Null)
    }

    async fn create_port(&self, params: CreatePortParams) -> CallResult {
        let parent = params.parent.node()?;
        let shared = self.graph(params.parent.graph)?;
        let mut graph = shared.lock().await;
        let port = graph.create_port(parent, &params.text)?;
        to_value(&Handle::new(params.parent.graph, port))
    }

    async fn create_edge(&self, params: CreateEdgeParams) -> CallResult {
        let graph_id = params.parent.graph;
        let parent = params.parent.node()?;
        let endpoints = match (&params.source, &params.target) {
            (Some(source), Some(target)) => {
                Some((endpoint(graph_id, source)?, endpoint(graph_id, target)?))
            }
            (None, None) => None,
            _ => {
                return Err(WireError::invalid_params(
                    "source and target are given together or not at all",
                ));
            }
        };
        let shared = self.graph(graph_id)?;
        let mut graph = shared.lock().await;
        let edge = match endpoints {
            Some((source, target)) => {
                ensure_shape(&graph, source)?;
                ensure_shape(&graph, target)?;
                graph.create_edge_between(parent, &params.rel_id, source, target)?
            }
            None => graph.create_edge(parent, &params.rel_id)?,
        };
        to_value(&Handle::new(graph_id, edge))
    }

    async fn create_label(&self, params: CreateLabelParams) -> CallResult {
        let owner = params.parent.label_owner()?;
        let shared = self.graph(params.parent.graph)?;
        let mut graph = shared.lock().await;
        let label = graph.create_label(&params.text, owner, &params.rel_id)?;
        to_value(&Handle::new(params.parent.graph, label))
    }

    async fn layout(&self, params: LayoutParams) -> CallResult {
        let shared = self.graph(params.graph)?;
        let guard = shared.lock_owned().await;
        let token = CancelToken::new();
        let timeout = params
            .timeout_ms
            .or(self.layout_timeout_ms)
            .map(Duration::from_millis);

        let mut monitor = LayoutMonitor::new().with_cancel_token(token.clone());
        if let Some(timeout) = timeout {
            monitor = monitor.with_timeout(timeout);
        }
        let invoker = Arc::clone(&self.invoker);
        let started = Instant::now();
        let task = tokio::task::spawn_blocking(move || {
            let mut graph = guard;
            invoker.layout_with(&mut graph, &monitor)
        });

        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    // The worker observes the token at its next check and drops the graph lock.
                    token.cancel();
                    tracing::warn!(
                        graph = params.graph,
                        timeout_ms = limit.as_millis() as u64,
                        "layout timed out"
                    );
                    return Err(WireError::new(
                        ErrorCode::Timeout,
                        format!("layout exceeded {} ms", limit.as_millis()),
                    ));
                }
            },
            None => task.await,
        };
        let outcome = joined.map_err(|err| {
            WireError::new(ErrorCode::Layout, format!("layout task failed: {err}"))
        })?;
        outcome?;
        tracing::debug!(
            graph = params.graph,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "layout finished"
        );
        Ok(Value::Null)
    }

    fn decode(&self, params: DecodeParams) -> CallResult {
        let options = DecodeOptions {
            id_policy: params.id_policy.unwrap_or(self.id_policy),
        };
        let graph = decode_with(&params.json, options)?;
        let root = graph.root();
        let id = self.store.insert(graph);
        tracing::debug!(graph = id, bytes = params.json.len(), "graph decoded");
        to_value(&Handle::new(id, root))
    }

    async fn encode(&self, params: EncodeParams) -> CallResult {
        let shared = self.graph(params.graph)?;
        let graph = shared.lock().await;
        let text = narwhal_core::encode(&graph, params.omit_layout)?;
        Ok(Value::String(text))
    }

    async fn identifier(&self, params: IdentifierParams) -> CallResult {
        let element = params.element.element()?;
        let shared = self.graph(params.element.graph)?;
        let graph = shared.lock().await;
        match graph.identifier(element) {
            Some(identifier) => Ok(Value::String(identifier.to_string())),
            None => Err(match element {
                ElementRef::Node(n) => unknown_element(NodeId::KIND, n.index()),
                ElementRef::Port(p) => unknown_element(PortId::KIND, p.index()),
                ElementRef::Edge(e) => unknown_element(EdgeId::KIND, e.index()),
                ElementRef::Label(l) => unknown_element(LabelId::KIND, l.index()),
            }),
        }
    }

    fn release_graph(&self, params: GraphParams) -> CallResult {
        if self.store.remove(params.graph) {
            tracing::debug!(graph = params.graph, "graph released");
            Ok(Value::Bool(true))
        } else {
            Err(WireError::new(
                ErrorCode::UnknownGraph,
                format!("no graph with id {}", params.graph),
            ))
        }
    }
}

fn parse<T: DeserializeOwned>(params: Value) -> Result<T, WireError> {
    let params = match params {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(params).map_err(|err| WireError::invalid_params(err.to_string()))
}

fn to_value<T: Serialize>(value: &T) -> CallResult {
    serde_json::to_value(value)
        .map_err(|err| WireError::new(ErrorCode::Encode, err.to_string()))
}

fn endpoint(graph: u64, handle: &Handle) -> Result<ShapeRef, WireError> {
    if handle.graph != graph {
        return Err(WireError::invalid_params(
            "edge endpoints must belong to the edge's graph",
        ));
    }
    handle.shape()
}

fn ensure_shape(graph: &Graph, shape: ShapeRef) -> Result<(), WireError> {
    match shape {
        ShapeRef::Node(n) if graph.node(n).is_none() => Err(unknown_element(NodeId::KIND, n.index())),
        ShapeRef::Port(p) if graph.port(p).is_none() => Err(unknown_element(PortId::KIND, p.index())),
        _ => Ok(()),
    }
}

fn unknown_element(kind: &'static str, index: usize) -> WireError {
    narwhal_core::Error::UnknownElement { kind, index }.into()
}
