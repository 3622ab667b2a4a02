//! JSON interchange codec (ELK JSON flavored).
//!
//! Encoding follows a fixed policy: geometry is optional (`omit_layout`), zero-valued
//! `width`/`height` pairs and `x`/`y` pairs are left out, option keys are written in full and
//! the output is pretty-printed. Decoding keeps identifiers verbatim.

mod wire;

use crate::error::Error;
use crate::geom::{Point, Rect, point, rect};
use crate::identity::IdPolicy;
use crate::model::{EdgeSection, Graph, LabelId, LabelOwner, NodeId, ShapeRef};
use crate::options::{LayoutOptions, OptionError};
use rustc_hash::FxHashMap;
use wire::{EdgeDto, LabelDto, NodeDto, PointDto, PortDto, SectionDto};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed graph JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}: element has no `id`")]
    MissingId { path: String },

    #[error("{path}: edge `{edge}` references unknown shape `{reference}`")]
    UnknownShape {
        path: String,
        edge: String,
        reference: String,
    },

    #[error("{path} (`{element}`): {source}")]
    InvalidOption {
        path: String,
        element: String,
        #[source]
        source: OptionError,
    },

    #[error("{path}: {source}")]
    Model {
        path: String,
        #[source]
        source: Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("edge `{edge}` has a {role} handle that does not belong to this graph")]
    DanglingReference { edge: String, role: &'static str },

    #[error("graph JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Policy of the decoded graph's allocator. Strict rejects duplicate identifiers in the
    /// input; the other policies keep them verbatim.
    pub id_policy: IdPolicy,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {
    /// Leave out `x`, `y`, `width`, `height` and edge sections.
    pub omit_layout: bool,
}

pub fn decode(text: &str) -> Result<Graph, DecodeError> {
    decode_with(text, DecodeOptions::default())
}

pub fn decode_with(text: &str, options: DecodeOptions) -> Result<Graph, DecodeError> {
    let root: NodeDto = serde_json::from_str(text)?;
    let path = "$".to_string();
    let Some(root_id) = root.id.clone() else {
        return Err(DecodeError::MissingId { path });
    };

    let mut decoder = Decoder {
        graph: Graph::with_root(root_id, options.id_policy),
        shapes: FxHashMap::default(),
        pending: Vec::new(),
    };
    let root_node = decoder.graph.root();
    decoder
        .shapes
        .insert(root.id.clone().unwrap_or_default(), ShapeRef::Node(root_node));
    decoder.node_body(root_node, &root, &path)?;

    let pending = std::mem::take(&mut decoder.pending);
    for (container, edge, path) in pending {
        decoder.edge(container, edge, &path)?;
    }

    tracing::trace!(
        nodes = decoder.graph.node_count(),
        edges = decoder.graph.edge_count(),
        "decoded graph"
    );
    Ok(decoder.graph)
}

struct Decoder<'a> {
    graph: Graph,
    /// First shape that claimed an identifier wins.
    shapes: FxHashMap<String, ShapeRef>,
    pending: Vec<(NodeId, &'a EdgeDto, String)>,
}

fn require_id(id: &Option<String>, path: &str) -> Result<String, DecodeError> {
    id.clone().ok_or_else(|| DecodeError::MissingId {
        path: path.to_string(),
    })
}

fn bounds_from(x: Option<f64>, y: Option<f64>, width: Option<f64>, height: Option<f64>) -> Rect {
    rect(
        x.unwrap_or(0.0),
        y.unwrap_or(0.0),
        width.unwrap_or(0.0),
        height.unwrap_or(0.0),
    )
}

impl<'a> Decoder<'a> {
    fn record(&mut self, identifier: &str, path: &str) -> Result<(), DecodeError> {
        self.graph
            .record_identifier(identifier)
            .map_err(|source| DecodeError::Model {
                path: path.to_string(),
                source,
            })
    }

    fn node_body(&mut self, node: NodeId, dto: &'a NodeDto, path: &str) -> Result<(), DecodeError> {
        let options = LayoutOptions::from_entries(dto.layout_options.iter()).map_err(|source| {
            DecodeError::InvalidOption {
                path: path.to_string(),
                element: dto.id.clone().unwrap_or_default(),
                source,
            }
        })?;
        if let Some(n) = self.graph.node_mut(node) {
            n.options = options;
            n.bounds = bounds_from(dto.x, dto.y, dto.width, dto.height);
        }

        for (i, label) in dto.labels.iter().enumerate() {
            self.label(LabelOwner::Node(node), label, &format!("{path}.labels[{i}]"))?;
        }
        for (i, port) in dto.ports.iter().enumerate() {
            self.port(node, port, &format!("{path}.ports[{i}]"))?;
        }
        for (i, child) in dto.children.iter().enumerate() {
            let child_path = format!("{path}.children[{i}]");
            let identifier = require_id(&child.id, &child_path)?;
            self.record(&identifier, &child_path)?;
            let child_node = self.graph.insert_node(node, identifier.clone());
            self.shapes
                .entry(identifier)
                .or_insert(ShapeRef::Node(child_node));
            self.node_body(child_node, child, &child_path)?;
        }
        for (i, edge) in dto.edges.iter().enumerate() {
            self.pending.push((node, edge, format!("{path}.edges[{i}]")));
        }
        Ok(())
    }

    fn port(&mut self, node: NodeId, dto: &PortDto, path: &str) -> Result<(), DecodeError> {
        let identifier = require_id(&dto.id, path)?;
        self.record(&identifier, path)?;
        let port = self.graph.insert_port(node, identifier.clone());
        self.shapes.entry(identifier).or_insert(ShapeRef::Port(port));
        if let Some(p) = self.graph.port_mut(port) {
            // Ports without explicit dimensions keep the default size.
            let default = p.bounds;
            p.bounds = rect(
                dto.x.unwrap_or(0.0),
                dto.y.unwrap_or(0.0),
                dto.width.unwrap_or(default.size.width),
                dto.height.unwrap_or(default.size.height),
            );
        }
        for (i, label) in dto.labels.iter().enumerate() {
            self.label(LabelOwner::Port(port), label, &format!("{path}.labels[{i}]"))?;
        }
        Ok(())
    }

    fn label(&mut self, owner: LabelOwner, dto: &LabelDto, path: &str) -> Result<LabelId, DecodeError> {
        let identifier = require_id(&dto.id, path)?;
        self.record(&identifier, path)?;
        let label = self.graph.insert_label(owner, identifier, dto.text.clone());
        if let Some(l) = self.graph.label_mut(label) {
            l.bounds = bounds_from(dto.x, dto.y, dto.width, dto.height);
        }
        Ok(label)
    }

    fn resolve(&self, edge: &str, reference: &str, path: &str) -> Result<ShapeRef, DecodeError> {
        self.shapes
            .get(reference)
            .copied()
            .ok_or_else(|| DecodeError::UnknownShape {
                path: path.to_string(),
                edge: edge.to_string(),
                reference: reference.to_string(),
            })
    }

    fn edge(&mut self, container: NodeId, dto: &EdgeDto, path: &str) -> Result<(), DecodeError> {
        let identifier = require_id(&dto.id, path)?;
        self.record(&identifier, path)?;
        let sources = dto
            .sources
            .iter()
            .map(|s| self.resolve(&identifier, s, path))
            .collect::<Result<Vec<_>, _>>()?;
        let targets = dto
            .targets
            .iter()
            .map(|t| self.resolve(&identifier, t, path))
            .collect::<Result<Vec<_>, _>>()?;

        let mut sections = Vec::with_capacity(dto.sections.len());
        for (i, s) in dto.sections.iter().enumerate() {
            let incoming_shape = match &s.incoming_shape {
                Some(r) => Some(self.resolve(&identifier, r, path)?),
                None => None,
            };
            let outgoing_shape = match &s.outgoing_shape {
                Some(r) => Some(self.resolve(&identifier, r, path)?),
                None => None,
            };
            sections.push(EdgeSection {
                id: s.id.clone().unwrap_or_else(|| format!("{identifier}_s{i}")),
                start: to_point(s.start_point),
                end: to_point(s.end_point),
                bend_points: s.bend_points.iter().copied().map(to_point).collect(),
                incoming_shape,
                outgoing_shape,
            });
        }

        let edge = self
            .graph
            .insert_edge(container, identifier, sources, targets);
        if let Some(e) = self.graph.edge_mut(edge) {
            e.sections = sections;
        }
        for (i, label) in dto.labels.iter().enumerate() {
            self.label(LabelOwner::Edge(edge), label, &format!("{path}.labels[{i}]"))?;
        }
        Ok(())
    }
}

fn to_point(p: PointDto) -> Point {
    point(p.x, p.y)
}

fn from_point(p: Point) -> PointDto {
    PointDto { x: p.x, y: p.y }
}

pub fn encode(graph: &Graph, omit_layout: bool) -> Result<String, EncodeError> {
    encode_with(graph, EncodeOptions { omit_layout })
}

pub fn encode_with(graph: &Graph, options: EncodeOptions) -> Result<String, EncodeError> {
    let root = Encoder { graph, options }.node(graph.root())?;
    Ok(serde_json::to_string_pretty(&root)?)
}

struct Encoder<'g> {
    graph: &'g Graph,
    options: EncodeOptions,
}

type Geometry = (Option<f64>, Option<f64>, Option<f64>, Option<f64>);

impl<'g> Encoder<'g> {
    fn geometry(&self, bounds: &Rect) -> Geometry {
        if self.options.omit_layout {
            return (None, None, None, None);
        }
        let (x, y) = if bounds.origin.x == 0.0 && bounds.origin.y == 0.0 {
            (None, None)
        } else {
            (Some(bounds.origin.x), Some(bounds.origin.y))
        };
        let (w, h) = if bounds.size.width == 0.0 && bounds.size.height == 0.0 {
            (None, None)
        } else {
            (Some(bounds.size.width), Some(bounds.size.height))
        };
        (x, y, w, h)
    }

    fn labels(&self, ids: &[LabelId]) -> Vec<LabelDto> {
        ids.iter()
            .filter_map(|id| self.graph.label(*id))
            .map(|l| {
                let (x, y, width, height) = self.geometry(&l.bounds);
                LabelDto {
                    id: Some(l.identifier().to_string()),
                    text: l.text.clone(),
                    x,
                    y,
                    width,
                    height,
                }
            })
            .collect()
    }

    fn node(&self, id: NodeId) -> Result<NodeDto, EncodeError> {
        let Some(node) = self.graph.node(id) else {
            return Ok(NodeDto::default());
        };
        let (x, y, width, height) = self.geometry(&node.bounds);

        let ports = node
            .ports()
            .iter()
            .filter_map(|p| self.graph.port(*p))
            .map(|p| {
                let (x, y, width, height) = self.geometry(&p.bounds);
                PortDto {
                    id: Some(p.identifier().to_string()),
                    x,
                    y,
                    width,
                    height,
                    labels: self.labels(p.labels()),
                }
            })
            .collect();

        let children = node
            .children()
            .iter()
            .map(|c| self.node(*c))
            .collect::<Result<Vec<_>, _>>()?;
        let edges = node
            .edges()
            .iter()
            .map(|e| self.edge(*e))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NodeDto {
            id: Some(node.identifier().to_string()),
            x,
            y,
            width,
            height,
            layout_options: node.options.to_entries(),
            labels: self.labels(node.labels()),
            ports,
            children,
            edges,
        })
    }

    fn shape_id(&self, edge: &str, shape: ShapeRef, role: &'static str) -> Result<String, EncodeError> {
        self.graph
            .shape_identifier(shape)
            .map(str::to_string)
            .ok_or_else(|| EncodeError::DanglingReference {
                edge: edge.to_string(),
                role,
            })
    }

    fn edge(&self, id: crate::model::EdgeId) -> Result<EdgeDto, EncodeError> {
        let Some(edge) = self.graph.edge(id) else {
            return Ok(EdgeDto::default());
        };
        let identifier = edge.identifier();
        let sources = edge
            .sources()
            .iter()
            .map(|s| self.shape_id(identifier, *s, "source"))
            .collect::<Result<Vec<_>, _>>()?;
        let targets = edge
            .targets()
            .iter()
            .map(|t| self.shape_id(identifier, *t, "target"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut sections = Vec::new();
        if !self.options.omit_layout {
            for s in &edge.sections {
                let incoming_shape = match s.incoming_shape {
                    Some(shape) => Some(self.shape_id(identifier, shape, "section source")?),
                    None => None,
                };
                let outgoing_shape = match s.outgoing_shape {
                    Some(shape) => Some(self.shape_id(identifier, shape, "section target")?),
                    None => None,
                };
                sections.push(SectionDto {
                    id: Some(s.id.clone()),
                    start_point: from_point(s.start),
                    end_point: from_point(s.end),
                    bend_points: s.bend_points.iter().copied().map(from_point).collect(),
                    incoming_shape,
                    outgoing_shape,
                });
            }
        }

        Ok(EdgeDto {
            id: Some(identifier.to_string()),
            sources,
            targets,
            labels: self.labels(edge.labels()),
            sections,
        })
    }
}
