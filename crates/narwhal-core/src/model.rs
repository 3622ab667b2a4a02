//! In-memory graph model: nodes own children, ports, labels and contained edges.
//!
//! Elements live in per-kind arenas inside [`Graph`] and are addressed by copyable handles.
//! Edges refer to their endpoints by handle and never own them.

use crate::error::{Error, Result};
use crate::geom::{Point, Rect, rect, size};
use crate::identity::{IdAllocator, IdPolicy};
use crate::options::{
    Algorithm, HierarchyHandling, LayoutOptions, NodeLabelPlacement, PortLabelPlacement,
    SizeConstraints,
};

pub const ROOT_IDENTIFIER: &str = "root";
pub const DEFAULT_PORT_SIZE: f64 = 10.0;
pub const HIGH_EFFORT_THOROUGHNESS: u32 = 7;

macro_rules! handle {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub const KIND: &'static str = $kind;

            pub fn from_index(index: usize) -> Self {
                Self(index)
            }

            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(NodeId, "node");
handle!(PortId, "port");
handle!(EdgeId, "edge");
handle!(LabelId, "label");

/// Anything an edge may start or end at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeRef {
    Node(NodeId),
    Port(PortId),
}

impl From<NodeId> for ShapeRef {
    fn from(value: NodeId) -> Self {
        ShapeRef::Node(value)
    }
}

impl From<PortId> for ShapeRef {
    fn from(value: PortId) -> Self {
        ShapeRef::Port(value)
    }
}

/// Anything a label can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelOwner {
    Node(NodeId),
    Port(PortId),
    Edge(EdgeId),
}

impl From<NodeId> for LabelOwner {
    fn from(value: NodeId) -> Self {
        LabelOwner::Node(value)
    }
}

impl From<PortId> for LabelOwner {
    fn from(value: PortId) -> Self {
        LabelOwner::Port(value)
    }
}

impl From<EdgeId> for LabelOwner {
    fn from(value: EdgeId) -> Self {
        LabelOwner::Edge(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Node(NodeId),
    Port(PortId),
    Edge(EdgeId),
    Label(LabelId),
}

impl From<NodeId> for ElementRef {
    fn from(value: NodeId) -> Self {
        ElementRef::Node(value)
    }
}

impl From<PortId> for ElementRef {
    fn from(value: PortId) -> Self {
        ElementRef::Port(value)
    }
}

impl From<EdgeId> for ElementRef {
    fn from(value: EdgeId) -> Self {
        ElementRef::Edge(value)
    }
}

impl From<LabelId> for ElementRef {
    fn from(value: LabelId) -> Self {
        ElementRef::Label(value)
    }
}

impl From<ShapeRef> for ElementRef {
    fn from(value: ShapeRef) -> Self {
        match value {
            ShapeRef::Node(n) => ElementRef::Node(n),
            ShapeRef::Port(p) => ElementRef::Port(p),
        }
    }
}

impl From<LabelOwner> for ElementRef {
    fn from(value: LabelOwner) -> Self {
        match value {
            LabelOwner::Node(n) => ElementRef::Node(n),
            LabelOwner::Port(p) => ElementRef::Port(p),
            LabelOwner::Edge(e) => ElementRef::Edge(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    identifier: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    ports: Vec<PortId>,
    labels: Vec<LabelId>,
    edges: Vec<EdgeId>,
    pub options: LayoutOptions,
    /// Position relative to the parent's top-left corner.
    pub bounds: Rect,
}

impl Node {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    pub fn labels(&self) -> &[LabelId] {
        &self.labels
    }

    /// Edges contained in (scoped to) this node.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }
}

#[derive(Debug, Clone)]
pub struct Port {
    identifier: String,
    node: NodeId,
    labels: Vec<LabelId>,
    /// Position relative to the owning node's top-left corner.
    pub bounds: Rect,
}

impl Port {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn labels(&self) -> &[LabelId] {
        &self.labels
    }
}

/// One routed piece of an edge, in the coordinate system of the edge's container.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSection {
    pub id: String,
    pub start: Point,
    pub end: Point,
    pub bend_points: Vec<Point>,
    pub incoming_shape: Option<ShapeRef>,
    pub outgoing_shape: Option<ShapeRef>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    identifier: String,
    container: NodeId,
    sources: Vec<ShapeRef>,
    targets: Vec<ShapeRef>,
    labels: Vec<LabelId>,
    pub sections: Vec<EdgeSection>,
}

impl Edge {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn sources(&self) -> &[ShapeRef] {
        &self.sources
    }

    pub fn targets(&self) -> &[ShapeRef] {
        &self.targets
    }

    pub fn labels(&self) -> &[LabelId] {
        &self.labels
    }
}

#[derive(Debug, Clone)]
pub struct Label {
    identifier: String,
    owner: LabelOwner,
    pub text: String,
    /// Position relative to the owner (for edge labels: relative to the edge's container).
    pub bounds: Rect,
}

impl Label {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn owner(&self) -> LabelOwner {
        self.owner
    }
}

/// A hierarchical graph. The root node is created with the graph and owns everything else.
#[derive(Debug, Clone)]
pub struct Graph {
    ids: IdAllocator,
    nodes: Vec<Node>,
    ports: Vec<Port>,
    edges: Vec<Edge>,
    labels: Vec<Label>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

fn element_defaults() -> LayoutOptions {
    LayoutOptions {
        node_label_placement: Some(NodeLabelPlacement::inside_top_center()),
        port_label_placement: Some(PortLabelPlacement::Inside),
        port_labels_next_to_port: Some(true),
        size_constraints: Some(SizeConstraints::minimum_size_with_ports()),
        ..LayoutOptions::default()
    }
}

impl Graph {
    /// A fresh graph configured for layered layout with hierarchy handling, using the
    /// legacy (unchecked) identifier policy.
    pub fn new() -> Self {
        Self::with_id_policy(IdPolicy::Unchecked)
    }

    pub fn with_id_policy(policy: IdPolicy) -> Self {
        let mut graph = Self::bare(policy);
        let root = graph.push_root(ROOT_IDENTIFIER.to_string());
        graph.nodes[root.0].options = LayoutOptions {
            algorithm: Some(Algorithm::Layered),
            hierarchy_handling: Some(HierarchyHandling::IncludeChildren),
            thoroughness: Some(HIGH_EFFORT_THOROUGHNESS),
            ..element_defaults()
        };
        graph
    }

    fn bare(policy: IdPolicy) -> Self {
        Self {
            ids: IdAllocator::new(policy),
            nodes: Vec::new(),
            ports: Vec::new(),
            edges: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn push_root(&mut self, identifier: String) -> NodeId {
        // An empty allocator never rejects.
        let _ = self.ids.record(&identifier);
        self.nodes.push(Node {
            identifier,
            parent: None,
            children: Vec::new(),
            ports: Vec::new(),
            labels: Vec::new(),
            edges: Vec::new(),
            options: LayoutOptions::default(),
            bounds: Rect::zero(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// An unconfigured graph whose root has the given identifier (used by decoding).
    pub fn with_root(identifier: impl Into<String>, policy: IdPolicy) -> Self {
        let mut graph = Self::bare(policy);
        graph.push_root(identifier.into());
        graph
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn id_allocator(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn id_policy(&self) -> IdPolicy {
        self.ids.policy()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.0)
    }

    pub fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.ports.get_mut(id.0)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.0)
    }

    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.get(id.0)
    }

    pub fn label_mut(&mut self, id: LabelId) -> Option<&mut Label> {
        self.labels.get_mut(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn ports(&self) -> impl Iterator<Item = (PortId, &Port)> + '_ {
        self.ports.iter().enumerate().map(|(i, p)| (PortId(i), p))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeId(i), e))
    }

    pub fn labels(&self) -> impl Iterator<Item = (LabelId, &Label)> + '_ {
        self.labels.iter().enumerate().map(|(i, l)| (LabelId(i), l))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn shape_identifier(&self, shape: ShapeRef) -> Option<&str> {
        match shape {
            ShapeRef::Node(n) => self.node(n).map(Node::identifier),
            ShapeRef::Port(p) => self.port(p).map(Port::identifier),
        }
    }

    pub fn identifier(&self, element: ElementRef) -> Option<&str> {
        match element {
            ElementRef::Node(n) => self.node(n).map(Node::identifier),
            ElementRef::Port(p) => self.port(p).map(Port::identifier),
            ElementRef::Edge(e) => self.edge(e).map(Edge::identifier),
            ElementRef::Label(l) => self.label(l).map(Label::identifier),
        }
    }

    /// The node a shape belongs to: the node itself, or the port's owner.
    pub fn shape_node(&self, shape: ShapeRef) -> Option<NodeId> {
        match shape {
            ShapeRef::Node(n) => self.node(n).map(|_| n),
            ShapeRef::Port(p) => self.port(p).map(Port::node),
        }
    }

    /// First element (nodes, then ports, edges, labels; each in creation order) carrying
    /// `identifier`.
    pub fn find(&self, identifier: &str) -> Option<ElementRef> {
        if let Some(i) = self.nodes.iter().position(|n| n.identifier == identifier) {
            return Some(ElementRef::Node(NodeId(i)));
        }
        if let Some(i) = self.ports.iter().position(|p| p.identifier == identifier) {
            return Some(ElementRef::Port(PortId(i)));
        }
        if let Some(i) = self.edges.iter().position(|e| e.identifier == identifier) {
            return Some(ElementRef::Edge(EdgeId(i)));
        }
        self.labels
            .iter()
            .position(|l| l.identifier == identifier)
            .map(|i| ElementRef::Label(LabelId(i)))
    }

    /// `node` and all of its descendants, parents before children.
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.node(node).is_none() {
            return out;
        }
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            for c in self.nodes[n.0].children.iter().rev() {
                stack.push(*c);
            }
        }
        out
    }

    /// True when `ancestor` is `node` or one of its parents.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.node(n).and_then(Node::parent);
        }
        false
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        if self.node(id).is_none() {
            return Err(Error::UnknownElement {
                kind: NodeId::KIND,
                index: id.0,
            });
        }
        Ok(())
    }

    /// Strict graphs must not end up with a shape whose implicit label was rejected.
    fn check_label_slot(&self, parent: NodeId, suffix: &str) -> Result<()> {
        if self.ids.policy() != IdPolicy::Strict {
            return Ok(());
        }
        let shape = IdAllocator::derive(&self.nodes[parent.0].identifier, suffix);
        let label = IdAllocator::derive(&shape, "label");
        if self.ids.contains(&label) {
            return Err(Error::DuplicateIdentifier { identifier: label });
        }
        Ok(())
    }

    fn owner_identifier(&self, owner: LabelOwner) -> Result<&str> {
        let (kind, index) = match owner {
            LabelOwner::Node(n) => (NodeId::KIND, n.0),
            LabelOwner::Port(p) => (PortId::KIND, p.0),
            LabelOwner::Edge(e) => (EdgeId::KIND, e.0),
        };
        self.identifier(owner.into())
            .ok_or(Error::UnknownElement { kind, index })
    }

    pub fn create_node(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        self.create_node_with_suffix(parent, text, "")
    }

    /// Creates a child node with identifier `parent-<text><id_suffix>` and a label `text`.
    pub fn create_node_with_suffix(
        &mut self,
        parent: NodeId,
        text: &str,
        id_suffix: &str,
    ) -> Result<NodeId> {
        self.check_node(parent)?;
        let suffix = format!("{text}{id_suffix}");
        self.check_label_slot(parent, &suffix)?;
        let identifier = self.ids.allocate(&self.nodes[parent.0].identifier, &suffix)?;
        let node = self.insert_node(parent, identifier);
        self.nodes[node.0].options = element_defaults();
        self.create_label(text, node, "label")?;
        Ok(node)
    }

    /// Overwrites the size constraints with minimum-size-with-ports and sets the minimum.
    ///
    /// Negative or non-finite sides are rejected; the codec could not read them back.
    pub fn set_min_size(&mut self, node: NodeId, width: f64, height: f64) -> Result<()> {
        self.check_node(node)?;
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(width) || !valid(height) {
            return Err(Error::InvalidMinimumSize { width, height });
        }
        let options = &mut self.nodes[node.0].options;
        options.size_constraints = Some(SizeConstraints::minimum_size_with_ports());
        options.minimum_size = Some(size(width, height));
        Ok(())
    }

    /// Creates a 10×10 port with identifier `parent-<text>` and a label `text`.
    pub fn create_port(&mut self, parent: NodeId, text: &str) -> Result<PortId> {
        self.check_node(parent)?;
        self.check_label_slot(parent, text)?;
        let identifier = self.ids.allocate(&self.nodes[parent.0].identifier, text)?;
        let port = self.insert_port(parent, identifier);
        self.create_label(text, port, "label")?;
        Ok(port)
    }

    pub fn create_edge(&mut self, parent: NodeId, rel_id: &str) -> Result<EdgeId> {
        self.check_node(parent)?;
        let identifier = self.ids.allocate(&self.nodes[parent.0].identifier, rel_id)?;
        Ok(self.insert_edge(parent, identifier, Vec::new(), Vec::new()))
    }

    /// Creates an edge from `source` to `target`. Endpoints are not validated.
    pub fn create_edge_between(
        &mut self,
        parent: NodeId,
        rel_id: &str,
        source: impl Into<ShapeRef>,
        target: impl Into<ShapeRef>,
    ) -> Result<EdgeId> {
        let edge = self.create_edge(parent, rel_id)?;
        let e = &mut self.edges[edge.0];
        e.sources.push(source.into());
        e.targets.push(target.into());
        Ok(edge)
    }

    pub fn create_label(
        &mut self,
        text: &str,
        parent: impl Into<LabelOwner>,
        rel_id: &str,
    ) -> Result<LabelId> {
        let owner = parent.into();
        let parent_identifier = self.owner_identifier(owner)?.to_string();
        let identifier = self.ids.allocate(&parent_identifier, rel_id)?;
        Ok(self.insert_label(owner, identifier, text.to_string()))
    }

    /// Records a pre-formed identifier verbatim (decoding). Strict graphs reject duplicates.
    pub fn record_identifier(&mut self, identifier: &str) -> Result<()> {
        self.ids.record(identifier)
    }

    pub(crate) fn insert_node(&mut self, parent: NodeId, identifier: String) -> NodeId {
        self.nodes.push(Node {
            identifier,
            parent: Some(parent),
            children: Vec::new(),
            ports: Vec::new(),
            labels: Vec::new(),
            edges: Vec::new(),
            options: LayoutOptions::default(),
            bounds: Rect::zero(),
        });
        let id = NodeId(self.nodes.len() - 1);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn insert_port(&mut self, node: NodeId, identifier: String) -> PortId {
        self.ports.push(Port {
            identifier,
            node,
            labels: Vec::new(),
            bounds: rect(0.0, 0.0, DEFAULT_PORT_SIZE, DEFAULT_PORT_SIZE),
        });
        let id = PortId(self.ports.len() - 1);
        self.nodes[node.0].ports.push(id);
        id
    }

    pub(crate) fn insert_edge(
        &mut self,
        container: NodeId,
        identifier: String,
        sources: Vec<ShapeRef>,
        targets: Vec<ShapeRef>,
    ) -> EdgeId {
        self.edges.push(Edge {
            identifier,
            container,
            sources,
            targets,
            labels: Vec::new(),
            sections: Vec::new(),
        });
        let id = EdgeId(self.edges.len() - 1);
        self.nodes[container.0].edges.push(id);
        id
    }

    pub(crate) fn insert_label(
        &mut self,
        owner: LabelOwner,
        identifier: String,
        text: String,
    ) -> LabelId {
        self.labels.push(Label {
            identifier,
            owner,
            text,
            bounds: Rect::zero(),
        });
        let id = LabelId(self.labels.len() - 1);
        match owner {
            LabelOwner::Node(n) => self.nodes[n.0].labels.push(id),
            LabelOwner::Port(p) => self.ports[p.0].labels.push(id),
            LabelOwner::Edge(e) => self.edges[e.0].labels.push(id),
        }
        id
    }
}
