//! Typed layout options.
//!
//! The interchange format stores options as a map from dotted keys to text values (ELK style).
//! In memory they are a closed set of typed, optional fields. `None` means "not set on this
//! element"; effective defaults are documented on each field and applied by the layout side.

use crate::geom::{Size, size};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

pub const DEFAULT_THOROUGHNESS: u32 = 7;
pub const DEFAULT_NODE_SPACING: f64 = 20.0;
pub const DEFAULT_LAYER_SPACING: f64 = 20.0;
pub const DEFAULT_PADDING: f64 = 12.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptionError {
    #[error("unrecognized layout option `{key}`")]
    UnknownKey { key: String },
    #[error("invalid value for `{key}`: {value}")]
    InvalidValue { key: String, value: String },
}

/// Every option key this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Algorithm,
    HierarchyHandling,
    Thoroughness,
    NodeLabelPlacement,
    PortLabelPlacement,
    PortLabelsNextToPort,
    SizeConstraints,
    MinimumSize,
    Direction,
    NodeSpacing,
    LayerSpacing,
    Padding,
}

impl OptionKey {
    pub const ALL: [OptionKey; 12] = [
        OptionKey::Algorithm,
        OptionKey::HierarchyHandling,
        OptionKey::Thoroughness,
        OptionKey::NodeLabelPlacement,
        OptionKey::PortLabelPlacement,
        OptionKey::PortLabelsNextToPort,
        OptionKey::SizeConstraints,
        OptionKey::MinimumSize,
        OptionKey::Direction,
        OptionKey::NodeSpacing,
        OptionKey::LayerSpacing,
        OptionKey::Padding,
    ];

    pub fn full_key(self) -> &'static str {
        match self {
            OptionKey::Algorithm => "org.eclipse.elk.algorithm",
            OptionKey::HierarchyHandling => "org.eclipse.elk.hierarchyHandling",
            OptionKey::Thoroughness => "org.eclipse.elk.layered.thoroughness",
            OptionKey::NodeLabelPlacement => "org.eclipse.elk.nodeLabels.placement",
            OptionKey::PortLabelPlacement => "org.eclipse.elk.portLabels.placement",
            OptionKey::PortLabelsNextToPort => "org.eclipse.elk.portLabels.nextToPortIfPossible",
            OptionKey::SizeConstraints => "org.eclipse.elk.nodeSize.constraints",
            OptionKey::MinimumSize => "org.eclipse.elk.nodeSize.minimum",
            OptionKey::Direction => "org.eclipse.elk.direction",
            OptionKey::NodeSpacing => "org.eclipse.elk.spacing.nodeNode",
            OptionKey::LayerSpacing => "org.eclipse.elk.layered.spacing.nodeNodeBetweenLayers",
            OptionKey::Padding => "org.eclipse.elk.padding",
        }
    }

    /// Resolves a key given either in full or as a dotted suffix of the full key.
    ///
    /// Ambiguous suffixes (e.g. `placement`) resolve to nothing.
    pub fn resolve(key: &str) -> Option<OptionKey> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        let mut found: Option<OptionKey> = None;
        for candidate in Self::ALL {
            let full = candidate.full_key();
            let matches = full == key
                || (full.len() > key.len()
                    && full.ends_with(key)
                    && full.as_bytes()[full.len() - key.len() - 1] == b'.');
            if !matches {
                continue;
            }
            if full == key {
                return Some(candidate);
            }
            if found.is_some() {
                return None;
            }
            found = Some(candidate);
        }
        found
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    Layered,
    Fixed,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Layered, Algorithm::Fixed];

    pub fn id(self) -> &'static str {
        match self {
            Algorithm::Layered => "org.eclipse.elk.layered",
            Algorithm::Fixed => "org.eclipse.elk.fixed",
        }
    }

    /// Accepts the full id or its last segment (`layered`, `fixed`).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|a| {
            let id = a.id();
            id == text || id.rsplit('.').next() == Some(text)
        })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl serde::Serialize for Algorithm {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> serde::Deserialize<'de> for Algorithm {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Algorithm::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown layout algorithm `{raw}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HierarchyHandling {
    /// Use the parent's mode; at the root this means [`HierarchyHandling::SeparateChildren`].
    #[default]
    Inherit,
    IncludeChildren,
    SeparateChildren,
}

impl HierarchyHandling {
    fn as_str(self) -> &'static str {
        match self {
            HierarchyHandling::Inherit => "INHERIT",
            HierarchyHandling::IncludeChildren => "INCLUDE_CHILDREN",
            HierarchyHandling::SeparateChildren => "SEPARATE_CHILDREN",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "INHERIT" => Some(HierarchyHandling::Inherit),
            "INCLUDE_CHILDREN" => Some(HierarchyHandling::IncludeChildren),
            "SEPARATE_CHILDREN" => Some(HierarchyHandling::SeparateChildren),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HorizontalPlacement {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerticalPlacement {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelSide {
    Inside,
    Outside,
}

/// Node label placement. An empty placement means labels keep their given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeLabelPlacement {
    pub horizontal: Option<HorizontalPlacement>,
    pub vertical: Option<VerticalPlacement>,
    pub side: Option<LabelSide>,
}

impl NodeLabelPlacement {
    pub fn inside_top_center() -> Self {
        Self {
            horizontal: Some(HorizontalPlacement::Center),
            vertical: Some(VerticalPlacement::Top),
            side: Some(LabelSide::Inside),
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.horizontal.is_none() && self.vertical.is_none() && self.side.is_none()
    }

    fn tokens(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        match self.horizontal {
            Some(HorizontalPlacement::Left) => out.push("H_LEFT"),
            Some(HorizontalPlacement::Center) => out.push("H_CENTER"),
            Some(HorizontalPlacement::Right) => out.push("H_RIGHT"),
            None => {}
        }
        match self.vertical {
            Some(VerticalPlacement::Top) => out.push("V_TOP"),
            Some(VerticalPlacement::Center) => out.push("V_CENTER"),
            Some(VerticalPlacement::Bottom) => out.push("V_BOTTOM"),
            None => {}
        }
        match self.side {
            Some(LabelSide::Inside) => out.push("INSIDE"),
            Some(LabelSide::Outside) => out.push("OUTSIDE"),
            None => {}
        }
        out
    }

    fn parse(text: &str) -> Option<Self> {
        let mut out = Self::default();
        for token in parse_set(text)? {
            match token {
                "H_LEFT" => set_once(&mut out.horizontal, HorizontalPlacement::Left)?,
                "H_CENTER" => set_once(&mut out.horizontal, HorizontalPlacement::Center)?,
                "H_RIGHT" => set_once(&mut out.horizontal, HorizontalPlacement::Right)?,
                "V_TOP" => set_once(&mut out.vertical, VerticalPlacement::Top)?,
                "V_CENTER" => set_once(&mut out.vertical, VerticalPlacement::Center)?,
                "V_BOTTOM" => set_once(&mut out.vertical, VerticalPlacement::Bottom)?,
                "INSIDE" => set_once(&mut out.side, LabelSide::Inside)?,
                "OUTSIDE" => set_once(&mut out.side, LabelSide::Outside)?,
                _ => return None,
            }
        }
        Some(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PortLabelPlacement {
    Inside,
    #[default]
    Outside,
    Fixed,
}

impl PortLabelPlacement {
    fn as_str(self) -> &'static str {
        match self {
            PortLabelPlacement::Inside => "INSIDE",
            PortLabelPlacement::Outside => "OUTSIDE",
            PortLabelPlacement::Fixed => "FIXED",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        // Accept both the single-value form and the newer set form (`[INSIDE]`).
        let text = text.trim();
        let inner = match parse_set(text) {
            Some(tokens) if tokens.len() == 1 => tokens[0],
            Some(_) => return None,
            None => text,
        };
        match inner {
            "INSIDE" => Some(PortLabelPlacement::Inside),
            "OUTSIDE" => Some(PortLabelPlacement::Outside),
            "FIXED" => Some(PortLabelPlacement::Fixed),
            _ => None,
        }
    }
}

/// How a node's final size is derived. All flags off means the node keeps its given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SizeConstraints {
    pub ports: bool,
    pub port_labels: bool,
    pub node_labels: bool,
    pub minimum_size: bool,
}

impl SizeConstraints {
    pub fn minimum_size_with_ports() -> Self {
        Self {
            ports: true,
            minimum_size: true,
            ..Self::default()
        }
    }

    pub fn is_fixed(&self) -> bool {
        !(self.ports || self.port_labels || self.node_labels || self.minimum_size)
    }

    fn tokens(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.ports {
            out.push("PORTS");
        }
        if self.port_labels {
            out.push("PORT_LABELS");
        }
        if self.node_labels {
            out.push("NODE_LABELS");
        }
        if self.minimum_size {
            out.push("MINIMUM_SIZE");
        }
        out
    }

    fn parse(text: &str) -> Option<Self> {
        let mut out = Self::default();
        for token in parse_set(text)? {
            match token {
                "PORTS" => out.ports = true,
                "PORT_LABELS" => out.port_labels = true,
                "NODE_LABELS" => out.node_labels = true,
                "MINIMUM_SIZE" => out.minimum_size = true,
                _ => return None,
            }
        }
        Some(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Right,
    Left,
    Down,
    Up,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }

    fn as_str(self) -> &'static str {
        match self {
            Direction::Right => "RIGHT",
            Direction::Left => "LEFT",
            Direction::Down => "DOWN",
            Direction::Up => "UP",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "RIGHT" => Some(Direction::Right),
            "LEFT" => Some(Direction::Left),
            "DOWN" => Some(Direction::Down),
            "UP" => Some(Direction::Up),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }

    fn to_text(self) -> String {
        format!(
            "[top={},left={},bottom={},right={}]",
            fmt_f64(self.top),
            fmt_f64(self.left),
            fmt_f64(self.bottom),
            fmt_f64(self.right)
        )
    }

    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(v) = parse_f64(text) {
            return Some(Self::uniform(v));
        }
        let inner = text.strip_prefix('[')?.strip_suffix(']')?;
        let mut out = Self::uniform(0.0);
        for part in inner.split(',') {
            let (name, value) = part.split_once('=')?;
            let value = parse_f64(value)?;
            match name.trim() {
                "top" => out.top = value,
                "left" => out.left = value,
                "bottom" => out.bottom = value,
                "right" => out.right = value,
                _ => return None,
            }
        }
        Some(out)
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::uniform(DEFAULT_PADDING)
    }
}

/// Layout options attached to a single node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutOptions {
    /// Layout algorithm; effective default [`Algorithm::Layered`]. Required on the root before
    /// layout.
    pub algorithm: Option<Algorithm>,
    /// Required on the root before layout; effective default [`HierarchyHandling::Inherit`].
    pub hierarchy_handling: Option<HierarchyHandling>,
    /// Effort level of the layered engine; default [`DEFAULT_THOROUGHNESS`].
    pub thoroughness: Option<u32>,
    /// Default: labels keep their position.
    pub node_label_placement: Option<NodeLabelPlacement>,
    /// Default: [`PortLabelPlacement::Outside`].
    pub port_label_placement: Option<PortLabelPlacement>,
    /// Default: `false`.
    pub port_labels_next_to_port: Option<bool>,
    /// Default: fixed size (no constraints).
    pub size_constraints: Option<SizeConstraints>,
    /// Default: none.
    pub minimum_size: Option<Size>,
    /// Inherited; default [`Direction::Right`].
    pub direction: Option<Direction>,
    /// Inherited; default [`DEFAULT_NODE_SPACING`].
    pub node_spacing: Option<f64>,
    /// Inherited; default [`DEFAULT_LAYER_SPACING`].
    pub layer_spacing: Option<f64>,
    /// Inherited; default [`DEFAULT_PADDING`] on every side.
    pub padding: Option<Padding>,
}

impl LayoutOptions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Parses one interchange entry and stores it on `self`.
    pub fn set_entry(&mut self, key: &str, value: &Value) -> Result<OptionKey, OptionError> {
        let Some(option) = OptionKey::resolve(key) else {
            return Err(OptionError::UnknownKey {
                key: key.to_string(),
            });
        };
        let text = value_text(value).ok_or_else(|| invalid(key, value))?;
        let bad = || invalid(key, value);
        match option {
            OptionKey::Algorithm => self.algorithm = Some(Algorithm::parse(&text).ok_or_else(bad)?),
            OptionKey::HierarchyHandling => {
                self.hierarchy_handling = Some(HierarchyHandling::parse(&text).ok_or_else(bad)?)
            }
            OptionKey::Thoroughness => {
                self.thoroughness = Some(text.trim().parse::<u32>().map_err(|_| bad())?)
            }
            OptionKey::NodeLabelPlacement => {
                self.node_label_placement = Some(NodeLabelPlacement::parse(&text).ok_or_else(bad)?)
            }
            OptionKey::PortLabelPlacement => {
                self.port_label_placement = Some(PortLabelPlacement::parse(&text).ok_or_else(bad)?)
            }
            OptionKey::PortLabelsNextToPort => {
                self.port_labels_next_to_port = Some(match text.trim() {
                    "true" => true,
                    "false" => false,
                    _ => return Err(bad()),
                })
            }
            OptionKey::SizeConstraints => {
                self.size_constraints = Some(SizeConstraints::parse(&text).ok_or_else(bad)?)
            }
            OptionKey::MinimumSize => self.minimum_size = Some(parse_vector(&text).ok_or_else(bad)?),
            OptionKey::Direction => self.direction = Some(Direction::parse(&text).ok_or_else(bad)?),
            OptionKey::NodeSpacing => {
                self.node_spacing = Some(parse_non_negative(&text).ok_or_else(bad)?)
            }
            OptionKey::LayerSpacing => {
                self.layer_spacing = Some(parse_non_negative(&text).ok_or_else(bad)?)
            }
            OptionKey::Padding => self.padding = Some(Padding::parse(&text).ok_or_else(bad)?),
        }
        Ok(option)
    }

    /// Builds options from interchange entries; the first bad entry fails the whole map.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a String, &'a Value)>,
    ) -> Result<Self, OptionError> {
        let mut out = Self::default();
        for (key, value) in entries {
            out.set_entry(key, value)?;
        }
        Ok(out)
    }

    /// Interchange entries for every option that is set, keyed by full key, in a fixed order.
    pub fn to_entries(&self) -> IndexMap<String, Value> {
        let mut out = IndexMap::new();
        let mut put = |key: OptionKey, text: String| {
            out.insert(key.full_key().to_string(), Value::String(text));
        };
        if let Some(v) = self.algorithm {
            put(OptionKey::Algorithm, v.id().to_string());
        }
        if let Some(v) = self.hierarchy_handling {
            put(OptionKey::HierarchyHandling, v.as_str().to_string());
        }
        if let Some(v) = self.thoroughness {
            put(OptionKey::Thoroughness, v.to_string());
        }
        if let Some(v) = self.node_label_placement {
            put(OptionKey::NodeLabelPlacement, format_set(&v.tokens()));
        }
        if let Some(v) = self.port_label_placement {
            put(OptionKey::PortLabelPlacement, v.as_str().to_string());
        }
        if let Some(v) = self.port_labels_next_to_port {
            put(OptionKey::PortLabelsNextToPort, v.to_string());
        }
        if let Some(v) = self.size_constraints {
            put(OptionKey::SizeConstraints, format_set(&v.tokens()));
        }
        if let Some(v) = self.minimum_size {
            put(
                OptionKey::MinimumSize,
                format!("({},{})", fmt_f64(v.width), fmt_f64(v.height)),
            );
        }
        if let Some(v) = self.direction {
            put(OptionKey::Direction, v.as_str().to_string());
        }
        if let Some(v) = self.node_spacing {
            put(OptionKey::NodeSpacing, fmt_f64(v));
        }
        if let Some(v) = self.layer_spacing {
            put(OptionKey::LayerSpacing, fmt_f64(v));
        }
        if let Some(v) = self.padding {
            put(OptionKey::Padding, v.to_text());
        }
        out
    }
}

fn invalid(key: &str, value: &Value) -> OptionError {
    OptionError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> Option<()> {
    if slot.is_some() {
        return None;
    }
    *slot = Some(value);
    Some(())
}

fn parse_set(text: &str) -> Option<Vec<&str>> {
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
    Some(
        inner
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect(),
    )
}

fn format_set(tokens: &[&str]) -> String {
    format!("[{}]", tokens.join(", "))
}

fn parse_f64(text: &str) -> Option<f64> {
    let v = text.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

fn parse_non_negative(text: &str) -> Option<f64> {
    parse_f64(text).filter(|v| *v >= 0.0)
}

fn parse_vector(text: &str) -> Option<Size> {
    let text = text.trim();
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text);
    let (w, h) = inner.split_once(',')?;
    Some(size(parse_non_negative(w)?, parse_non_negative(h)?))
}

/// Formats like Java's `Double.toString` for the common cases (`200.0`, `0.5`).
pub(crate) fn fmt_f64(v: f64) -> String {
    format!("{v:?}")
}
