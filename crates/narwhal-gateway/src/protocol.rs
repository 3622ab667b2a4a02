//! Wire protocol: one JSON request per line, one JSON response per line.
//!
//! ```text
//! -> {"id": 1, "method": "createGraph", "params": {}}
//! <- {"id": 1, "result": {"graph": 1, "node": 0}}
//! -> {"id": 2, "method": "createNode", "params": {"parent": {"graph": 1, "node": 0}, "text": "A"}}
//! <- {"id": 2, "result": {"graph": 1, "node": 1}}
//! -> {"id": 3, "method": "layout", "params": {"graph": 9}}
//! <- {"id": 3, "error": {"code": "unknownGraph", "message": "no graph with id 9"}}
//! ```

use narwhal_core::{EdgeId, ElementRef, IdPolicy, LabelId, LabelOwner, NodeId, PortId, ShapeRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Exactly one of `result` and `error` is present. A call without a meaningful value answers
/// `"result": null`, which reads back as `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Value,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, error: WireError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    InvalidRequest,
    UnknownMethod,
    InvalidParams,
    UnknownGraph,
    UnknownElement,
    DuplicateIdentifier,
    Decode,
    Encode,
    Layout,
    Timeout,
    Cancelled,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCode::InvalidRequest => "invalidRequest",
            ErrorCode::UnknownMethod => "unknownMethod",
            ErrorCode::InvalidParams => "invalidParams",
            ErrorCode::UnknownGraph => "unknownGraph",
            ErrorCode::UnknownElement => "unknownElement",
            ErrorCode::DuplicateIdentifier => "duplicateIdentifier",
            ErrorCode::Decode => "decode",
            ErrorCode::Encode => "encode",
            ErrorCode::Layout => "layout",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// A failed call, as sent back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct WireError {
    pub code: ErrorCode,
    pub message: String,
}

impl WireError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }
}

impl From<narwhal_core::Error> for WireError {
    fn from(err: narwhal_core::Error) -> Self {
        let code = match err {
            narwhal_core::Error::UnknownElement { .. } => ErrorCode::UnknownElement,
            narwhal_core::Error::DuplicateIdentifier { .. } => ErrorCode::DuplicateIdentifier,
            narwhal_core::Error::InvalidMinimumSize { .. } => ErrorCode::InvalidParams,
        };
        Self::new(code, err.to_string())
    }
}

impl From<narwhal_core::DecodeError> for WireError {
    fn from(err: narwhal_core::DecodeError) -> Self {
        Self::new(ErrorCode::Decode, err.to_string())
    }
}

impl From<narwhal_core::EncodeError> for WireError {
    fn from(err: narwhal_core::EncodeError) -> Self {
        Self::new(ErrorCode::Encode, err.to_string())
    }
}

impl From<narwhal_layout::LayoutError> for WireError {
    fn from(err: narwhal_layout::LayoutError) -> Self {
        use narwhal_layout::{Interruption, LayoutError};
        let code = match &err {
            LayoutError::Interrupted {
                reason: Interruption::DeadlineExpired,
            } => ErrorCode::Timeout,
            LayoutError::Interrupted {
                reason: Interruption::Cancelled,
            } => ErrorCode::Cancelled,
            _ => ErrorCode::Layout,
        };
        Self::new(code, err.to_string())
    }
}

/// Reference to a graph element: the graph id plus exactly one element index, e.g.
/// `{"graph": 1, "node": 3}` or `{"graph": 1, "port": 0}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Handle {
    pub graph: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<usize>,
}

impl Handle {
    pub fn new(graph: u64, element: impl Into<ElementRef>) -> Self {
        let mut out = Self {
            graph,
            ..Self::default()
        };
        match element.into() {
            ElementRef::Node(n) => out.node = Some(n.index()),
            ElementRef::Port(p) => out.port = Some(p.index()),
            ElementRef::Edge(e) => out.edge = Some(e.index()),
            ElementRef::Label(l) => out.label = Some(l.index()),
        }
        out
    }

    pub fn element(&self) -> Result<ElementRef, WireError> {
        let found = match (self.node, self.port, self.edge, self.label) {
            (Some(n), None, None, None) => Some(ElementRef::Node(NodeId::from_index(n))),
            (None, Some(p), None, None) => Some(ElementRef::Port(PortId::from_index(p))),
            (None, None, Some(e), None) => Some(ElementRef::Edge(EdgeId::from_index(e))),
            (None, None, None, Some(l)) => Some(ElementRef::Label(LabelId::from_index(l))),
            _ => None,
        };
        found.ok_or_else(|| {
            WireError::invalid_params("a handle names exactly one of node, port, edge or label")
        })
    }

    pub fn node(&self) -> Result<NodeId, WireError> {
        match self.element()? {
            ElementRef::Node(n) => Ok(n),
            _ => Err(WireError::invalid_params("expected a node handle")),
        }
    }

    pub fn shape(&self) -> Result<ShapeRef, WireError> {
        match self.element()? {
            ElementRef::Node(n) => Ok(ShapeRef::Node(n)),
            ElementRef::Port(p) => Ok(ShapeRef::Port(p)),
            _ => Err(WireError::invalid_params("expected a node or port handle")),
        }
    }

    pub fn label_owner(&self) -> Result<LabelOwner, WireError> {
        match self.element()? {
            ElementRef::Node(n) => Ok(LabelOwner::Node(n)),
            ElementRef::Port(p) => Ok(LabelOwner::Port(p)),
            ElementRef::Edge(e) => Ok(LabelOwner::Edge(e)),
            ElementRef::Label(_) => Err(WireError::invalid_params("labels cannot own labels")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateGraphParams {
    pub id_policy: Option<IdPolicy>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateNodeParams {
    pub parent: Handle,
    pub text: String,
    #[serde(default)]
    pub id_suffix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetMinSizeParams {
    pub node: Handle,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePortParams {
    pub parent: Handle,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateEdgeParams {
    pub parent: Handle,
    pub rel_id: String,
    #[serde(default)]
    pub source: Option<Handle>,
    #[serde(default)]
    pub target: Option<Handle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateLabelParams {
    pub text: String,
    pub parent: Handle,
    pub rel_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LayoutParams {
    pub graph: u64,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DecodeParams {
    pub json: String,
    #[serde(default)]
    pub id_policy: Option<IdPolicy>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EncodeParams {
    pub graph: u64,
    #[serde(default)]
    pub omit_layout: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdentifierParams {
    pub element: Handle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GraphParams {
    pub graph: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_name_one_element() {
        let h: Handle = serde_json::from_str(r#"{"graph": 2, "port": 5}"#).unwrap();
        assert_eq!(h.element().unwrap(), ElementRef::Port(PortId::from_index(5)));
        assert_eq!(serde_json::to_string(&h).unwrap(), r#"{"graph":2,"port":5}"#);

        let both: Handle = serde_json::from_str(r#"{"graph": 2, "node": 1, "port": 5}"#).unwrap();
        assert_eq!(both.element().unwrap_err().code, ErrorCode::InvalidParams);
        assert!(serde_json::from_str::<Handle>(r#"{"graph": 2, "widget": 1}"#).is_err());
    }

    #[test]
    fn responses_carry_either_result_or_error() {
        let ok = Response::ok(Value::from(1), Value::Null);
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"id":1,"result":null}"#);
        let back: Response = serde_json::from_str(r#"{"id":1,"result":null}"#).unwrap();
        assert_eq!(back, ok);
        assert_eq!(back.result, Some(Value::Null));

        let neither: Response = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert_eq!(neither.result, None);
        assert_eq!(neither.error, None);
        let err = Response::err(
            Value::from("a"),
            WireError::new(ErrorCode::UnknownGraph, "no graph with id 9"),
        );
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"id":"a","error":{"code":"unknownGraph","message":"no graph with id 9"}}"#
        );
    }
}
