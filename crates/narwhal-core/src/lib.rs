#![forbid(unsafe_code)]

//! Hierarchical graph-with-ports model, identifier allocation and JSON interchange.
//!
//! - [`model`]: nodes, ports, edges and labels owned by a [`Graph`]
//! - [`identity`]: `parent-suffix` identifiers with strict/legacy/auto-suffix collision policies
//! - [`options`]: the closed set of typed layout options
//! - [`codec`]: ELK-style JSON import/export

pub mod codec;
pub mod error;
pub mod geom;
pub mod identity;
pub mod model;
pub mod options;

pub use codec::{DecodeError, DecodeOptions, EncodeError, EncodeOptions, decode, encode};
pub use error::{Error, Result};
pub use identity::{IdAllocator, IdPolicy};
pub use model::{
    Edge, EdgeId, EdgeSection, ElementRef, Graph, Label, LabelId, LabelOwner, Node, NodeId, Port,
    PortId, ShapeRef,
};
pub use options::{
    Algorithm, Direction, HierarchyHandling, LayoutOptions, NodeLabelPlacement, Padding,
    PortLabelPlacement, SizeConstraints,
};
