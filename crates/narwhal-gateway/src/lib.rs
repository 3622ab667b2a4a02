#![forbid(unsafe_code)]

//! Line-delimited JSON gateway over TCP for building, laying out and exchanging graphs.
//!
//! Each request names a method of the graph model, the JSON codec or the layout invoker; see
//! [`protocol`] for the wire format.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod server;
pub mod store;

pub use config::GatewayConfig;
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use protocol::{ErrorCode, Handle, Request, Response, WireError};
pub use server::{GatewayHandle, GatewayService};
pub use store::GraphStore;
