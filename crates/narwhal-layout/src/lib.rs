#![forbid(unsafe_code)]

//! Layout invocation for narwhal graphs.
//!
//! A [`LayoutInvoker`] reads the algorithm from the graph's root, picks the matching
//! [`LayoutEngine`] from its [`AlgorithmRegistry`] and runs it, optionally under a
//! [`LayoutMonitor`] carrying a deadline and a [`CancelToken`]. Engines compute into scratch
//! geometry and only write it back when they succeed.

pub mod engine;
pub mod error;
pub mod fixed;
mod geometry;
mod inherit;
pub mod invoker;
pub mod labels;
pub mod layered;
pub mod monitor;
pub mod registry;
pub mod sizing;
pub mod text;

pub use engine::LayoutEngine;
pub use error::{Interruption, LayoutError, Result};
pub use fixed::FixedEngine;
pub use invoker::LayoutInvoker;
pub use layered::LayeredEngine;
pub use monitor::{CancelToken, LayoutMonitor};
pub use registry::AlgorithmRegistry;
pub use text::{DeterministicTextMeasurer, TextMeasurer, TextMetrics, TextStyle};
