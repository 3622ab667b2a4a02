use crate::error::Result;
use crate::monitor::LayoutMonitor;
use narwhal_core::{Algorithm, Graph};

/// A layout algorithm.
///
/// Engines compute geometry for every node, port, label and edge of the graph. They must leave
/// the graph untouched when they fail, and should poll `monitor` between phases.
pub trait LayoutEngine: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    fn layout(&self, graph: &mut Graph, monitor: &LayoutMonitor) -> Result<()>;
}
