use crate::error::{LayoutError, Result};
use crate::monitor::LayoutMonitor;
use crate::registry::AlgorithmRegistry;
use narwhal_core::Graph;
use narwhal_core::options::OptionKey;
use std::time::Instant;

/// Runs the engine named by a graph's root.
#[derive(Debug, Clone)]
pub struct LayoutInvoker {
    registry: AlgorithmRegistry,
}

impl Default for LayoutInvoker {
    fn default() -> Self {
        Self::new(AlgorithmRegistry::standard())
    }
}

impl LayoutInvoker {
    pub fn new(registry: AlgorithmRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Lays `graph` out without a deadline. Blocks until the engine returns.
    pub fn layout(&self, graph: &mut Graph) -> Result<()> {
        self.layout_with(graph, &LayoutMonitor::new())
    }

    /// Lays `graph` out, giving up when `monitor` reports a deadline or cancellation. On any
    /// error the graph keeps its previous geometry.
    pub fn layout_with(&self, graph: &mut Graph, monitor: &LayoutMonitor) -> Result<()> {
        let root = graph.root();
        let Some(root_node) = graph.node(root) else {
            return Err(narwhal_core::Error::UnknownElement {
                kind: "node",
                index: root.index(),
            }
            .into());
        };
        let root_id = root_node.identifier().to_string();
        let Some(algorithm) = root_node.options.algorithm else {
            return Err(LayoutError::MissingRootOption {
                root: root_id,
                key: OptionKey::Algorithm.full_key(),
            });
        };
        if root_node.options.hierarchy_handling.is_none() {
            return Err(LayoutError::MissingRootOption {
                root: root_id,
                key: OptionKey::HierarchyHandling.full_key(),
            });
        }
        let Some(engine) = self.registry.get(algorithm) else {
            return Err(LayoutError::AlgorithmNotRegistered { algorithm });
        };
        monitor.check()?;

        let started = Instant::now();
        let result = engine.layout(graph, monitor);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(()) => tracing::debug!(
                root = %root_id,
                %algorithm,
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                elapsed_ms,
                "layout finished"
            ),
            Err(err) => tracing::warn!(root = %root_id, %algorithm, elapsed_ms, error = %err, "layout failed"),
        }
        result
    }
}
