//! Fixed engine: keeps the given positions.
//!
//! Labels without a size are measured, configured minimum sizes are enforced, and edges that
//! have no sections get a straight one per (source, target) pair between shape centres.

use crate::engine::LayoutEngine;
use crate::error::Result;
use crate::geometry::{Geometry, section_id};
use crate::labels;
use crate::layered::check_endpoints;
use crate::monitor::LayoutMonitor;
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use narwhal_core::{Algorithm, EdgeSection, Graph};

pub struct FixedEngine {
    measurer: Box<dyn TextMeasurer>,
}

impl Default for FixedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedEngine {
    pub fn new() -> Self {
        Self::with_measurer(DeterministicTextMeasurer::default())
    }

    pub fn with_measurer(measurer: impl TextMeasurer + 'static) -> Self {
        Self {
            measurer: Box::new(measurer),
        }
    }

    fn compute(&self, graph: &Graph, monitor: &LayoutMonitor) -> Result<Geometry> {
        check_endpoints(graph)?;
        let mut geo = Geometry::capture(graph);
        labels::measure(graph, &mut geo, self.measurer.as_ref());

        for (id, node) in graph.nodes() {
            if let Some(minimum) = node.options.minimum_size {
                let bounds = &mut geo.nodes[id.index()];
                bounds.size = bounds.size.max(minimum);
            }
        }
        monitor.check()?;

        for (id, edge) in graph.edges() {
            if !edge.sections.is_empty() {
                continue;
            }
            let origin = geo.absolute(graph, edge.container()).to_vector();
            let targets = edge.targets();
            let mut sections = Vec::new();
            for (si, &source) in edge.sources().iter().enumerate() {
                for (ti, &target) in targets.iter().enumerate() {
                    let (Some(from), Some(to)) = (
                        geo.absolute_shape(graph, source),
                        geo.absolute_shape(graph, target),
                    ) else {
                        continue;
                    };
                    let pair = si * targets.len() + ti;
                    sections.push(EdgeSection {
                        id: section_id(edge.identifier(), pair),
                        start: from.center() - origin,
                        end: to.center() - origin,
                        bend_points: Vec::new(),
                        incoming_shape: Some(source),
                        outgoing_shape: Some(target),
                    });
                }
            }
            geo.sections[id.index()] = sections;
        }
        Ok(geo)
    }
}

impl LayoutEngine for FixedEngine {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Fixed
    }

    fn layout(&self, graph: &mut Graph, monitor: &LayoutMonitor) -> Result<()> {
        let geo = self.compute(graph, monitor)?;
        geo.apply(graph);
        tracing::debug!(nodes = graph.node_count(), "fixed layout applied");
        Ok(())
    }
}
