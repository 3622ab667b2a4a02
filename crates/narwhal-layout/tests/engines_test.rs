use narwhal_core::geom::{point, rect, size};
use narwhal_core::{Algorithm, Graph};
use narwhal_layout::{
    AlgorithmRegistry, DeterministicTextMeasurer, FixedEngine, LayoutEngine, LayoutInvoker,
    LayoutMonitor, Result, TextMeasurer, TextMetrics, TextStyle,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn standard_registry_knows_both_engines() {
    let registry = AlgorithmRegistry::standard();
    assert_eq!(registry.algorithms(), vec![Algorithm::Layered, Algorithm::Fixed]);
    assert_eq!(registry.len(), 2);
    assert!(AlgorithmRegistry::new().is_empty());
    assert!(!AlgorithmRegistry::with_algorithms(&[Algorithm::Fixed]).contains(Algorithm::Layered));
}

struct Counting {
    calls: Arc<AtomicUsize>,
}

impl LayoutEngine for Counting {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Layered
    }

    fn layout(&self, graph: &mut Graph, _monitor: &LayoutMonitor) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let root = graph.root();
        graph.node_mut(root).unwrap().bounds = rect(0.0, 0.0, 1.0, 1.0);
        Ok(())
    }
}

#[test]
fn registered_engines_replace_the_builtin_ones() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = AlgorithmRegistry::standard();
    let replaced = registry.register(Counting {
        calls: calls.clone(),
    });
    assert!(replaced.is_some());

    let mut g = Graph::new();
    LayoutInvoker::new(registry).layout(&mut g).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(g.node(g.root()).unwrap().bounds.size, size(1.0, 1.0));
}

#[test]
fn fixed_engine_keeps_positions_and_draws_straight_edges() {
    let mut g = Graph::new();
    let root = g.root();
    g.node_mut(root).unwrap().options.algorithm = Some(Algorithm::Fixed);
    let a = g.create_node(root, "A").unwrap();
    let b = g.create_node(root, "B").unwrap();
    g.node_mut(a).unwrap().bounds = rect(10.0, 10.0, 20.0, 20.0);
    g.node_mut(b).unwrap().bounds = rect(100.0, 50.0, 20.0, 20.0);
    g.set_min_size(b, 40.0, 0.0).unwrap();
    let e = g.create_edge_between(root, "e", a, b).unwrap();

    LayoutInvoker::default().layout(&mut g).unwrap();

    assert_eq!(g.node(a).unwrap().bounds, rect(10.0, 10.0, 20.0, 20.0));
    assert_eq!(g.node(b).unwrap().bounds, rect(100.0, 50.0, 40.0, 20.0));
    let sections = &g.edge(e).unwrap().sections;
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].start, point(20.0, 20.0));
    assert_eq!(sections[0].end, point(120.0, 60.0));
    assert!(sections[0].bend_points.is_empty());

    let label = g.node(a).unwrap().labels()[0];
    assert!(g.label(label).unwrap().bounds.size.width > 0.0);
}

struct Wide;

impl TextMeasurer for Wide {
    fn measure(&self, text: &str, _style: &TextStyle) -> TextMetrics {
        TextMetrics {
            width: 100.0 * text.len() as f64,
            height: 10.0,
            line_count: 1,
        }
    }
}

#[test]
fn engines_use_the_configured_measurer() {
    let mut g = Graph::new();
    let root = g.root();
    g.node_mut(root).unwrap().options.algorithm = Some(Algorithm::Fixed);
    let a = g.create_node(root, "A").unwrap();
    let mut registry = AlgorithmRegistry::new();
    registry.register(FixedEngine::with_measurer(Wide));
    LayoutInvoker::new(registry).layout(&mut g).unwrap();
    let label = g.node(a).unwrap().labels()[0];
    assert_eq!(g.label(label).unwrap().bounds.size, size(100.0, 10.0));
}

#[test]
fn deterministic_metrics_scale_with_font_and_lines() {
    let m = DeterministicTextMeasurer::default();
    let style = TextStyle::default();
    let one = m.measure("abcd", &style);
    assert!((one.width - 4.0 * 12.0 * 0.6).abs() < 1e-9);
    assert_eq!(one.line_count, 1);

    let two = m.measure("ab\nabcdef", &style);
    assert_eq!(two.line_count, 2);
    assert!((two.width - 6.0 * 12.0 * 0.6).abs() < 1e-9);
    assert!((two.height - 2.0 * 12.0 * 1.2).abs() < 1e-9);

    assert_eq!(m.measure("", &style), TextMetrics::default());
}
