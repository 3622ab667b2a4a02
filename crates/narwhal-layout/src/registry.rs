use crate::engine::LayoutEngine;
use crate::fixed::FixedEngine;
use crate::layered::LayeredEngine;
use narwhal_core::Algorithm;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Engines available to an invoker, keyed by the algorithm they implement.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    engines: FxHashMap<Algorithm, Arc<dyn LayoutEngine>>,
}

impl AlgorithmRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in engine.
    pub fn standard() -> Self {
        Self::with_algorithms(&Algorithm::ALL)
    }

    /// The built-in engines for `algorithms` only.
    pub fn with_algorithms(algorithms: &[Algorithm]) -> Self {
        let mut out = Self::new();
        for algorithm in algorithms {
            match algorithm {
                Algorithm::Layered => out.register(LayeredEngine::new()),
                Algorithm::Fixed => out.register(FixedEngine::new()),
            };
        }
        out
    }

    /// Registers `engine`, returning the engine it replaces.
    pub fn register(
        &mut self,
        engine: impl LayoutEngine + 'static,
    ) -> Option<Arc<dyn LayoutEngine>> {
        self.engines.insert(engine.algorithm(), Arc::new(engine))
    }

    pub fn get(&self, algorithm: Algorithm) -> Option<&Arc<dyn LayoutEngine>> {
        self.engines.get(&algorithm)
    }

    pub fn contains(&self, algorithm: Algorithm) -> bool {
        self.engines.contains_key(&algorithm)
    }

    /// Registered algorithms, sorted.
    pub fn algorithms(&self) -> Vec<Algorithm> {
        let mut out: Vec<Algorithm> = self.engines.keys().copied().collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("algorithms", &self.algorithms())
            .finish()
    }
}
