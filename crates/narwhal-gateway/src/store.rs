//! Graphs owned by the service, addressed by numeric id.

use narwhal_core::Graph;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// A stored graph. Calls on the same graph serialise on this lock; calls on different graphs
/// run concurrently.
pub type SharedGraph = Arc<tokio::sync::Mutex<Graph>>;

#[derive(Debug)]
pub struct GraphStore {
    next_id: AtomicU64,
    graphs: Mutex<FxHashMap<u64, SharedGraph>>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            graphs: Mutex::new(FxHashMap::default()),
        }
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `graph` and returns its id. Ids are never reused.
    pub fn insert(&self, graph: Graph) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock()
            .insert(id, Arc::new(tokio::sync::Mutex::new(graph)));
        id
    }

    pub fn get(&self, id: u64) -> Option<SharedGraph> {
        self.lock().get(&id).cloned()
    }

    /// Drops the store's reference; calls already holding the graph finish normally.
    pub fn remove(&self, id: u64) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FxHashMap<u64, SharedGraph>> {
        // The map stays consistent even if a holder panicked: every critical section is a
        // single map operation.
        self.graphs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
