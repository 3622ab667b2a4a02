//! Crossing minimization: layer-by-layer barycenter sweeps.
//!
//! Works on the "proper" layered graph, where long edges have been split by dummy nodes so that
//! every segment connects two adjacent layers.

use crate::Interrupt;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct LayerGraph {
    pub layer_of: Vec<usize>,
    pub layers: Vec<Vec<usize>>,
    pub preds: Vec<Vec<usize>>,
    pub succs: Vec<Vec<usize>>,
}

impl LayerGraph {
    /// Initial order within each layer is by vertex index.
    pub fn new(layer_of: Vec<usize>, segments: &[(usize, usize)]) -> Self {
        let count = layer_of.len();
        let layer_count = layer_of.iter().copied().max().map_or(0, |m| m + 1);
        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
        for (v, &layer) in layer_of.iter().enumerate() {
            layers[layer].push(v);
        }
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut succs: Vec<Vec<usize>> = vec![Vec::new(); count];
        for &(u, v) in segments {
            succs[u].push(v);
            preds[v].push(u);
        }
        Self {
            layer_of,
            layers,
            preds,
            succs,
        }
    }

    fn positions(&self) -> Vec<usize> {
        let mut pos = vec![0usize; self.layer_of.len()];
        for layer in &self.layers {
            for (i, &v) in layer.iter().enumerate() {
                pos[v] = i;
            }
        }
        pos
    }

    /// Number of segment pairs that cross between adjacent layers.
    pub fn crossings(&self) -> usize {
        let pos = self.positions();
        let mut total = 0;
        for layer in &self.layers {
            let mut segs: Vec<(usize, usize)> = Vec::new();
            for &u in layer {
                for &v in &self.succs[u] {
                    segs.push((pos[u], pos[v]));
                }
            }
            for (i, a) in segs.iter().enumerate() {
                for b in &segs[i + 1..] {
                    if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                        total += 1;
                    }
                }
            }
        }
        total
    }

    /// Reorders every layer by the mean position of its neighbors in the previous layer
    /// (`downward`) or the next one. Vertices without neighbors keep their slot.
    fn sweep(&mut self, downward: bool) {
        let layer_count = self.layers.len();
        if layer_count < 2 {
            return;
        }
        let order: Vec<usize> = if downward {
            (1..layer_count).collect()
        } else {
            (0..layer_count - 1).rev().collect()
        };
        for i in order {
            let pos = self.positions();
            let mut keyed: Vec<(f64, usize)> = self.layers[i]
                .iter()
                .enumerate()
                .map(|(slot, &v)| {
                    let neighbors = if downward { &self.preds[v] } else { &self.succs[v] };
                    if neighbors.is_empty() {
                        return (slot as f64, v);
                    }
                    let sum: usize = neighbors.iter().map(|n| pos[*n]).sum();
                    (sum as f64 / neighbors.len() as f64, v)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            self.layers[i] = keyed.into_iter().map(|(_, v)| v).collect();
        }
    }
}

/// Runs up to `rounds` down/up sweep pairs and keeps the ordering with the fewest crossings.
pub(crate) fn minimize_crossings(
    lg: &mut LayerGraph,
    rounds: u32,
    interrupt: &dyn Interrupt,
) -> Result<usize> {
    let mut best_layers = lg.layers.clone();
    let mut best = lg.crossings();
    for round in 0..rounds.max(1) {
        if best == 0 {
            break;
        }
        if interrupt.interrupted() {
            return Err(Error::Interrupted {
                phase: "crossing minimization",
            });
        }
        for downward in [true, false] {
            lg.sweep(downward);
            let crossings = lg.crossings();
            if crossings < best {
                best = crossings;
                best_layers = lg.layers.clone();
            }
        }
        tracing::trace!(round, best, "barycenter round");
    }
    lg.layers = best_layers;
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::{LayerGraph, minimize_crossings};

    #[test]
    fn sweeps_untangle_a_crossed_pair() {
        // 0 -> 3, 1 -> 2 cross in the initial order.
        let mut lg = LayerGraph::new(vec![0, 0, 1, 1], &[(0, 3), (1, 2)]);
        assert_eq!(lg.crossings(), 1);
        let crossings = minimize_crossings(&mut lg, 1, &()).unwrap();
        assert_eq!(crossings, 0);
        assert_eq!(lg.crossings(), 0);
    }
}
