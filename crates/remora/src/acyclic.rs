//! Break cycles by reversing the back edges of a depth-first search.
//!
//! Nodes are visited in index order and out-edges in insertion order, so the reversed set is
//! deterministic for a given input.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Active,
    Done,
}

/// Returns, per edge, whether it must be reversed to make the graph acyclic.
///
/// Self-loops must be filtered out by the caller.
pub(crate) fn reversed_edges(node_count: usize, edges: &[(usize, usize)]) -> Vec<bool> {
    let mut out_edges: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (i, &(u, _)) in edges.iter().enumerate() {
        out_edges[u].push(i);
    }

    let mut mark = vec![Mark::New; node_count];
    let mut reversed = vec![false; edges.len()];
    for start in 0..node_count {
        if mark[start] != Mark::New {
            continue;
        }
        mark[start] = Mark::Active;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(top) = stack.last_mut() {
            let (v, cursor) = *top;
            if cursor >= out_edges[v].len() {
                mark[v] = Mark::Done;
                stack.pop();
                continue;
            }
            top.1 += 1;
            let e = out_edges[v][cursor];
            let w = edges[e].1;
            match mark[w] {
                Mark::Active => reversed[e] = true,
                Mark::New => {
                    mark[w] = Mark::Active;
                    stack.push((w, 0));
                }
                Mark::Done => {}
            }
        }
    }
    reversed
}

#[cfg(test)]
mod tests {
    use super::reversed_edges;

    #[test]
    fn reverses_only_the_closing_edge_of_a_cycle() {
        let edges = [(0, 1), (1, 2), (2, 0)];
        assert_eq!(reversed_edges(3, &edges), vec![false, false, true]);
    }

    #[test]
    fn leaves_dags_alone() {
        let edges = [(0, 1), (0, 2), (1, 2)];
        assert_eq!(reversed_edges(3, &edges), vec![false; 3]);
    }
}
