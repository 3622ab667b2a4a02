//! Longest-path layering.

use std::collections::VecDeque;

/// Assigns each node the length of the longest path reaching it, so sources sit on layer 0 and
/// every edge points from a lower to a strictly higher layer.
///
/// `edges` must be acyclic.
pub(crate) fn longest_path(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut indegree = vec![0usize; node_count];
    let mut out_edges: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for &(u, v) in edges {
        indegree[v] += 1;
        out_edges[u].push(v);
    }

    let mut rank = vec![0usize; node_count];
    let mut queue: VecDeque<usize> = (0..node_count).filter(|v| indegree[*v] == 0).collect();
    while let Some(u) = queue.pop_front() {
        for &v in &out_edges[u] {
            rank[v] = rank[v].max(rank[u] + 1);
            indegree[v] -= 1;
            if indegree[v] == 0 {
                queue.push_back(v);
            }
        }
    }
    rank
}
