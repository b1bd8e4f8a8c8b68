//! Connected components of the relationship graph.

use super::types::EdgeIndex;

/// Label each node with its component id. Ids follow node input order, so the
/// first node is always in cluster 0. Returns the labels and the cluster count.
pub fn connected_components(index: &EdgeIndex) -> (Vec<usize>, usize) {
    let adj = index.neighbors();
    let mut cluster = vec![usize::MAX; index.node_count];
    let mut next_id = 0;
    let mut stack = Vec::new();

    for start in 0..index.node_count {
        if cluster[start] != usize::MAX {
            continue;
        }

        cluster[start] = next_id;
        stack.push(start);
        while let Some(v) = stack.pop() {
            for &w in &adj[v] {
                if cluster[w] == usize::MAX {
                    cluster[w] = next_id;
                    stack.push(w);
                }
            }
        }
        next_id += 1;
    }

    (cluster, next_id)
}
