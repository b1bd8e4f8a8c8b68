//! Data structures shared by the layout strategies and the router.

use std::collections::HashMap;

use serde::Serialize;

use crate::ir::{Edge, Node};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Edges resolved to node indices. Edges touching unknown ids are dropped here,
/// so every strategy sees a graph without dangling references.
#[derive(Debug, Clone)]
pub struct EdgeIndex {
    pub node_count: usize,
    /// (source index, target index) in edge input order
    pub pairs: Vec<(usize, usize)>,
}

impl EdgeIndex {
    pub fn new(nodes: &[Node], edges: &[Edge]) -> Self {
        let lookup: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut pairs = Vec::with_capacity(edges.len());
        for edge in edges {
            match (lookup.get(edge.source.as_str()), lookup.get(edge.target.as_str())) {
                (Some(&s), Some(&t)) => pairs.push((s, t)),
                _ => tracing::debug!(edge = %edge.id, "ignoring edge with missing endpoint"),
            }
        }

        Self {
            node_count: nodes.len(),
            pairs,
        }
    }

    /// Total degree per node. A self-loop counts twice.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degree = vec![0; self.node_count];
        for &(s, t) in &self.pairs {
            degree[s] += 1;
            degree[t] += 1;
        }
        degree
    }

    /// Undirected neighbour lists, self-loops removed.
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.node_count];
        for &(s, t) in &self.pairs {
            if s == t {
                continue;
            }
            adj[s].push(t);
            adj[t].push(s);
        }
        adj
    }
}

/// Copy `nodes` with new top-left positions. Everything but `x, y` is kept.
pub fn with_positions(nodes: &[Node], positions: &[(f64, f64)]) -> Vec<Node> {
    nodes
        .iter()
        .zip(positions)
        .map(|(node, &(x, y))| Node {
            x,
            y,
            ..node.clone()
        })
        .collect()
}
