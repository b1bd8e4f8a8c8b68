//! Circle and hub-and-spoke placements.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::ir::Node;

use super::types::{EdgeIndex, with_positions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RadialParams {
    pub center_x: f64,
    pub center_y: f64,
    /// Circle: lower bound of the radius. Star: the ring radius.
    pub radius: f64,
    /// Circle only: radius contributed by each node.
    pub radius_per_node: f64,
}

impl Default for RadialParams {
    fn default() -> Self {
        Self {
            center_x: 1500.0,
            center_y: 1000.0,
            radius: 400.0,
            radius_per_node: 50.0,
        }
    }
}

impl RadialParams {
    pub fn star() -> Self {
        Self {
            radius: 600.0,
            radius_per_node: 0.0,
            ..Self::default()
        }
    }

    /// Top-left corner that puts the node's centre at `angle` on a circle of `radius`.
    fn on_circle(&self, node: &Node, radius: f64, angle: f64) -> (f64, f64) {
        (
            self.center_x + radius * angle.cos() - node.width / 2.0,
            self.center_y + radius * angle.sin() - node.height / 2.0,
        )
    }
}

/// Most connected node first, evenly spaced around the circle.
pub fn circular(nodes: &[Node], index: &EdgeIndex, params: &RadialParams) -> Vec<Node> {
    let count = nodes.len();
    if count == 0 {
        return Vec::new();
    }

    let degree = index.degrees();
    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by(|&a, &b| degree[b].cmp(&degree[a]));

    let radius = params.radius.max(count as f64 * params.radius_per_node);
    let mut positions = vec![(0.0, 0.0); count];
    for (rank, &i) in order.iter().enumerate() {
        let angle = 2.0 * PI * rank as f64 / count as f64;
        positions[i] = params.on_circle(&nodes[i], radius, angle);
    }

    with_positions(nodes, &positions)
}

/// Highest-degree node in the middle, the rest on a ring in input order.
pub fn star(nodes: &[Node], index: &EdgeIndex, params: &RadialParams) -> Vec<Node> {
    let count = nodes.len();
    if count == 0 {
        return Vec::new();
    }

    let degree = index.degrees();
    let mut hub = 0;
    for (i, &d) in degree.iter().enumerate() {
        if d > degree[hub] {
            hub = i;
        }
    }

    let spokes = count - 1;
    let mut positions = Vec::with_capacity(count);
    let mut slot = 0;
    for (i, node) in nodes.iter().enumerate() {
        if i == hub {
            positions.push(params.on_circle(node, 0.0, 0.0));
            continue;
        }
        let angle = 2.0 * PI * slot as f64 / spokes as f64;
        positions.push(params.on_circle(node, params.radius, angle));
        slot += 1;
    }

    with_positions(nodes, &positions)
}
