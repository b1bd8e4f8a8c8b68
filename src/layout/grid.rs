//! Fixed-capacity row tiling.

use serde::{Deserialize, Serialize};

use crate::ir::Node;

use super::types::with_positions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridParams {
    pub per_row: usize,
    pub gap_x: f64,
    pub gap_y: f64,
    /// Row pitch ignores real heights so rows line up regardless of detail.
    pub row_height: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            per_row: 5,
            gap_x: 150.0,
            gap_y: 100.0,
            row_height: 400.0,
        }
    }
}

pub fn layout(nodes: &[Node], params: &GridParams) -> Vec<Node> {
    let per_row = params.per_row.max(1);
    let positions: Vec<(f64, f64)> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let col = (i % per_row) as f64;
            let row = (i / per_row) as f64;
            (
                col * (node.width + params.gap_x),
                row * (params.row_height + params.gap_y),
            )
        })
        .collect();

    with_positions(nodes, &positions)
}
