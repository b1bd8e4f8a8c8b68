//! Edge routing and waypoint generation.

use std::collections::HashMap;

use serde::Serialize;

use crate::ir::{Cardinality, Edge, Node};
use crate::measure::NodeMetrics;

use super::types::Point;

/// Length of the horizontal stub leaving and entering a node.
pub const STUB_LENGTH: f64 = 20.0;

/// Connector end decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    /// Crow's foot, the "many" end.
    Crow,
    /// Single tick, the "one" end.
    One,
}

impl Marker {
    pub fn id(self) -> &'static str {
        match self {
            Marker::Crow => "crow",
            Marker::One => "one",
        }
    }

    /// (start, end) markers for an edge. Only many-to-one puts a crow's foot
    /// on the source; the target end is always a single tick.
    pub fn for_cardinality(cardinality: Option<Cardinality>) -> (Marker, Marker) {
        match cardinality {
            Some(Cardinality::ManyToOne) => (Marker::Crow, Marker::One),
            _ => (Marker::One, Marker::One),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub points: Vec<Point>,
    pub marker_start: Marker,
    pub marker_end: Marker,
}

/// Which vertical side of a node an edge attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    /// Left when the other node's centre is left of this node's centre.
    fn facing(node: &Node, other: &Node) -> Side {
        if other.center().0 < node.center().0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn x(self, node: &Node) -> f64 {
        match self {
            Side::Left => node.x,
            Side::Right => node.x + node.width,
        }
    }

    fn outward(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// Y of the row for `column`, or the vertical centre when rows are not drawn
/// or the column is unknown.
fn anchor_y(node: &Node, column: &str, metrics: &NodeMetrics, show_detail: bool) -> f64 {
    let centre = node.y + node.height / 2.0;
    if !show_detail {
        return centre;
    }
    match metrics.row_offset(node, column) {
        Some(offset) if offset <= node.height => node.y + offset,
        _ => centre,
    }
}

/// Six-point elbow: out from the source row, across at mid height, into the target row.
pub fn route(
    source: &Node,
    target: &Node,
    edge: &Edge,
    metrics: &NodeMetrics,
    show_detail: bool,
) -> Vec<Point> {
    let source_side = Side::facing(source, target);
    let target_side = Side::facing(target, source);

    let start = Point::new(
        source_side.x(source),
        anchor_y(source, &edge.source_column, metrics, show_detail),
    );
    let end = Point::new(
        target_side.x(target),
        anchor_y(target, &edge.target_column, metrics, show_detail),
    );

    let out_x = start.x + source_side.outward() * STUB_LENGTH;
    let in_x = end.x + target_side.outward() * STUB_LENGTH;
    let mid_y = (start.y + end.y) / 2.0;

    vec![
        start,
        Point::new(out_x, start.y),
        Point::new(out_x, mid_y),
        Point::new(in_x, mid_y),
        Point::new(in_x, end.y),
        end,
    ]
}

/// Route every edge whose endpoints are both present; the rest are skipped.
pub fn route_edges(
    nodes: &[Node],
    edges: &[Edge],
    metrics: &NodeMetrics,
    show_detail: bool,
) -> Vec<RoutedEdge> {
    let node_positions: HashMap<&str, &Node> =
        nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    edges
        .iter()
        .filter_map(|edge| {
            let from = node_positions.get(edge.source.as_str())?;
            let to = node_positions.get(edge.target.as_str())?;
            let (marker_start, marker_end) = Marker::for_cardinality(edge.cardinality);
            Some(RoutedEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                points: route(from, to, edge, metrics, show_detail),
                marker_start,
                marker_end,
            })
        })
        .collect()
}
