//! Raw schema to positioned, routed diagram.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::Config;
use crate::ir::{GraphIR, Node};
use crate::layout::{LayoutEngine, LayoutStrategy, RoutedEdge, route_edges};
use crate::schema::RawSchema;

/// Blank space kept around the drawing.
pub const PADDING: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Smallest box holding every node and every routed point, grown by `padding`.
    pub fn enclosing(nodes: &[Node], edges: &[RoutedEdge], padding: f64) -> Self {
        let corners = nodes
            .iter()
            .flat_map(|n| [(n.x, n.y), (n.x + n.width, n.y + n.height)])
            .chain(edges.iter().flat_map(|e| e.points.iter().map(|p| (p.x, p.y))));

        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }

        if min.0 > max.0 {
            return Self {
                x: 0.0,
                y: 0.0,
                width: padding * 2.0,
                height: padding * 2.0,
            };
        }

        Self {
            x: min.0 - padding,
            y: min.1 - padding,
            width: max.0 - min.0 + padding * 2.0,
            height: max.1 - min.1 + padding * 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagram {
    pub strategy: LayoutStrategy,
    pub show_detail: bool,
    pub bounds: Bounds,
    pub nodes: Vec<Node>,
    pub edges: Vec<RoutedEdge>,
}

#[derive(Debug, Clone)]
pub struct DiagramOptions {
    pub strategy: LayoutStrategy,
    pub show_detail: bool,
    /// Table names to keep. `None` keeps every table.
    pub visible: Option<HashSet<String>>,
    /// Seed for the force-directed strategies.
    pub seed: Option<u64>,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            strategy: LayoutStrategy::Grid,
            show_detail: true,
            visible: None,
            seed: None,
        }
    }
}

pub fn build_diagram(schema: &RawSchema, options: &DiagramOptions, config: &Config) -> Diagram {
    let mut graph = GraphIR::from_schema(schema, &config.metrics, &config.layout.grid);

    if let Some(visible) = &options.visible {
        for name in visible {
            if graph.node(name).is_none() {
                tracing::debug!(table = %name, "visible table not in schema");
            }
        }
        graph = graph.subgraph(visible);
    }

    graph.apply_detail(options.show_detail, &config.metrics);

    let engine = LayoutEngine {
        params: config.layout.clone(),
        seed: options.seed,
    };
    let nodes = engine.layout(&graph.nodes, &graph.edges, options.strategy);
    let edges = route_edges(&nodes, &graph.edges, &config.metrics, options.show_detail);
    let bounds = Bounds::enclosing(&nodes, &edges, PADDING);

    Diagram {
        strategy: options.strategy,
        show_detail: options.show_detail,
        bounds,
        nodes,
        edges,
    }
}
