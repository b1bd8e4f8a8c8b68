use std::collections::HashSet;

use serde::Serialize;

use crate::layout::grid::{self, GridParams};
use crate::measure::NodeMetrics;
use crate::schema::RawSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    ManyToOne,
    OneToOne,
    OneToMany,
}

impl Cardinality {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "many-to-one" => Some(Self::ManyToOne),
            "one-to-one" => Some(Self::OneToOne),
            "one-to-many" => Some(Self::OneToMany),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
}

/// A table box. `id` equals the table name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub primary_key_columns: Vec<Column>,
    pub other_columns: Vec<Column>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Node {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_column: String,
    /// First primary-key column of the target, empty when the target has none.
    pub target_column: String,
    pub cardinality: Option<Cardinality>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphIR {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphIR {
    /// Nodes get their starting positions from `placement`.
    pub fn from_schema(schema: &RawSchema, metrics: &NodeMetrics, placement: &GridParams) -> Self {
        let mut nodes: Vec<Node> = schema
            .tables
            .iter()
            .map(|t| {
                let (pk, other): (Vec<_>, Vec<_>) = t.columns.iter().partition(|c| c.is_pk);
                let to_column = |c: &&crate::schema::RawColumn| Column {
                    name: c.column_name.clone(),
                    data_type: c.data_type.clone(),
                    is_primary_key: c.is_pk,
                    is_foreign_key: c.is_fk.is_set(),
                };

                Node {
                    id: t.table_name.clone(),
                    name: t.table_name.clone(),
                    primary_key_columns: pk.iter().map(to_column).collect(),
                    other_columns: other.iter().map(to_column).collect(),
                    x: 0.0,
                    y: 0.0,
                    width: metrics.width,
                    height: metrics.height(pk.len(), other.len(), true),
                }
            })
            .collect();

        let edges: Vec<Edge> = schema
            .relationship_index
            .iter()
            .enumerate()
            .map(|(idx, rel)| {
                let annotation = schema
                    .table(&rel.from_table)
                    .and_then(|t| t.column(&rel.from_column))
                    .and_then(|c| c.fk_cardinality.as_deref());
                let cardinality = annotation.and_then(Cardinality::parse);
                if cardinality.is_none() {
                    tracing::debug!(
                        from = %rel.from_table,
                        column = %rel.from_column,
                        annotation = ?annotation,
                        "relationship cardinality unresolved"
                    );
                }

                let target_column = schema
                    .table(&rel.to_table)
                    .and_then(|t| t.first_pk())
                    .map(|c| c.column_name.clone())
                    .unwrap_or_default();

                Edge {
                    id: format!("link-{}-{}-{}", idx, rel.from_table, rel.to_table),
                    source: rel.from_table.clone(),
                    target: rel.to_table.clone(),
                    source_column: rel.from_column.clone(),
                    target_column,
                    cardinality,
                }
            })
            .collect();

        nodes = grid::layout(&nodes, placement);

        GraphIR { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Recompute every node height for the given detail flag. Positions are untouched.
    pub fn apply_detail(&mut self, show_detail: bool, metrics: &NodeMetrics) {
        for node in &mut self.nodes {
            node.height = metrics.node_height(node, show_detail);
        }
    }

    /// Move one node, as a drag gesture would. Returns false for unknown ids.
    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                node.x = x;
                node.y = y;
                true
            }
            None => false,
        }
    }

    /// Keep only the visible nodes and the edges whose endpoints are both visible.
    pub fn subgraph(&self, visible: &HashSet<String>) -> GraphIR {
        let nodes: Vec<Node> = self
            .nodes
            .iter()
            .filter(|n| visible.contains(&n.id))
            .cloned()
            .collect();
        let edges: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| visible.contains(&e.source) && visible.contains(&e.target))
            .cloned()
            .collect();

        GraphIR { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;

    const SHOP: &str = r#"{
        "tables": [
            { "table_name": "users", "columns": [
                { "column_name": "email", "data_type": "text", "is_pk": false },
                { "column_name": "id", "data_type": "int", "is_pk": true },
                { "column_name": "name", "data_type": "text", "is_pk": false }
            ] },
            { "table_name": "orders", "columns": [
                { "column_name": "id", "data_type": "int", "is_pk": true },
                { "column_name": "user_id", "data_type": "int", "is_fk": true,
                  "fk_cardinality": "many-to-one", "references_table": "users" },
                { "column_name": "coupon", "data_type": "text", "is_fk": "fk_coupon",
                  "fk_cardinality": "sometimes", "references_table": "coupons" }
            ] },
            { "table_name": "audit", "columns": [
                { "column_name": "message", "data_type": "text" }
            ] }
        ],
        "relationship_index": [
            { "from_table": "orders", "from_column": "user_id", "to_table": "users", "type": "one-to-one" },
            { "from_table": "orders", "from_column": "user_id", "to_table": "users", "type": "fk" },
            { "from_table": "orders", "from_column": "coupon", "to_table": "coupons", "type": "fk" },
            { "from_table": "orders", "from_column": "user_id", "to_table": "audit", "type": "fk" }
        ]
    }"#;

    fn shop() -> GraphIR {
        GraphIR::from_schema(
            &parse_schema(SHOP).unwrap(),
            &NodeMetrics::default(),
            &GridParams::default(),
        )
    }

    #[test]
    fn test_columns_split_preserving_order() {
        let ir = shop();
        let users = ir.node("users").unwrap();
        assert_eq!(users.primary_key_columns.len(), 1);
        assert_eq!(users.primary_key_columns[0].name, "id");
        let names: Vec<&str> = users.other_columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["email", "name"]);
    }

    #[test]
    fn test_nodes_in_input_order_with_grid_positions() {
        let ir = shop();
        let ids: Vec<&str> = ir.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["users", "orders", "audit"]);
        assert_eq!((ir.nodes[0].x, ir.nodes[0].y), (0.0, 0.0));
        assert_eq!(ir.nodes[1].x, 288.0 + 150.0);
        assert!(ir.nodes.iter().all(|n| n.width == 288.0));
    }

    #[test]
    fn test_initial_positions_follow_grid_params() {
        let grid = GridParams {
            per_row: 1,
            ..GridParams::default()
        };
        let ir = GraphIR::from_schema(&parse_schema(SHOP).unwrap(), &NodeMetrics::default(), &grid);
        assert_eq!((ir.nodes[1].x, ir.nodes[1].y), (0.0, 500.0));
        assert_eq!((ir.nodes[2].x, ir.nodes[2].y), (0.0, 1000.0));
    }

    #[test]
    fn test_cardinality_from_source_column() {
        let ir = shop();
        // The record's own "type" is ignored.
        assert_eq!(ir.edges[0].cardinality, Some(Cardinality::ManyToOne));
        // Unrecognised annotation degrades to unknown.
        assert_eq!(ir.edges[2].cardinality, None);
    }

    #[test]
    fn test_target_column_resolution() {
        let ir = shop();
        assert_eq!(ir.edges[0].target_column, "id");
        // Missing table and table without a primary key both give an empty column.
        assert_eq!(ir.edges[2].target_column, "");
        assert_eq!(ir.edges[3].target_column, "");
    }

    #[test]
    fn test_edge_ids_unique_for_duplicate_pairs() {
        let ir = shop();
        assert_eq!(ir.edges[0].id, "link-0-orders-users");
        assert_eq!(ir.edges[1].id, "link-1-orders-users");
        let ids: HashSet<&str> = ir.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), ir.edges.len());
    }

    #[test]
    fn test_foreign_key_flags() {
        let ir = shop();
        let orders = ir.node("orders").unwrap();
        assert!(orders.other_columns.iter().all(|c| c.is_foreign_key));
        assert!(!orders.primary_key_columns[0].is_foreign_key);
    }

    #[test]
    fn test_apply_detail_keeps_positions() {
        let mut ir = shop();
        let metrics = NodeMetrics::default();
        ir.move_node("orders", 42.0, 17.0);
        ir.apply_detail(false, &metrics);
        assert!(ir.nodes.iter().all(|n| n.height == metrics.min_height));
        ir.apply_detail(true, &metrics);
        ir.apply_detail(true, &metrics);
        let orders = ir.node("orders").unwrap();
        assert_eq!((orders.x, orders.y), (42.0, 17.0));
        assert_eq!(orders.height, metrics.height(1, 2, true));
    }

    #[test]
    fn test_move_unknown_node() {
        let mut ir = shop();
        assert!(!ir.move_node("nope", 1.0, 1.0));
    }

    #[test]
    fn test_subgraph_drops_touching_edges() {
        let ir = shop();
        let visible: HashSet<String> = ["orders", "audit"].iter().map(|s| s.to_string()).collect();
        let sub = ir.subgraph(&visible);
        assert_eq!(sub.nodes.len(), 2);
        assert_eq!(sub.edges.len(), 1);
        assert_eq!(sub.edges[0].target, "audit");
    }

    #[test]
    fn test_empty_schema() {
        let schema = parse_schema(r#"{ "tables": [], "relationship_index": [] }"#).unwrap();
        let ir = GraphIR::from_schema(&schema, &NodeMetrics::default(), &GridParams::default());
        assert!(ir.nodes.is_empty());
        assert!(ir.edges.is_empty());
    }
}
