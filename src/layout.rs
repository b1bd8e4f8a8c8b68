//! Layout engine: strategy selection and dispatch.

pub mod cluster;
pub mod force;
pub mod grid;
pub mod layered;
pub mod radial;
pub mod routing;
pub mod types;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::ir::{Edge, Node};

use force::ForceParams;
use grid::GridParams;
use layered::{Direction, LayeredParams};
use radial::RadialParams;
use types::EdgeIndex;

pub use routing::{Marker, RoutedEdge, route, route_edges};
pub use types::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutStrategy {
    Grid,
    TopDown,
    LeftRight,
    Orthogonal,
    Organic,
    Circular,
    Star,
    RelationshipPaths,
    SmartOrganic,
}

impl LayoutStrategy {
    pub const ALL: [LayoutStrategy; 9] = [
        Self::Grid,
        Self::TopDown,
        Self::LeftRight,
        Self::Orthogonal,
        Self::Organic,
        Self::Circular,
        Self::Star,
        Self::RelationshipPaths,
        Self::SmartOrganic,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "grid" => Some(Self::Grid),
            "hierarchic" | "top-down" => Some(Self::TopDown),
            "left-right" => Some(Self::LeftRight),
            "orthogonal" => Some(Self::Orthogonal),
            "organic" => Some(Self::Organic),
            "circular" => Some(Self::Circular),
            "star" => Some(Self::Star),
            "relationship-paths" => Some(Self::RelationshipPaths),
            "smart-organic" => Some(Self::SmartOrganic),
            _ => None,
        }
    }

    /// Like [`parse`](Self::parse) but unknown names select the grid.
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::warn!(strategy = name, "unknown layout strategy, using grid");
            Self::Grid
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::TopDown => "top-down",
            Self::LeftRight => "left-right",
            Self::Orthogonal => "orthogonal",
            Self::Organic => "organic",
            Self::Circular => "circular",
            Self::Star => "star",
            Self::RelationshipPaths => "relationship-paths",
            Self::SmartOrganic => "smart-organic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Grid => "Grid",
            Self::TopDown => "Top-Down",
            Self::LeftRight => "Left-Right",
            Self::Orthogonal => "Orthogonal",
            Self::Organic => "Organic",
            Self::Circular => "Circular",
            Self::Star => "Star",
            Self::RelationshipPaths => "Relationship Paths",
            Self::SmartOrganic => "Smart Organic",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Grid => "Simple 5-column grid layout",
            Self::TopDown => "Hierarchical with main entity at top",
            Self::LeftRight => "Hierarchical flowing left to right",
            Self::Orthogonal => "Grid-aligned with minimal crossings",
            Self::Organic => "Natural clustering of related entities",
            Self::Circular => "Entities arranged in a circle",
            Self::Star => "Central entity with others radiating out",
            Self::RelationshipPaths => "Optimized for clear relationship paths",
            Self::SmartOrganic => "Advanced organic with cluster detection",
        }
    }

    /// Everything except the two force-directed strategies.
    pub fn is_deterministic(self) -> bool {
        !matches!(self, Self::Organic | Self::SmartOrganic)
    }
}

/// Tunables for every strategy, one section per strategy family.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub grid: GridParams,
    pub hierarchical: LayeredParams,
    pub orthogonal: LayeredParams,
    pub relationship_paths: LayeredParams,
    pub organic: ForceParams,
    pub smart_organic: ForceParams,
    pub circular: RadialParams,
    pub star: RadialParams,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            grid: GridParams::default(),
            hierarchical: LayeredParams::default(),
            orthogonal: LayeredParams::orthogonal(),
            relationship_paths: LayeredParams::relationship_paths(),
            organic: ForceParams::default(),
            smart_organic: ForceParams::smart(),
            circular: RadialParams::default(),
            star: RadialParams::star(),
        }
    }
}

/// Positions nodes with a chosen strategy. Holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    pub params: LayoutParams,
    /// Seed for the force-directed strategies; entropy when unset.
    pub seed: Option<u64>,
}

impl LayoutEngine {
    pub fn new(params: LayoutParams) -> Self {
        Self { params, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Compute positions for `nodes`. Only `x` and `y` differ in the result.
    pub fn layout(&self, nodes: &[Node], edges: &[Edge], strategy: LayoutStrategy) -> Vec<Node> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.layout_with_rng(nodes, edges, strategy, &mut rng)
    }

    pub fn layout_with_rng<R: RngCore + ?Sized>(
        &self,
        nodes: &[Node],
        edges: &[Edge],
        strategy: LayoutStrategy,
        rng: &mut R,
    ) -> Vec<Node> {
        if nodes.is_empty() {
            return Vec::new();
        }

        let index = EdgeIndex::new(nodes, edges);
        let p = &self.params;

        let placed = match strategy {
            LayoutStrategy::Grid => grid::layout(nodes, &p.grid),
            LayoutStrategy::TopDown => {
                layered::layout(nodes, &index, Direction::TopDown, &p.hierarchical)
            }
            LayoutStrategy::LeftRight => {
                layered::layout(nodes, &index, Direction::LeftRight, &p.hierarchical)
            }
            LayoutStrategy::Orthogonal => {
                layered::layout(nodes, &index, Direction::TopDown, &p.orthogonal)
            }
            LayoutStrategy::RelationshipPaths => {
                layered::layout(nodes, &index, Direction::TopDown, &p.relationship_paths)
            }
            LayoutStrategy::Organic => force::organic(nodes, &index, &p.organic, rng),
            LayoutStrategy::SmartOrganic => {
                force::smart_organic(nodes, &index, &p.smart_organic, rng)
            }
            LayoutStrategy::Circular => radial::circular(nodes, &index, &p.circular),
            LayoutStrategy::Star => radial::star(nodes, &index, &p.star),
        };

        tracing::debug!(
            strategy = strategy.name(),
            nodes = nodes.len(),
            edges = index.pairs.len(),
            "layout computed"
        );

        placed
    }
}
