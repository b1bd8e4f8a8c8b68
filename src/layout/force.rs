//! Force-directed placement.
//!
//! Every iteration costs O(n² + e): all node pairs repel, every edge attracts.
//! The iteration count is fixed, so run time is bounded by the node count
//! alone and never depends on convergence. Forces for a whole iteration are
//! accumulated into a separate buffer before any position moves.

use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ir::Node;

use super::cluster::connected_components;
use super::types::{EdgeIndex, with_positions};

/// Fallback direction step for coincident pairs (golden angle).
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForceParams {
    pub iterations: usize,
    pub repulsion: f64,
    pub attraction: f64,
    pub damping: f64,
    /// Side of the square random starting positions are drawn from.
    pub spread: f64,
    /// Distance of the final bounding box from the origin.
    pub margin: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// Distance of each cluster's seed area from the centre.
    pub cluster_radius: f64,
    /// Side of the square around a cluster anchor that seeds are drawn from.
    pub cluster_jitter: f64,
    /// Repulsion multiplier for nodes in different clusters.
    pub inter_cluster_repulsion: f64,
    /// Attraction multiplier for edges inside one cluster.
    pub intra_cluster_attraction: f64,
    /// Longest distance a node may travel in one iteration.
    pub max_step: f64,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            repulsion: 50_000.0,
            attraction: 0.01,
            damping: 0.9,
            spread: 2000.0,
            margin: 100.0,
            center_x: 1500.0,
            center_y: 1000.0,
            cluster_radius: 800.0,
            cluster_jitter: 400.0,
            inter_cluster_repulsion: 1.5,
            intra_cluster_attraction: 1.5,
            max_step: 200.0,
        }
    }
}

impl ForceParams {
    pub fn smart() -> Self {
        Self {
            iterations: 150,
            repulsion: 60_000.0,
            attraction: 0.015,
            damping: 0.85,
            ..Self::default()
        }
    }
}

/// Plain spring embedder from uniformly random starting points.
pub fn organic<R: Rng + ?Sized>(
    nodes: &[Node],
    index: &EdgeIndex,
    params: &ForceParams,
    rng: &mut R,
) -> Vec<Node> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let mut centers: Vec<(f64, f64)> = nodes
        .iter()
        .map(|_| {
            (
                rng.gen_range(0.0..=params.spread),
                rng.gen_range(0.0..=params.spread),
            )
        })
        .collect();

    simulate(&mut centers, index, None, params);
    normalize(nodes, &centers, params.margin)
}

/// Spring embedder seeded per connected component, with forces biased to
/// keep components apart.
pub fn smart_organic<R: Rng + ?Sized>(
    nodes: &[Node],
    index: &EdgeIndex,
    params: &ForceParams,
    rng: &mut R,
) -> Vec<Node> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let (clusters, cluster_count) = connected_components(index);
    let half = params.cluster_jitter / 2.0;
    let mut centers: Vec<(f64, f64)> = clusters
        .iter()
        .map(|&c| {
            let angle = 2.0 * PI * c as f64 / cluster_count.max(1) as f64;
            let base_x = params.center_x + params.cluster_radius * angle.cos();
            let base_y = params.center_y + params.cluster_radius * angle.sin();
            (
                base_x + rng.gen_range(-half..=half),
                base_y + rng.gen_range(-half..=half),
            )
        })
        .collect();

    simulate(&mut centers, index, Some(&clusters), params);
    normalize(nodes, &centers, params.margin)
}

fn simulate(
    centers: &mut [(f64, f64)],
    index: &EdgeIndex,
    clusters: Option<&[usize]>,
    params: &ForceParams,
) {
    let n = centers.len();
    let same_cluster = |a: usize, b: usize| clusters.is_none_or(|c| c[a] == c[b]);
    let mut velocity = vec![(0.0_f64, 0.0_f64); n];

    for _ in 0..params.iterations {
        velocity.iter_mut().for_each(|v| *v = (0.0, 0.0));

        for i in 0..n {
            for j in (i + 1)..n {
                let (ux, uy, dist) = direction(centers[i], centers[j], i, j);
                let factor = if same_cluster(i, j) {
                    1.0
                } else {
                    params.inter_cluster_repulsion
                };
                let force = params.repulsion * factor / (dist * dist);
                velocity[i].0 -= ux * force;
                velocity[i].1 -= uy * force;
                velocity[j].0 += ux * force;
                velocity[j].1 += uy * force;
            }
        }

        for &(s, t) in &index.pairs {
            if s == t {
                continue;
            }
            let dx = centers[t].0 - centers[s].0;
            let dy = centers[t].1 - centers[s].1;
            let factor = if clusters.is_some() && same_cluster(s, t) {
                params.intra_cluster_attraction
            } else {
                1.0
            };
            // k_a * d along the unit vector is k_a * (dx, dy).
            let k = params.attraction * factor;
            velocity[s].0 += dx * k;
            velocity[s].1 += dy * k;
            velocity[t].0 -= dx * k;
            velocity[t].1 -= dy * k;
        }

        for (c, v) in centers.iter_mut().zip(&velocity) {
            let (dx, dy) = clamp_step(v.0 * params.damping, v.1 * params.damping, params.max_step);
            c.0 += dx;
            c.1 += dy;
        }
    }
}

/// Shorten `(dx, dy)` to at most `max_step`. A heavily connected node would
/// otherwise overshoot further every iteration.
fn clamp_step(dx: f64, dy: f64, max_step: f64) -> (f64, f64) {
    let len = (dx * dx + dy * dy).sqrt();
    if len > max_step && max_step > 0.0 {
        let scale = max_step / len;
        (dx * scale, dy * scale)
    } else {
        (dx, dy)
    }
}

/// Unit vector from `a` to `b` and their distance, clamped to at least 1.
/// Coincident points get a fixed direction derived from the pair.
fn direction(a: (f64, f64), b: (f64, f64), i: usize, j: usize) -> (f64, f64, f64) {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let raw = (dx * dx + dy * dy).sqrt();
    if raw > f64::EPSILON {
        (dx / raw, dy / raw, raw.max(1.0))
    } else {
        let angle = (i + j) as f64 * GOLDEN_ANGLE + i as f64;
        (angle.cos(), angle.sin(), 1.0)
    }
}

/// Convert centres to top-left corners and shift so the layout starts at `margin`.
fn normalize(nodes: &[Node], centers: &[(f64, f64)], margin: f64) -> Vec<Node> {
    let corners: Vec<(f64, f64)> = nodes
        .iter()
        .zip(centers)
        .map(|(node, &(cx, cy))| (cx - node.width / 2.0, cy - node.height / 2.0))
        .collect();

    let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);

    let shifted: Vec<(f64, f64)> = corners
        .iter()
        .map(|&(x, y)| (x - min_x + margin, y - min_y + margin))
        .collect();

    with_positions(nodes, &shifted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_clamps_distance() {
        let (ux, uy, d) = direction((0.0, 0.0), (0.5, 0.0), 0, 1);
        assert_eq!((ux, uy), (1.0, 0.0));
        assert_eq!(d, 1.0);
    }

    #[test]
    fn test_direction_coincident_is_unit() {
        let (ux, uy, d) = direction((3.0, 3.0), (3.0, 3.0), 2, 5);
        assert!(((ux * ux + uy * uy) - 1.0).abs() < 1e-12);
        assert_eq!(d, 1.0);
    }

    #[test]
    fn test_clamp_step() {
        assert_eq!(clamp_step(3.0, 4.0, 10.0), (3.0, 4.0));
        let (dx, dy) = clamp_step(300.0, 400.0, 50.0);
        assert!((dx - 30.0).abs() < 1e-9 && (dy - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_hub_with_many_leaves_stays_bounded() {
        let leaves = 120;
        let index = EdgeIndex {
            node_count: leaves + 1,
            pairs: (1..=leaves).map(|leaf| (leaf, 0)).collect(),
        };
        for params in [ForceParams::default(), ForceParams::smart()] {
            let mut centers: Vec<(f64, f64)> = (0..=leaves)
                .map(|i| {
                    let a = i as f64 * GOLDEN_ANGLE;
                    (1000.0 + 800.0 * a.cos(), 1000.0 + 800.0 * a.sin())
                })
                .collect();
            let clusters = vec![0; leaves + 1];
            simulate(&mut centers, &index, Some(&clusters), &params);

            // No node can leave its start by more than iterations * max_step.
            let limit = 1800.0 + params.iterations as f64 * params.max_step;
            for &(x, y) in &centers {
                assert!(x.is_finite() && y.is_finite());
                assert!(x.abs() <= limit && y.abs() <= limit);
            }
        }
    }

    #[test]
    fn test_coincident_nodes_separate() {
        let mut centers = vec![(10.0, 10.0); 3];
        let index = EdgeIndex {
            node_count: 3,
            pairs: vec![],
        };
        let params = ForceParams {
            iterations: 5,
            ..ForceParams::default()
        };
        simulate(&mut centers, &index, None, &params);
        assert!(centers.iter().all(|c| c.0.is_finite() && c.1.is_finite()));
        assert_ne!(centers[0], centers[1]);
    }
}
