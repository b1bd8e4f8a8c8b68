//! Layered placement: cycle breaking, ranking, crossing reduction and
//! coordinate assignment.
//!
//! Coordinates are computed in layer space, where the rank axis runs along
//! the flow direction and the order axis across it, then mapped to x/y.

use serde::{Deserialize, Serialize};

use crate::ir::Node;

use super::types::{EdgeIndex, with_positions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TopDown,
    LeftRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ranker {
    /// Every node on the lowest rank its predecessors allow.
    LongestPath,
    /// Longest path, then sources moved down next to their nearest successor.
    TightTree,
    /// Longest path, then each node moved to the rank that minimises the
    /// total span of its edges.
    MinLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Align {
    /// Ranks centred on the widest rank, nodes pulled to the mean of their upstream neighbours.
    Center,
    /// Ranks packed from the leading edge, nodes pulled to their first upstream neighbour.
    TopLeft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayeredParams {
    pub node_sep: f64,
    pub rank_sep: f64,
    pub margin: f64,
    pub ranker: Ranker,
    pub align: Align,
    /// Grid pitch every coordinate is rounded to.
    pub snap: Option<f64>,
    pub sweeps: usize,
}

impl Default for LayeredParams {
    fn default() -> Self {
        Self {
            node_sep: 150.0,
            rank_sep: 200.0,
            margin: 50.0,
            ranker: Ranker::MinLength,
            align: Align::Center,
            snap: None,
            sweeps: 8,
        }
    }
}

impl LayeredParams {
    pub fn orthogonal() -> Self {
        Self {
            node_sep: 200.0,
            rank_sep: 250.0,
            margin: 0.0,
            ranker: Ranker::TightTree,
            snap: Some(50.0),
            ..Self::default()
        }
    }

    pub fn relationship_paths() -> Self {
        Self {
            node_sep: 180.0,
            rank_sep: 220.0,
            margin: 0.0,
            ranker: Ranker::MinLength,
            align: Align::TopLeft,
            ..Self::default()
        }
    }
}

pub fn layout(
    nodes: &[Node],
    index: &EdgeIndex,
    direction: Direction,
    params: &LayeredParams,
) -> Vec<Node> {
    let n = nodes.len();
    if n == 0 {
        return Vec::new();
    }

    let dag = break_cycles(n, &index.pairs);
    let ranks = assign_ranks(n, &dag, params.ranker);
    let mut graph = LayerGraph::build(n, &dag, &ranks);
    graph.minimize_crossings(params.sweeps);

    let (order_coord, rank_coord) = assign_coordinates(&graph, nodes, direction, params);

    let positions: Vec<(f64, f64)> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let (cx, cy) = match direction {
                Direction::TopDown => (order_coord[i], rank_coord[i]),
                Direction::LeftRight => (rank_coord[i], order_coord[i]),
            };
            let x = cx - node.width / 2.0;
            let y = cy - node.height / 2.0;
            match params.snap {
                Some(pitch) if pitch > 0.0 => (snap(x, pitch), snap(y, pitch)),
                _ => (x, y),
            }
        })
        .collect();

    with_positions(nodes, &positions)
}

fn snap(v: f64, pitch: f64) -> f64 {
    (v / pitch).round() * pitch
}

/// Drop self-loops and reverse every edge that closes a cycle in a
/// depth-first walk started from each node in input order.
fn break_cycles(n: usize, pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    const NEW: u8 = 0;
    const ACTIVE: u8 = 1;
    const DONE: u8 = 2;

    let mut out: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for (e, &(s, t)) in pairs.iter().enumerate() {
        if s != t {
            out[s].push((t, e));
        }
    }

    let mut state = vec![NEW; n];
    let mut reversed = vec![false; pairs.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if state[root] != NEW {
            continue;
        }
        state[root] = ACTIVE;
        stack.push((root, 0));

        while let Some(top) = stack.last_mut() {
            let v = top.0;
            if top.1 < out[v].len() {
                let (w, e) = out[v][top.1];
                top.1 += 1;
                match state[w] {
                    NEW => {
                        state[w] = ACTIVE;
                        stack.push((w, 0));
                    }
                    ACTIVE => reversed[e] = true,
                    _ => {}
                }
            } else {
                state[v] = DONE;
                stack.pop();
            }
        }
    }

    pairs
        .iter()
        .zip(&reversed)
        .filter(|((s, t), _)| s != t)
        .map(|(&(s, t), &rev)| if rev { (t, s) } else { (s, t) })
        .collect()
}

fn assign_ranks(n: usize, dag: &[(usize, usize)], ranker: Ranker) -> Vec<usize> {
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut succs: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(s, t) in dag {
        succs[s].push(t);
        preds[t].push(s);
    }

    // Kahn's algorithm, queue seeded and extended in input order.
    let mut in_degree: Vec<usize> = preds.iter().map(Vec::len).collect();
    let mut topo: Vec<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
    let mut rank = vec![0_i64; n];
    let mut head = 0;
    while head < topo.len() {
        let u = topo[head];
        head += 1;
        for &v in &succs[u] {
            rank[v] = rank[v].max(rank[u] + 1);
            in_degree[v] -= 1;
            if in_degree[v] == 0 {
                topo.push(v);
            }
        }
    }

    match ranker {
        Ranker::LongestPath => {}
        Ranker::TightTree => {
            for &v in topo.iter().rev() {
                if preds[v].is_empty() {
                    if let Some(min_succ) = succs[v].iter().map(|&s| rank[s]).min() {
                        rank[v] = min_succ - 1;
                    }
                }
            }
        }
        Ranker::MinLength => {
            for _ in 0..n.min(16) {
                let mut changed = false;
                for &v in &topo {
                    if let Some(best) = min_length_rank(v, &rank, &preds[v], &succs[v]) {
                        if best != rank[v] {
                            rank[v] = best;
                            changed = true;
                        }
                    }
                }
                if !changed {
                    break;
                }
            }
        }
    }

    let min = rank.iter().copied().min().unwrap_or(0);
    rank.into_iter().map(|r| (r - min) as usize).collect()
}

/// Median of the ranks the neighbours would like `v` on, clamped to the
/// range that keeps every edge pointing downwards.
fn min_length_rank(v: usize, rank: &[i64], preds: &[usize], succs: &[usize]) -> Option<i64> {
    let mut wanted: Vec<i64> = preds
        .iter()
        .map(|&p| rank[p] + 1)
        .chain(succs.iter().map(|&s| rank[s] - 1))
        .collect();
    if wanted.is_empty() {
        return None;
    }
    wanted.sort_unstable();
    // lower median keeps the choice deterministic for even counts
    let target = wanted[(wanted.len() - 1) / 2];

    let lo = preds.iter().map(|&p| rank[p] + 1).max().unwrap_or(i64::MIN);
    let hi = succs.iter().map(|&s| rank[s] - 1).min().unwrap_or(i64::MAX);
    if lo > hi {
        return Some(rank[v]);
    }
    Some(target.clamp(lo, hi))
}

/// Ranked graph where every edge joins adjacent ranks; longer edges are
/// split by virtual items.
struct LayerGraph {
    /// item -> real node index, None for virtual items
    items: Vec<Option<usize>>,
    /// rank -> items in current order
    layers: Vec<Vec<usize>>,
    /// item -> neighbours on the rank above
    up: Vec<Vec<usize>>,
    /// item -> neighbours on the rank below
    down: Vec<Vec<usize>>,
}

impl LayerGraph {
    fn build(n: usize, dag: &[(usize, usize)], ranks: &[usize]) -> Self {
        let mut items: Vec<Option<usize>> = (0..n).map(Some).collect();
        let mut rank_of: Vec<usize> = ranks.to_vec();
        let mut up: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut down: Vec<Vec<usize>> = vec![Vec::new(); n];

        for &(s, t) in dag {
            if ranks[t] <= ranks[s] {
                continue;
            }
            let mut prev = s;
            for r in (ranks[s] + 1)..ranks[t] {
                let id = items.len();
                items.push(None);
                rank_of.push(r);
                up.push(vec![prev]);
                down.push(Vec::new());
                down[prev].push(id);
                prev = id;
            }
            up[t].push(prev);
            down[prev].push(t);
        }

        let rank_count = rank_of.iter().copied().max().map_or(0, |m| m + 1);
        let mut layers = vec![Vec::new(); rank_count];
        for (item, &r) in rank_of.iter().enumerate() {
            layers[r].push(item);
        }

        Self {
            items,
            layers,
            up,
            down,
        }
    }

    fn is_virtual(&self, item: usize) -> bool {
        self.items[item].is_none()
    }

    /// item -> index inside its layer
    fn positions(&self) -> Vec<usize> {
        let mut pos = vec![0; self.items.len()];
        for layer in &self.layers {
            for (i, &item) in layer.iter().enumerate() {
                pos[item] = i;
            }
        }
        pos
    }

    fn crossings(&self) -> usize {
        let pos = self.positions();
        let pos = &pos;
        let mut total = 0;
        for layer in self.layers.iter().take(self.layers.len().saturating_sub(1)) {
            let mut segments: Vec<(usize, usize)> = layer
                .iter()
                .flat_map(|&u| self.down[u].iter().map(move |&v| (pos[u], pos[v])))
                .collect();
            segments.sort_unstable();
            for i in 0..segments.len() {
                for j in (i + 1)..segments.len() {
                    if segments[i].0 < segments[j].0 && segments[i].1 > segments[j].1 {
                        total += 1;
                    }
                }
            }
        }
        total
    }

    /// Sort one layer by the barycenter of its neighbours on the rank above
    /// (`from_above`) or below. Items without such neighbours keep their slot.
    fn reorder(&mut self, r: usize, from_above: bool) {
        let pos = self.positions();
        let mut scored: Vec<(f64, usize, usize)> = self.layers[r]
            .iter()
            .enumerate()
            .map(|(i, &item)| {
                let neighbours = if from_above {
                    &self.up[item]
                } else {
                    &self.down[item]
                };
                let center = if neighbours.is_empty() {
                    i as f64
                } else {
                    neighbours.iter().map(|&w| pos[w] as f64).sum::<f64>() / neighbours.len() as f64
                };
                (center, i, item)
            })
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        self.layers[r] = scored.into_iter().map(|(_, _, item)| item).collect();
    }

    /// Alternate downward and upward barycenter sweeps, keeping the best
    /// ordering seen.
    fn minimize_crossings(&mut self, sweeps: usize) {
        let rank_count = self.layers.len();
        if rank_count < 2 {
            return;
        }

        let mut best = self.layers.clone();
        let mut best_crossings = self.crossings();

        for _ in 0..sweeps {
            if best_crossings == 0 {
                break;
            }
            for r in 1..rank_count {
                self.reorder(r, true);
            }
            for r in (0..rank_count - 1).rev() {
                self.reorder(r, false);
            }
            let crossings = self.crossings();
            if crossings < best_crossings {
                best_crossings = crossings;
                best = self.layers.clone();
            }
        }

        self.layers = best;
    }
}

/// Centre coordinates of every real node along the order and rank axes.
fn assign_coordinates(
    graph: &LayerGraph,
    nodes: &[Node],
    direction: Direction,
    params: &LayeredParams,
) -> (Vec<f64>, Vec<f64>) {
    let extent = |item: usize| -> (f64, f64) {
        match graph.items[item] {
            None => (0.0, 0.0),
            Some(i) => match direction {
                Direction::TopDown => (nodes[i].width, nodes[i].height),
                Direction::LeftRight => (nodes[i].height, nodes[i].width),
            },
        }
    };
    let gap = |a: usize, b: usize| {
        if graph.is_virtual(a) || graph.is_virtual(b) {
            params.node_sep / 2.0
        } else {
            params.node_sep
        }
    };

    // Rank axis: each rank is as thick as its thickest node.
    let mut rank_center = Vec::with_capacity(graph.layers.len());
    let mut cursor = params.margin;
    for layer in &graph.layers {
        let thickness = layer.iter().map(|&i| extent(i).1).fold(0.0, f64::max);
        rank_center.push(cursor + thickness / 2.0);
        cursor += thickness + params.rank_sep;
    }

    // Order axis: pack every rank from zero.
    let mut coord = vec![0.0; graph.items.len()];
    let mut spans = Vec::with_capacity(graph.layers.len());
    for layer in &graph.layers {
        let mut right = 0.0;
        let mut prev: Option<usize> = None;
        for &item in layer {
            let width = extent(item).0;
            let left = match prev {
                Some(p) => right + gap(p, item),
                None => 0.0,
            };
            coord[item] = left + width / 2.0;
            right = left + width;
            prev = Some(item);
        }
        spans.push(right);
    }

    if params.align == Align::Center {
        let widest = spans.iter().copied().fold(0.0, f64::max);
        for (layer, span) in graph.layers.iter().zip(&spans) {
            let shift = (widest - span) / 2.0;
            for &item in layer {
                coord[item] += shift;
            }
        }
    }

    // Pull each node towards its upstream neighbours without breaking separation.
    for layer in graph.layers.iter().skip(1) {
        let mut prev: Option<(usize, f64)> = None;
        for &item in layer {
            let ups = &graph.up[item];
            let desired = if ups.is_empty() {
                coord[item]
            } else {
                match params.align {
                    Align::Center => ups.iter().map(|&u| coord[u]).sum::<f64>() / ups.len() as f64,
                    Align::TopLeft => ups.iter().map(|&u| coord[u]).fold(f64::INFINITY, f64::min),
                }
            };
            let half = extent(item).0 / 2.0;
            let c = match prev {
                Some((p, right)) => desired.max(right + gap(p, item) + half),
                None => desired,
            };
            coord[item] = c;
            prev = Some((item, c + half));
        }
    }

    let min_left = (0..nodes.len())
        .map(|i| coord[i] - extent(i).0 / 2.0)
        .fold(f64::INFINITY, f64::min);
    let shift = params.margin - min_left;

    let mut rank_of_node = vec![0; nodes.len()];
    for (r, layer) in graph.layers.iter().enumerate() {
        for &item in layer {
            if let Some(i) = graph.items[item] {
                rank_of_node[i] = r;
            }
        }
    }

    let order_coord = (0..nodes.len()).map(|i| coord[i] + shift).collect();
    let rank_coord = rank_of_node.iter().map(|&r| rank_center[r]).collect();
    (order_coord, rank_coord)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_cycles_reverses_back_edge() {
        let dag = break_cycles(3, &[(0, 1), (1, 2), (2, 0), (1, 1)]);
        assert_eq!(dag, vec![(0, 1), (1, 2), (0, 2)]);
    }

    #[test]
    fn test_longest_path_ranks() {
        let ranks = assign_ranks(4, &[(0, 1), (1, 2), (0, 2), (3, 2)], Ranker::LongestPath);
        assert_eq!(ranks, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_tight_tree_pulls_sources_down() {
        let ranks = assign_ranks(4, &[(0, 1), (1, 2), (3, 2)], Ranker::TightTree);
        assert_eq!(ranks, vec![0, 1, 2, 1]);
    }

    #[test]
    fn test_min_length_keeps_edges_downward() {
        let dag = [(0, 1), (1, 2), (3, 2), (0, 4)];
        let ranks = assign_ranks(5, &dag, Ranker::MinLength);
        for &(s, t) in &dag {
            assert!(ranks[t] > ranks[s]);
        }
        assert_eq!(ranks[3] + 1, ranks[2]);
    }

    #[test]
    fn test_virtual_items_for_long_edges() {
        let graph = LayerGraph::build(3, &[(0, 1), (1, 2), (0, 2)], &[0, 1, 2]);
        assert_eq!(graph.items.len(), 4);
        assert!(graph.is_virtual(3));
        assert_eq!(graph.layers[1].len(), 2);
    }

    #[test]
    fn test_crossing_removed() {
        // a, b on rank 0; c, d on rank 1; a -> d, b -> c cross in input order.
        let mut graph = LayerGraph::build(4, &[(0, 3), (1, 2)], &[0, 0, 1, 1]);
        assert_eq!(graph.crossings(), 1);
        graph.minimize_crossings(4);
        assert_eq!(graph.crossings(), 0);
    }
}
