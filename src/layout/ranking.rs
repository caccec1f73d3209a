use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RankEdge {
    pub from: String,
    pub to: String,
}

impl RankEdge {
    pub(super) fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Longest-path ranks over `node_ids`. Nodes are visited in topological
/// order; when a cycle blocks progress the remaining node earliest in input
/// order becomes a new source, so its incoming edges never raise a rank.
pub(super) fn compute_ranks(
    node_ids: &[String],
    edges: &[RankEdge],
    node_order: &HashMap<String, usize>,
) -> HashMap<String, usize> {
    let set: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indeg: HashMap<&str, usize> = node_ids.iter().map(|id| (id.as_str(), 0)).collect();

    for edge in edges {
        if edge.from == edge.to || !set.contains(edge.from.as_str()) || !set.contains(edge.to.as_str()) {
            continue;
        }
        adj.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
        if let Some(deg) = indeg.get_mut(edge.to.as_str()) {
            *deg += 1;
        }
    }

    let order_key = |id: &str| -> usize { node_order.get(id).copied().unwrap_or(usize::MAX) };

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for id in node_ids {
        if indeg.get(id.as_str()).copied().unwrap_or(0) == 0 {
            ready.push(Reverse((order_key(id.as_str()), id.as_str())));
        }
    }

    let mut order: Vec<&str> = Vec::with_capacity(node_ids.len());
    let mut processed: HashSet<&str> = HashSet::new();
    loop {
        while let Some(Reverse((_key, id))) = ready.pop() {
            if !processed.insert(id) {
                continue;
            }
            order.push(id);
            for next in adj.get(id).into_iter().flatten() {
                if processed.contains(next) {
                    continue;
                }
                if let Some(deg) = indeg.get_mut(next) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        ready.push(Reverse((order_key(*next), *next)));
                    }
                }
            }
        }

        if processed.len() >= set.len() {
            break;
        }

        // Cycle: restart from the earliest unprocessed node.
        let best = node_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !processed.contains(id))
            .min_by_key(|id| order_key(*id));
        match best {
            Some(id) => ready.push(Reverse((order_key(id), id))),
            None => break,
        }
    }

    let order_index: HashMap<&str, usize> = order.iter().enumerate().map(|(idx, id)| (*id, idx)).collect();
    let mut ranks: HashMap<String, usize> = HashMap::new();
    for node in &order {
        let rank = *ranks.entry(node.to_string()).or_insert(0);
        let from_idx = order_index.get(node).copied().unwrap_or(0);
        for next in adj.get(node).into_iter().flatten() {
            let to_idx = order_index.get(next).copied().unwrap_or(from_idx);
            if to_idx <= from_idx {
                continue;
            }
            let entry = ranks.entry(next.to_string()).or_insert(0);
            *entry = (*entry).max(rank + 1);
        }
    }
    ranks
}

/// Initial in-rank order: highest degree in the middle, then alternating
/// right and left outward. Stable on input order for equal degrees.
pub(super) fn center_out_by_degree(bucket: &mut Vec<String>, degree: &HashMap<String, usize>) {
    if bucket.len() <= 2 {
        return;
    }
    let mut by_degree = bucket.clone();
    by_degree.sort_by_key(|id| Reverse(degree.get(id).copied().unwrap_or(0)));
    let mut slots: Vec<Option<String>> = vec![None; bucket.len()];
    let center = (bucket.len() - 1) / 2;
    for (idx, id) in by_degree.into_iter().enumerate() {
        let offset = idx.div_ceil(2);
        let slot = if idx % 2 == 1 { center + offset } else { center.saturating_sub(offset) };
        let slot = slot.min(slots.len() - 1);
        let free = (slot..slots.len())
            .chain((0..slot).rev())
            .find(|candidate| slots[*candidate].is_none());
        if let Some(free) = free {
            slots[free] = Some(id);
        }
    }
    *bucket = slots.into_iter().flatten().collect();
}

/// Median-heuristic crossing reduction. Sweeps alternate down and up until a
/// full round leaves the order unchanged or `passes` is reached; the order
/// with the fewest crossings seen is kept.
pub(super) fn order_rank_nodes(
    rank_nodes: &mut [Vec<String>],
    edges: &[RankEdge],
    node_order: &HashMap<String, usize>,
    passes: usize,
) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: HashMap<String, Vec<String>> = HashMap::new();
    let mut outgoing: HashMap<String, Vec<String>> = HashMap::new();
    for edge in edges {
        outgoing.entry(edge.from.clone()).or_default().push(edge.to.clone());
        incoming.entry(edge.to.clone()).or_default().push(edge.from.clone());
    }

    let mut positions: HashMap<String, usize> = HashMap::new();
    let update_positions = |rank_nodes: &[Vec<String>], positions: &mut HashMap<String, usize>| {
        positions.clear();
        for bucket in rank_nodes.iter() {
            for (idx, node_id) in bucket.iter().enumerate() {
                positions.insert(node_id.clone(), idx);
            }
        }
    };
    update_positions(rank_nodes, &mut positions);

    let sort_bucket = |bucket: &mut Vec<String>,
                       neighbors: &HashMap<String, Vec<String>>,
                       positions: &HashMap<String, usize>| {
        let current: HashMap<String, usize> = bucket
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        bucket.sort_by(|a, b| {
            let a_score = median_position(a, neighbors, positions, &current);
            let b_score = median_position(b, neighbors, positions, &current);
            a_score
                .total_cmp(&b_score)
                .then_with(|| current.get(a).cmp(&current.get(b)))
                .then_with(|| {
                    node_order
                        .get(a)
                        .copied()
                        .unwrap_or(usize::MAX)
                        .cmp(&node_order.get(b).copied().unwrap_or(usize::MAX))
                })
        });
    };

    let mut best = rank_nodes.to_vec();
    let mut best_crossings = count_crossings(rank_nodes, edges);
    for _ in 0..passes.max(1) {
        if best_crossings == 0 {
            break;
        }
        let before = rank_nodes.to_vec();
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() > 1 {
                sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
                update_positions(rank_nodes, &mut positions);
            }
        }
        for rank in (0..rank_nodes.len() - 1).rev() {
            if rank_nodes[rank].len() > 1 {
                sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
                update_positions(rank_nodes, &mut positions);
            }
        }
        let crossings = count_crossings(rank_nodes, edges);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = rank_nodes.to_vec();
        }
        if before.as_slice() == &rank_nodes[..] {
            break;
        }
    }
    rank_nodes.clone_from_slice(&best);
}

pub(super) fn median_position(
    node_id: &str,
    neighbors: &HashMap<String, Vec<String>>,
    positions: &HashMap<String, usize>,
    current_positions: &HashMap<String, usize>,
) -> f32 {
    let fallback = current_positions.get(node_id).copied().unwrap_or(0) as f32;
    let Some(list) = neighbors.get(node_id) else {
        return fallback;
    };
    let mut values: Vec<f32> = list
        .iter()
        .filter_map(|neighbor| positions.get(neighbor).map(|pos| *pos as f32))
        .collect();
    if values.is_empty() {
        return fallback;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

/// Crossings between adjacent ranks, counting only edges that span exactly
/// one rank.
pub(super) fn count_crossings(rank_nodes: &[Vec<String>], edges: &[RankEdge]) -> usize {
    let mut slot: HashMap<&str, (usize, usize)> = HashMap::new();
    for (rank, bucket) in rank_nodes.iter().enumerate() {
        for (idx, id) in bucket.iter().enumerate() {
            slot.insert(id.as_str(), (rank, idx));
        }
    }
    let mut by_gap: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    for edge in edges {
        let (Some(&(from_rank, from_idx)), Some(&(to_rank, to_idx))) =
            (slot.get(edge.from.as_str()), slot.get(edge.to.as_str()))
        else {
            continue;
        };
        if to_rank == from_rank + 1 {
            by_gap.entry(from_rank).or_default().push((from_idx, to_idx));
        } else if from_rank == to_rank + 1 {
            by_gap.entry(to_rank).or_default().push((to_idx, from_idx));
        }
    }
    let mut total = 0;
    for pairs in by_gap.values() {
        for (i, a) in pairs.iter().enumerate() {
            for b in &pairs[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    total += 1;
                }
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    fn order_of(list: &[&str]) -> HashMap<String, usize> {
        list.iter().enumerate().map(|(idx, id)| (id.to_string(), idx)).collect()
    }

    #[test]
    fn ranks_follow_longest_path() {
        let nodes = ids(&["a", "b", "c", "d"]);
        let edges = vec![
            RankEdge::new("a", "b"),
            RankEdge::new("b", "c"),
            RankEdge::new("a", "c"),
            RankEdge::new("c", "d"),
        ];
        let ranks = compute_ranks(&nodes, &edges, &order_of(&["a", "b", "c", "d"]));
        assert_eq!(ranks["a"], 0);
        assert_eq!(ranks["b"], 1);
        assert_eq!(ranks["c"], 2);
        assert_eq!(ranks["d"], 3);
    }

    #[test]
    fn back_edges_do_not_rank() {
        let nodes = ids(&["a", "b", "c"]);
        let edges = vec![
            RankEdge::new("a", "b"),
            RankEdge::new("b", "c"),
            RankEdge::new("c", "a"),
        ];
        let ranks = compute_ranks(&nodes, &edges, &order_of(&["a", "b", "c"]));
        assert_eq!(ranks["a"], 0);
        assert_eq!(ranks["b"], 1);
        assert_eq!(ranks["c"], 2);
    }

    #[test]
    fn isolated_nodes_rank_zero() {
        let nodes = ids(&["solo"]);
        let ranks = compute_ranks(&nodes, &[], &order_of(&["solo"]));
        assert_eq!(ranks["solo"], 0);
    }

    #[test]
    fn ordering_removes_a_simple_crossing() {
        let mut ranks = vec![ids(&["a", "b"]), ids(&["y", "x"])];
        let edges = vec![RankEdge::new("a", "x"), RankEdge::new("b", "y")];
        assert_eq!(count_crossings(&ranks, &edges), 1);
        order_rank_nodes(&mut ranks, &edges, &order_of(&["a", "b", "y", "x"]), 4);
        assert_eq!(count_crossings(&ranks, &edges), 0);
    }

    #[test]
    fn high_degree_nodes_start_central() {
        let mut bucket = ids(&["a", "b", "hub", "d", "e"]);
        let degree: HashMap<String, usize> = [("hub".to_string(), 5)].into_iter().collect();
        center_out_by_degree(&mut bucket, &degree);
        assert_eq!(bucket[2], "hub");
        assert_eq!(bucket.len(), 5);
    }
}
