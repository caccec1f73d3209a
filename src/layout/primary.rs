use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::LayoutConfig;
use crate::ir::{CrossDirection, Edge, GraphModel, Layer, Node};

use super::ranking::{RankEdge, center_out_by_degree, compute_ranks, order_rank_nodes};
use super::sweep::{SweepItem, push_apart};
use super::types::NodeLayout;

/// Result of placing the component/external layer.
#[derive(Debug, Clone, Default)]
pub(super) struct PrimaryLayout {
    pub nodes: Vec<NodeLayout>,
    /// Intermediate points of edges that span several ranks, source to
    /// target.
    pub waypoints: HashMap<String, Vec<(f32, f32)>>,
    pub upstream_col: Option<f32>,
    pub downstream_col: Option<f32>,
}

struct Padded {
    width: f32,
    height: f32,
}

fn padded(node: &Node, config: &LayoutConfig) -> Padded {
    match node.layer {
        Layer::Component | Layer::External => Padded {
            width: node.width + config.node_padding_x,
            height: node.height + config.node_padding_y,
        },
        Layer::Platform | Layer::Datacenter | Layer::Indicator | Layer::IndicatorGroup => Padded {
            width: node.width,
            height: node.height,
        },
    }
}

pub(super) fn layout_primary(model: &GraphModel, config: &LayoutConfig) -> PrimaryLayout {
    let primary: Vec<&Node> = model.nodes.iter().filter(|node| node.layer.is_primary()).collect();
    if primary.is_empty() {
        return PrimaryLayout::default();
    }
    let primary_ids: HashSet<&str> = primary.iter().map(|node| node.id.as_str()).collect();
    let edges: Vec<&Edge> = model
        .edges
        .iter()
        .filter(|edge| {
            edge.source != edge.target
                && primary_ids.contains(edge.source.as_str())
                && primary_ids.contains(edge.target.as_str())
        })
        .collect();

    let mut result = PrimaryLayout::default();
    let mut next_top: Option<f32> = None;
    for component in weak_components(&primary, &edges) {
        let members: HashSet<&str> = component.iter().map(|node| node.id.as_str()).collect();
        let component_edges: Vec<&Edge> = edges
            .iter()
            .copied()
            .filter(|edge| members.contains(edge.source.as_str()))
            .collect();
        let mut placed = layout_component(model, &component, &component_edges, config);

        // Stack components vertically by their padded extents.
        let top = placed
            .nodes
            .iter()
            .map(|(node, padded_height)| node.y - padded_height / 2.0)
            .fold(f32::INFINITY, f32::min);
        let bottom = placed
            .nodes
            .iter()
            .map(|(node, padded_height)| node.y + padded_height / 2.0)
            .fold(f32::NEG_INFINITY, f32::max);
        let shift = match next_top {
            Some(target) => target - top,
            None => 0.0,
        };
        next_top = Some(bottom + shift + config.component_spacing);
        for (node, _) in placed.nodes.iter_mut() {
            node.y += shift;
        }
        for (edge_id, points) in placed.waypoints {
            let shifted = points.into_iter().map(|(x, y)| (x, y + shift)).collect();
            result.waypoints.insert(edge_id, shifted);
        }
        result.nodes.extend(placed.nodes.into_iter().map(|(node, _)| node));
    }

    place_external_columns(model, &mut result, config);

    // Keep model order for deterministic downstream passes.
    result
        .nodes
        .sort_by_key(|node| model.node_order(&node.id).unwrap_or(usize::MAX));
    result
}

/// Weakly-connected components in input order.
fn weak_components<'a>(nodes: &[&'a Node], edges: &[&Edge]) -> Vec<Vec<&'a Node>> {
    let mut neighbors: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        neighbors.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
        neighbors.entry(edge.target.as_str()).or_default().push(edge.source.as_str());
    }
    let position: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.as_str(), idx))
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut components = Vec::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            continue;
        }
        let mut member_idx = vec![position[node.id.as_str()]];
        let mut queue: VecDeque<&str> = VecDeque::from([node.id.as_str()]);
        while let Some(current) = queue.pop_front() {
            for &next in neighbors.get(current).into_iter().flatten() {
                if seen.insert(next) {
                    if let Some(idx) = position.get(next) {
                        member_idx.push(*idx);
                    }
                    queue.push_back(next);
                }
            }
        }
        member_idx.sort_unstable();
        components.push(member_idx.into_iter().map(|idx| nodes[idx]).collect());
    }
    components
}

struct ComponentPlacement {
    /// Placed node plus its padded height.
    nodes: Vec<(NodeLayout, f32)>,
    waypoints: HashMap<String, Vec<(f32, f32)>>,
}

fn layout_component(
    model: &GraphModel,
    nodes: &[&Node],
    edges: &[&Edge],
    config: &LayoutConfig,
) -> ComponentPlacement {
    let node_ids: Vec<String> = nodes.iter().map(|node| node.id.clone()).collect();
    let mut node_order: HashMap<String, usize> = node_ids
        .iter()
        .map(|id| (id.clone(), model.node_order(id).unwrap_or(usize::MAX)))
        .collect();
    let rank_edges: Vec<RankEdge> = edges
        .iter()
        .map(|edge| RankEdge::new(edge.source.as_str(), edge.target.as_str()))
        .collect();
    let ranks = compute_ranks(&node_ids, &rank_edges, &node_order);
    let max_rank = ranks.values().copied().max().unwrap_or(0);

    let mut rank_nodes: Vec<Vec<String>> = vec![Vec::new(); max_rank + 1];
    for id in &node_ids {
        let rank = ranks.get(id).copied().unwrap_or(0);
        rank_nodes[rank].push(id.clone());
    }

    let mut degree: HashMap<String, usize> = HashMap::new();
    for edge in edges {
        *degree.entry(edge.source.clone()).or_insert(0) += 1;
        *degree.entry(edge.target.clone()).or_insert(0) += 1;
    }
    for bucket in rank_nodes.iter_mut() {
        center_out_by_degree(bucket, &degree);
    }

    // Split multi-rank edges with virtual nodes. Back edges are split along
    // their reversed direction.
    let mut virtual_height: HashMap<String, f32> = HashMap::new();
    let mut chains: Vec<(String, Vec<String>, bool)> = Vec::new();
    let mut expanded: Vec<RankEdge> = Vec::new();
    for (edge_idx, edge) in edges.iter().enumerate() {
        let source_rank = ranks.get(&edge.source).copied().unwrap_or(0);
        let target_rank = ranks.get(&edge.target).copied().unwrap_or(0);
        if source_rank == target_rank {
            continue;
        }
        let reversed = target_rank < source_rank;
        let (low_id, low, high_id, high) = if reversed {
            (&edge.target, target_rank, &edge.source, source_rank)
        } else {
            (&edge.source, source_rank, &edge.target, target_rank)
        };
        let mut prev = low_id.clone();
        let mut chain = Vec::new();
        for rank in low + 1..high {
            let id = format!("__v{edge_idx}_{rank}__");
            node_order.insert(id.clone(), usize::MAX - 1);
            virtual_height.insert(id.clone(), config.edge_spacing);
            rank_nodes[rank].push(id.clone());
            expanded.push(RankEdge::new(prev, id.clone()));
            chain.push(id.clone());
            prev = id;
        }
        expanded.push(RankEdge::new(prev, high_id.clone()));
        if !chain.is_empty() {
            chains.push((edge.id.clone(), chain, reversed));
        }
    }

    order_rank_nodes(&mut rank_nodes, &expanded, &node_order, config.order_passes);

    let by_id: HashMap<&str, &Node> = nodes.iter().map(|node| (node.id.as_str(), *node)).collect();
    let extent = |id: &str| -> (f32, f32) {
        match by_id.get(id) {
            Some(node) => {
                let pad = padded(node, config);
                (pad.width, pad.height)
            }
            None => (0.0, virtual_height.get(id).copied().unwrap_or(config.edge_spacing)),
        }
    };

    // Rank columns: each rank sits rank_spacing past the widest node of the
    // previous one.
    let mut rank_x = Vec::with_capacity(rank_nodes.len());
    let mut prev: Option<(f32, f32)> = None;
    for bucket in &rank_nodes {
        let width = bucket.iter().map(|id| extent(id).0).fold(0.0, f32::max);
        let x = match prev {
            Some((prev_x, prev_width)) => prev_x + prev_width / 2.0 + config.rank_spacing + width / 2.0,
            None => 0.0,
        };
        rank_x.push(x);
        prev = Some((x, width));
    }

    // Initial slots: stacked node_spacing apart, centered on y = 0.
    let mut y: HashMap<String, f32> = HashMap::new();
    for bucket in &rank_nodes {
        let total: f32 = bucket.iter().map(|id| extent(id).1).sum::<f32>()
            + config.node_spacing * bucket.len().saturating_sub(1) as f32;
        let mut cursor = -total / 2.0;
        for id in bucket {
            let height = extent(id).1;
            y.insert(id.clone(), cursor + height / 2.0);
            cursor += height + config.node_spacing;
        }
    }

    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &expanded {
        outgoing.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
        incoming.entry(edge.to.as_str()).or_default().push(edge.from.as_str());
    }
    for rank in 1..rank_nodes.len() {
        align_rank(&rank_nodes[rank], &incoming, &mut y, &extent, config.node_spacing);
    }
    for rank in (0..rank_nodes.len().saturating_sub(1)).rev() {
        align_rank(&rank_nodes[rank], &outgoing, &mut y, &extent, config.node_spacing);
    }

    let mut placed = Vec::with_capacity(nodes.len());
    for node in nodes {
        let rank = ranks.get(&node.id).copied().unwrap_or(0);
        let pad = padded(node, config);
        placed.push((
            NodeLayout {
                id: node.id.clone(),
                layer: node.layer,
                label: node.label.clone(),
                x: rank_x.get(rank).copied().unwrap_or(0.0),
                y: y.get(&node.id).copied().unwrap_or(0.0),
                width: node.width,
                height: node.height,
                is_root: node.is_root,
                rank: Some(rank),
            },
            pad.height,
        ));
    }

    let mut waypoints = HashMap::new();
    for (edge_id, chain, reversed) in chains {
        let mut points: Vec<(f32, f32)> = chain
            .iter()
            .filter_map(|id| {
                let rank = rank_nodes.iter().position(|bucket| bucket.contains(id))?;
                Some((rank_x[rank], y.get(id).copied().unwrap_or(0.0)))
            })
            .collect();
        if reversed {
            points.reverse();
        }
        waypoints.insert(edge_id, points);
    }

    ComponentPlacement {
        nodes: placed,
        waypoints,
    }
}

/// Pulls each node of a rank toward the median y of its neighbours in the
/// adjacent rank, keeping the rank order and spacing. The block is shifted
/// back so its mean matches the mean of the desired positions.
fn align_rank(
    bucket: &[String],
    neighbors: &HashMap<&str, Vec<&str>>,
    y: &mut HashMap<String, f32>,
    extent: &dyn Fn(&str) -> (f32, f32),
    spacing: f32,
) {
    if bucket.is_empty() {
        return;
    }
    let mut items: Vec<SweepItem> = bucket
        .iter()
        .enumerate()
        .map(|(idx, id)| {
            let current = y.get(id).copied().unwrap_or(0.0);
            let mut targets: Vec<f32> = neighbors
                .get(id.as_str())
                .into_iter()
                .flatten()
                .filter_map(|other| y.get(*other).copied())
                .collect();
            let desired = if targets.is_empty() {
                current
            } else {
                targets.sort_by(f32::total_cmp);
                let mid = targets.len() / 2;
                if targets.len() % 2 == 1 {
                    targets[mid]
                } else {
                    (targets[mid - 1] + targets[mid]) / 2.0
                }
            };
            SweepItem::new(id.clone(), desired, extent(id).1, idx)
        })
        .collect();
    let desired_mean = items.iter().map(|item| item.pos).sum::<f32>() / items.len() as f32;
    push_apart(&mut items, spacing);
    let placed_mean = items.iter().map(|item| item.pos).sum::<f32>() / items.len() as f32;
    let drift = desired_mean - placed_mean;
    for item in items {
        y.insert(item.id, item.pos + drift);
    }
}

/// Moves cross-application nodes into columns left (upstream) and right
/// (downstream) of the component nodes.
fn place_external_columns(model: &GraphModel, result: &mut PrimaryLayout, config: &LayoutConfig) {
    let components: Vec<&NodeLayout> = result
        .nodes
        .iter()
        .filter(|node| node.layer == Layer::Component)
        .collect();
    let has_external = result.nodes.iter().any(|node| node.layer == Layer::External);
    if components.is_empty() || !has_external {
        return;
    }
    let min_x = components.iter().map(|node| node.x).fold(f32::INFINITY, f32::min);
    let max_x = components.iter().map(|node| node.x).fold(f32::NEG_INFINITY, f32::max);
    let min_left = components.iter().map(|node| node.left()).fold(f32::INFINITY, f32::min);
    let max_right = components.iter().map(|node| node.right()).fold(f32::NEG_INFINITY, f32::max);
    let avg_y = components.iter().map(|node| node.y).sum::<f32>() / components.len() as f32;

    let mut upstream: Vec<(String, f32, f32)> = Vec::new();
    let mut downstream: Vec<(String, f32, f32)> = Vec::new();
    for node in model.nodes_in(Layer::External) {
        let entry = (node.id.clone(), node.width, node.height);
        match node.cross_direction {
            Some(CrossDirection::Upstream) => upstream.push(entry),
            Some(CrossDirection::Downstream) | None => downstream.push(entry),
        }
    }
    let half_width = |column: &[(String, f32, f32)]| column.iter().map(|(_, w, _)| w / 2.0).fold(0.0, f32::max);

    let mut place_column = |column: &[(String, f32, f32)], col_x: f32| {
        let offsets = column_offsets(column, config);
        let total = offsets.last().copied().unwrap_or(0.0);
        for ((id, _, _), offset) in column.iter().zip(offsets) {
            if let Some(node) = result.nodes.iter_mut().find(|node| &node.id == id) {
                node.x = col_x;
                node.y = avg_y - total / 2.0 + offset;
                node.rank = None;
            }
        }
    };
    if !upstream.is_empty() {
        let col_x = (min_x - config.separation_gap).min(min_left - config.rank_spacing - half_width(&upstream));
        place_column(&upstream, col_x);
        result.upstream_col = Some(col_x);
    }
    if !downstream.is_empty() {
        let col_x = (max_x + config.separation_gap).max(max_right + config.rank_spacing + half_width(&downstream));
        place_column(&downstream, col_x);
        result.downstream_col = Some(col_x);
    }

    // Edges into the columns are routed directly.
    let external: HashSet<&str> = model.nodes_in(Layer::External).map(|node| node.id.as_str()).collect();
    result.waypoints.retain(|edge_id, _| {
        model
            .edge(edge_id)
            .is_none_or(|edge| !external.contains(edge.source.as_str()) && !external.contains(edge.target.as_str()))
    });
}

/// Center offsets down one external column. Slots are `external_spacing`
/// apart unless the node heights need more room.
fn column_offsets(column: &[(String, f32, f32)], config: &LayoutConfig) -> Vec<f32> {
    let mut offsets = Vec::with_capacity(column.len());
    let mut prev: Option<(f32, f32)> = None;
    for (_, _, height) in column {
        let offset = match prev {
            None => 0.0,
            Some((prev_offset, prev_height)) => {
                prev_offset + config.external_spacing.max((prev_height + height) / 2.0 + config.node_spacing)
            }
        };
        offsets.push(offset);
        prev = Some((offset, *height));
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ActiveLayers;
    use crate::model::build_model;
    use crate::parser::parse_payload;

    fn primary(json: &str) -> PrimaryLayout {
        let payload = parse_payload(json).expect("payload");
        let config = LayoutConfig::default();
        let model = build_model(&payload, &ActiveLayers::default(), &config);
        layout_primary(&model, &config)
    }

    fn node<'a>(layout: &'a PrimaryLayout, id: &str) -> &'a NodeLayout {
        layout.nodes.iter().find(|node| node.id == id).expect("node placed")
    }

    #[test]
    fn single_node_sits_at_origin() {
        let layout = primary(r#"{"root": {"id": "A"}}"#);
        assert_eq!(layout.nodes.len(), 1);
        assert_eq!((layout.nodes[0].x, layout.nodes[0].y), (0.0, 0.0));
    }

    #[test]
    fn ranks_flow_left_to_right() {
        let layout = primary(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}, {"id": "C"}],
                "edges": [{"source": "A", "target": "B"}, {"source": "B", "target": "C"}]}"#,
        );
        let (a, b, c) = (node(&layout, "A"), node(&layout, "B"), node(&layout, "C"));
        assert!(a.x < b.x && b.x < c.x);
        let config = LayoutConfig::default();
        let min_step = config.nodes.component.width + config.node_padding_x + config.rank_spacing;
        assert!(b.x - a.x >= min_step - 1e-3);
    }

    #[test]
    fn siblings_in_a_rank_do_not_overlap() {
        let layout = primary(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}, {"id": "C"}, {"id": "D"}],
                "edges": [{"source": "A", "target": "B"}, {"source": "A", "target": "C"}, {"source": "A", "target": "D"}]}"#,
        );
        let config = LayoutConfig::default();
        let min_dy = config.nodes.component.height + config.node_padding_y + config.node_spacing;
        let mut ys: Vec<f32> = ["B", "C", "D"].iter().map(|id| node(&layout, id).y).collect();
        ys.sort_by(f32::total_cmp);
        assert!(ys.windows(2).all(|pair| pair[1] - pair[0] >= min_dy - 1e-3));
    }

    #[test]
    fn long_edges_get_waypoints() {
        let layout = primary(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}, {"id": "C"}],
                "edges": [{"source": "A", "target": "B"}, {"source": "B", "target": "C"}, {"source": "A", "target": "C"}]}"#,
        );
        let points = layout.waypoints.get("e-A-C").expect("waypoints");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].0, node(&layout, "B").x);
    }

    #[test]
    fn disconnected_components_are_stacked() {
        let layout = primary(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}, {"id": "X"}, {"id": "Y"}],
                "edges": [{"source": "A", "target": "B"}, {"source": "X", "target": "Y"}]}"#,
        );
        let (a, x) = (node(&layout, "A"), node(&layout, "X"));
        assert_eq!(a.x, x.x);
        assert!(x.y > a.y);
        let config = LayoutConfig::default();
        let padded_height = config.nodes.component.height + config.node_padding_y;
        assert!(x.y - a.y >= padded_height + config.component_spacing - 1e-3);
    }

    #[test]
    fn externals_move_to_columns() {
        let layout = primary(
            r#"{"components": {
                    "nodes": [{"id": "a"}, {"id": "b"}],
                    "edges": [{"source": "a", "target": "b"}, {"source": "up", "target": "a"}, {"source": "b", "target": "down"}],
                    "external_nodes": [
                        {"id": "up", "cross_direction": "upstream"},
                        {"id": "down", "cross_direction": "downstream"}
                    ]}}"#,
        );
        let config = LayoutConfig::default();
        let (a, b) = (node(&layout, "a"), node(&layout, "b"));
        assert_eq!(node(&layout, "up").x, a.x - config.separation_gap);
        assert_eq!(node(&layout, "down").x, b.x + config.separation_gap);
        assert_eq!(layout.upstream_col, Some(a.x - config.separation_gap));
    }

    #[test]
    fn columns_clear_payload_sized_nodes() {
        let layout = primary(
            r#"{"components": {
                    "nodes": [{"id": "a", "width": 420}],
                    "edges": [{"source": "up", "target": "a"}, {"source": "up2", "target": "a"}],
                    "external_nodes": [
                        {"id": "up", "cross_direction": "upstream", "height": 140},
                        {"id": "up2", "cross_direction": "upstream", "width": 300}
                    ]}}"#,
        );
        let config = LayoutConfig::default();
        let a = node(&layout, "a");
        let (up, up2) = (node(&layout, "up"), node(&layout, "up2"));
        assert_eq!(up.x, up2.x);
        assert_eq!(up.x, a.left() - config.rank_spacing - 150.0);
        assert!(up2.right() + config.rank_spacing <= a.left() + 1e-3);
        assert!(up2.top() - up.bottom() >= config.node_spacing - 1e-3);
        assert!(((up.y + up2.y) / 2.0 - a.y).abs() < 1e-3);
    }

    #[test]
    fn cycles_do_not_break_layout() {
        let layout = primary(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}],
                "edges": [{"source": "A", "target": "B"}, {"source": "B", "target": "A"}]}"#,
        );
        assert!(node(&layout, "A").x < node(&layout, "B").x);
    }
}
