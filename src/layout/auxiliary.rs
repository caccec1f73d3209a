use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::ir::{GraphModel, Layer, Node};

use super::sweep::{SweepItem, clamp_within, min_distance, resolve_overlaps, sort_items};
use super::types::{NodeLayout, RowLayout};

#[derive(Debug, Clone, Default)]
pub(super) struct AuxiliaryLayout {
    pub nodes: Vec<NodeLayout>,
    pub rows: Vec<RowLayout>,
}

/// Centers of the external-node columns, when present.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Columns {
    pub upstream: Option<f32>,
    pub downstream: Option<f32>,
}

const NUDGE_PASSES: usize = 3;

/// Horizontal extent of a parent-to-child edge, between the two centers.
#[derive(Debug, Clone, PartialEq)]
struct EdgeSpan {
    low: f32,
    high: f32,
    target: String,
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    /// Row sits above this y.
    Above(f32),
    /// Row sits below this y.
    Below(f32),
}

pub(super) fn layout_auxiliary(
    model: &GraphModel,
    primary: &[NodeLayout],
    columns: Columns,
    config: &LayoutConfig,
) -> AuxiliaryLayout {
    let mut placed_x: HashMap<String, f32> =
        primary.iter().map(|node| (node.id.clone(), node.x)).collect();
    let (top, bottom) = if primary.is_empty() {
        (0.0, 0.0)
    } else {
        (
            primary.iter().map(NodeLayout::top).fold(f32::INFINITY, f32::min),
            primary.iter().map(NodeLayout::bottom).fold(f32::NEG_INFINITY, f32::max),
        )
    };

    let external_width = primary
        .iter()
        .filter(|node| node.layer == Layer::External)
        .map(|node| node.width)
        .fold(config.nodes.external.width, f32::max);

    let mut out = AuxiliaryLayout::default();
    place_row(model, Layer::Indicator, Anchor::Above(top), None, &mut placed_x, config, &mut out);
    place_indicator_groups(model, top, &mut placed_x, config, &mut out);

    let platform_bounds = zone_bounds(columns, external_width, config.nodes.platform.width, config);
    let platform_bottom = place_row(
        model,
        Layer::Platform,
        Anchor::Below(bottom),
        platform_bounds,
        &mut placed_x,
        config,
        &mut out,
    );
    if model.active.is_active(Layer::Datacenter) {
        let datacenter_bounds = zone_bounds(columns, external_width, config.nodes.datacenter.width, config);
        place_row(
            model,
            Layer::Datacenter,
            Anchor::Below(platform_bottom.unwrap_or(bottom)),
            datacenter_bounds,
            &mut placed_x,
            config,
            &mut out,
        );
    }
    out
}

/// Allowed center range for a row of `node_width` nodes between the zone
/// columns.
fn zone_bounds(columns: Columns, external_width: f32, node_width: f32, config: &LayoutConfig) -> Option<(f32, f32)> {
    if columns.upstream.is_none() && columns.downstream.is_none() {
        return None;
    }
    let zone_half = (external_width + config.zone_extra_width) / 2.0;
    let clearance = zone_half + node_width / 2.0 + config.zone_clearance;
    let low = columns.upstream.map_or(f32::NEG_INFINITY, |x| x + clearance);
    let high = columns.downstream.map_or(f32::INFINITY, |x| x - clearance);
    Some((low, high))
}

fn ideal_x(node: &Node, placed_x: &HashMap<String, f32>) -> f32 {
    let xs: Vec<f32> = node
        .parent_ids
        .iter()
        .filter_map(|parent| placed_x.get(parent).copied())
        .collect();
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f32>() / xs.len() as f32
    }
}

/// Places one auxiliary row and returns its bottom edge.
fn place_row(
    model: &GraphModel,
    layer: Layer,
    anchor: Anchor,
    bounds: Option<(f32, f32)>,
    placed_x: &mut HashMap<String, f32>,
    config: &LayoutConfig,
    out: &mut AuxiliaryLayout,
) -> Option<f32> {
    let nodes: Vec<&Node> = model.nodes_in(layer).collect();
    if nodes.is_empty() {
        return None;
    }
    let gap = config.row_gap(layer);
    let mut items: Vec<SweepItem> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| SweepItem::new(node.id.clone(), ideal_x(node, placed_x), node.width, idx))
        .collect();
    resolve_overlaps(&mut items, gap);
    if layer != Layer::Indicator {
        let spans = edge_spans(&items, model, placed_x);
        nudge_from_edges(&mut items, &spans, gap, config.edge_clearance);
    }
    if let Some((low, high)) = bounds {
        clamp_within(&mut items, gap, low, high);
    }
    if layer != Layer::Indicator {
        snap_to_parent(&mut items, model, placed_x, gap, bounds);
    }

    let height = nodes.iter().map(|node| node.height).fold(0.0, f32::max);
    let y = match anchor {
        Anchor::Above(top) => top - config.vertical_gap - height / 2.0,
        Anchor::Below(bottom) => bottom + config.vertical_gap + height / 2.0,
    };

    let mut row_ids = Vec::with_capacity(items.len());
    for item in items {
        let Some(node) = model.node(&item.id) else {
            continue;
        };
        placed_x.insert(node.id.clone(), item.pos);
        out.nodes.push(aux_node(node, item.pos, y));
        row_ids.push(item.id);
    }
    tracing::trace!(layer = layer.as_str(), y, count = row_ids.len(), "placed auxiliary row");
    out.rows.push(RowLayout {
        layer,
        y,
        min_gap: gap,
        nodes: row_ids,
    });
    Some(y + height / 2.0)
}

fn edge_spans(items: &[SweepItem], model: &GraphModel, placed_x: &HashMap<String, f32>) -> Vec<EdgeSpan> {
    let mut spans = Vec::new();
    for item in items {
        let Some(node) = model.node(&item.id) else {
            continue;
        };
        for parent in &node.parent_ids {
            if let Some(&parent_x) = placed_x.get(parent) {
                spans.push(EdgeSpan {
                    low: parent_x.min(item.pos),
                    high: parent_x.max(item.pos),
                    target: item.id.clone(),
                });
            }
        }
    }
    spans
}

/// Moves nodes out of the horizontal shadow of edges they do not end, to the
/// nearer side, then restores spacing with a fresh greedy sweep.
fn nudge_from_edges(items: &mut [SweepItem], spans: &[EdgeSpan], gap: f32, margin: f32) {
    if items.len() <= 1 || spans.is_empty() {
        return;
    }
    for _ in 0..NUDGE_PASSES {
        let mut moved = false;
        for item in items.iter_mut() {
            let reach = item.extent / 2.0 + margin;
            for span in spans {
                if span.target == item.id || item.pos + reach <= span.low || item.pos - reach >= span.high {
                    continue;
                }
                let next = if item.pos - span.low <= span.high - item.pos {
                    span.low - reach
                } else {
                    span.high + reach
                };
                if next != item.pos {
                    item.pos = next;
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
    }
    resolve_overlaps(items, gap);
}

/// Moves single-parent nodes straight under their parent when the spot keeps
/// the row order, the minimum gap to both neighbours and the zone bounds.
fn snap_to_parent(
    items: &mut [SweepItem],
    model: &GraphModel,
    placed_x: &HashMap<String, f32>,
    gap: f32,
    bounds: Option<(f32, f32)>,
) {
    let (low, high) = bounds.unwrap_or((f32::NEG_INFINITY, f32::INFINITY));
    for idx in 0..items.len() {
        let Some(node) = model.node(&items[idx].id) else {
            continue;
        };
        let [parent] = node.parent_ids.as_slice() else {
            continue;
        };
        let Some(&parent_x) = placed_x.get(parent) else {
            continue;
        };
        if parent_x < low || parent_x > high {
            continue;
        }
        let fits_prev = idx == 0
            || parent_x >= items[idx - 1].pos + min_distance(&items[idx - 1], &items[idx], gap);
        let fits_next = idx + 1 == items.len()
            || parent_x <= items[idx + 1].pos - min_distance(&items[idx], &items[idx + 1], gap);
        if fits_prev && fits_next {
            items[idx].pos = parent_x;
        }
    }
}

/// Grouped indicators stay pinned above their component. Groups that would
/// overlap go to a higher row instead of being pushed sideways.
fn place_indicator_groups(
    model: &GraphModel,
    top: f32,
    placed_x: &mut HashMap<String, f32>,
    config: &LayoutConfig,
    out: &mut AuxiliaryLayout,
) {
    let groups: Vec<&Node> = model.nodes_in(Layer::IndicatorGroup).collect();
    if groups.is_empty() {
        return;
    }
    let settings = &config.indicator_group;
    let mut items: Vec<SweepItem> = groups
        .iter()
        .enumerate()
        .map(|(idx, node)| SweepItem::new(node.id.clone(), ideal_x(node, placed_x), node.width, idx))
        .collect();
    sort_items(&mut items);

    let mut rows: Vec<Vec<SweepItem>> = Vec::new();
    for item in items {
        let slot = rows.iter().position(|row| {
            row.last()
                .is_none_or(|last| item.pos >= last.pos + min_distance(last, &item, settings.gap))
        });
        match slot {
            Some(row) => rows[row].push(item),
            None => rows.push(vec![item]),
        }
    }

    let tallest = groups.iter().map(|node| node.height).fold(0.0, f32::max);
    let base = top - config.vertical_gap;
    for (row_idx, row) in rows.into_iter().enumerate() {
        let offset = stagger_offset(row_idx, settings.stagger);
        let row_bottom = base - row_idx as f32 * (tallest + settings.row_gap);
        let mut row_ids = Vec::with_capacity(row.len());
        for item in row {
            let Some(node) = model.node(&item.id) else {
                continue;
            };
            let x = item.pos + offset;
            placed_x.insert(node.id.clone(), x);
            out.nodes.push(aux_node(node, x, row_bottom - node.height / 2.0));
            row_ids.push(item.id);
        }
        out.rows.push(RowLayout {
            layer: Layer::IndicatorGroup,
            y: row_bottom - tallest / 2.0,
            min_gap: settings.gap,
            nodes: row_ids,
        });
    }
}

/// Row 0 stays put; higher rows alternate right and left in growing steps.
fn stagger_offset(row: usize, stagger: f32) -> f32 {
    if row == 0 {
        return 0.0;
    }
    let sign = if row % 2 == 1 { 1.0 } else { -1.0 };
    sign * row.div_ceil(2) as f32 * stagger
}

fn aux_node(node: &Node, x: f32, y: f32) -> NodeLayout {
    NodeLayout {
        id: node.id.clone(),
        layer: node.layer,
        label: node.label.clone(),
        x,
        y,
        width: node.width,
        height: node.height,
        is_root: false,
        rank: None,
    }
}
