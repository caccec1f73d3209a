use std::collections::{BTreeMap, HashMap};

use crate::ir::{Edge, GraphModel, Layer};

use super::types::{EdgeLayout, Handle, NodeLayout};

const EPS: f32 = 1e-4;

/// Handles an edge binds to, from the layers of its endpoints. Primary edges
/// run left to right; edges into a row above leave from the top; edges into a
/// row below leave from the bottom.
pub(super) fn edge_handles(source: Layer, target: Layer) -> (Handle, Handle) {
    match (source, target) {
        (Layer::Component | Layer::External, Layer::Component | Layer::External) => {
            (Handle::Right, Handle::Left)
        }
        (_, Layer::Indicator | Layer::IndicatorGroup) => (Handle::Top, Handle::Bottom),
        (Layer::Indicator | Layer::IndicatorGroup, _) => (Handle::Bottom, Handle::Top),
        (_, Layer::Platform | Layer::Datacenter) => (Handle::Bottom, Handle::Top),
        (Layer::Platform | Layer::Datacenter, Layer::Component | Layer::External) => {
            (Handle::Top, Handle::Bottom)
        }
    }
}

fn is_horizontal(handle: Handle) -> bool {
    match handle {
        Handle::Left | Handle::Right => true,
        Handle::Top | Handle::Bottom => false,
    }
}

/// Orthogonal path through `via`, with one elbow halfway between each pair
/// of consecutive points.
pub(super) fn smooth_step(
    start: (f32, f32),
    end: (f32, f32),
    source_handle: Handle,
    via: &[(f32, f32)],
) -> Vec<(f32, f32)> {
    let horizontal = is_horizontal(source_handle);
    let mut stops = Vec::with_capacity(via.len() + 2);
    stops.push(start);
    stops.extend_from_slice(via);
    stops.push(end);

    let mut points = vec![start];
    for pair in stops.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if horizontal {
            let mid_x = (from.0 + to.0) / 2.0;
            points.push((mid_x, from.1));
            points.push((mid_x, to.1));
        } else {
            let mid_y = (from.1 + to.1) / 2.0;
            points.push((from.0, mid_y));
            points.push((to.0, mid_y));
        }
        points.push(to);
    }
    compress_path(&points)
}

/// Drops repeated points and interior points on a straight run.
pub(super) fn compress_path(points: &[(f32, f32)]) -> Vec<(f32, f32)> {
    let mut out: Vec<(f32, f32)> = Vec::with_capacity(points.len());
    for &point in points {
        if let Some(&last) = out.last() {
            if (point.0 - last.0).abs() <= EPS && (point.1 - last.1).abs() <= EPS {
                continue;
            }
        }
        if out.len() >= 2 {
            let prev = out[out.len() - 2];
            let curr = out[out.len() - 1];
            let vertical_run = (prev.0 - curr.0).abs() <= EPS && (curr.0 - point.0).abs() <= EPS;
            let horizontal_run = (prev.1 - curr.1).abs() <= EPS && (curr.1 - point.1).abs() <= EPS;
            if vertical_run || horizontal_run {
                out.pop();
            }
        }
        out.push(point);
    }
    out
}

fn route_edge(edge: &Edge, from: &NodeLayout, to: &NodeLayout, via: &[(f32, f32)]) -> EdgeLayout {
    let (source_handle, target_handle) = edge_handles(from.layer, to.layer);
    let start = from.anchor(source_handle);
    let end = to.anchor(target_handle);
    EdgeLayout {
        id: edge.id.clone(),
        source: edge.source.clone(),
        target: edge.target.clone(),
        layer: edge.layer,
        color: edge.color.clone(),
        direction: edge.direction,
        source_handle,
        target_handle,
        points: smooth_step(start, end, source_handle, via),
    }
}

/// Routes every model edge whose endpoints were placed, in model order.
pub(super) fn route_edges(
    model: &GraphModel,
    nodes: &BTreeMap<String, NodeLayout>,
    waypoints: &HashMap<String, Vec<(f32, f32)>>,
) -> Vec<EdgeLayout> {
    model
        .edges
        .iter()
        .filter_map(|edge| {
            let from = nodes.get(&edge.source)?;
            let to = nodes.get(&edge.target)?;
            let via = waypoints.get(&edge.id).map_or(&[][..], Vec::as_slice);
            Some(route_edge(edge, from, to, via))
        })
        .collect()
}
