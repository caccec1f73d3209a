mod auxiliary;
mod primary;
mod ranking;
mod routing;
mod sweep;
pub(crate) mod types;
pub use types::*;

use auxiliary::{Columns, layout_auxiliary};
use primary::layout_primary;
use routing::route_edges;

use crate::config::LayoutConfig;
use crate::ir::{GraphModel, Layer};
use std::collections::BTreeMap;

/// Lays out the whole graph: the primary layer first, then the auxiliary rows
/// around it, then zones and edge routes. Deterministic for a given model and
/// config; an empty model gives an empty layout with zero bounds.
pub fn compute_layout(model: &GraphModel, config: &LayoutConfig) -> Layout {
    if model.is_empty() {
        return Layout::default();
    }

    let primary = layout_primary(model, config);
    let columns = Columns {
        upstream: primary.upstream_col,
        downstream: primary.downstream_col,
    };
    let auxiliary = layout_auxiliary(model, &primary.nodes, columns, config);

    let mut nodes: BTreeMap<String, NodeLayout> = BTreeMap::new();
    for node in primary.nodes.into_iter().chain(auxiliary.nodes) {
        nodes.insert(node.id.clone(), node);
    }
    let zones = build_zones(&nodes, columns, config);
    let edges = route_edges(model, &nodes, &primary.waypoints);
    let bounds = compute_bounds(&nodes, &zones, &edges);

    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        rows = auxiliary.rows.len(),
        zones = zones.len(),
        width = bounds.width(),
        height = bounds.height(),
        "computed layout"
    );
    Layout {
        nodes,
        edges,
        rows: auxiliary.rows,
        zones,
        bounds,
    }
}

/// Background bands behind the external columns, spanning every placed node
/// vertically.
fn build_zones(nodes: &BTreeMap<String, NodeLayout>, columns: Columns, config: &LayoutConfig) -> Vec<ZoneLayout> {
    if nodes.is_empty() {
        return Vec::new();
    }
    let top = nodes.values().map(NodeLayout::top).fold(f32::INFINITY, f32::min);
    let bottom = nodes.values().map(NodeLayout::bottom).fold(f32::NEG_INFINITY, f32::max);
    let width = nodes
        .values()
        .filter(|node| node.layer == Layer::External)
        .map(|node| node.width)
        .fold(config.nodes.external.width, f32::max)
        + config.zone_extra_width;
    let height = bottom - top + config.zone_padding_y * 2.0;
    let y = (top + bottom) / 2.0;

    [(ZoneKind::Upstream, columns.upstream), (ZoneKind::Downstream, columns.downstream)]
        .into_iter()
        .filter_map(|(kind, x)| {
            Some(ZoneLayout {
                kind,
                x: x?,
                y,
                width,
                height,
            })
        })
        .collect()
}

fn compute_bounds(
    nodes: &BTreeMap<String, NodeLayout>,
    zones: &[ZoneLayout],
    edges: &[EdgeLayout],
) -> Bounds {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let mut include = |x0: f32, y0: f32, x1: f32, y1: f32| {
        min_x = min_x.min(x0);
        min_y = min_y.min(y0);
        max_x = max_x.max(x1);
        max_y = max_y.max(y1);
    };
    for node in nodes.values() {
        include(node.left(), node.top(), node.right(), node.bottom());
    }
    for zone in zones {
        include(
            zone.x - zone.width / 2.0,
            zone.y - zone.height / 2.0,
            zone.x + zone.width / 2.0,
            zone.y + zone.height / 2.0,
        );
    }
    for &(x, y) in edges.iter().flat_map(|edge| edge.points.iter()) {
        include(x, y, x, y);
    }
    if !min_x.is_finite() {
        return Bounds::default();
    }
    Bounds {
        min_x,
        min_y,
        max_x,
        max_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ActiveLayers, Layer};
    use crate::model::build_model;
    use crate::parser::parse_payload;

    fn layout(json: &str, active: ActiveLayers) -> Layout {
        let payload = parse_payload(json).expect("payload");
        let config = LayoutConfig::default();
        compute_layout(&build_model(&payload, &active, &config), &config)
    }

    #[test]
    fn empty_model_gives_empty_layout() {
        let layout = layout(r#"{"dependencies": [{"id": "A"}]}"#, ActiveLayers::default());
        assert!(layout.is_empty());
        assert!(layout.edges.is_empty());
        assert_eq!(layout.bounds, Bounds::default());
    }

    #[test]
    fn bounds_cover_every_node() {
        let layout = layout(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}],
                "edges": [{"source": "A", "target": "B"}],
                "layers": {"platform": {"nodes": [{"id": "p"}], "edges": [{"source": "B", "target": "p"}]}}}"#,
            ActiveLayers {
                platform: true,
                ..ActiveLayers::default()
            },
        );
        for node in layout.nodes.values() {
            assert!(node.left() >= layout.bounds.min_x);
            assert!(node.right() <= layout.bounds.max_x);
            assert!(node.top() >= layout.bounds.min_y);
            assert!(node.bottom() <= layout.bounds.max_y);
        }
        assert_eq!(layout.row(Layer::Platform).count(), 1);
    }

    #[test]
    fn zones_span_all_rows() {
        let layout = layout(
            r#"{"components": {
                    "nodes": [{"id": "a"}],
                    "edges": [{"source": "up", "target": "a"}],
                    "external_nodes": [{"id": "up", "cross_direction": "upstream"}]},
                "platform": {"nodes": [{"id": "p"}], "edges": [{"source": "a", "target": "p"}]}}"#,
            ActiveLayers {
                platform: true,
                ..ActiveLayers::default()
            },
        );
        assert_eq!(layout.zones.len(), 1);
        let zone = &layout.zones[0];
        assert_eq!(zone.kind, ZoneKind::Upstream);
        let platform = &layout.nodes["p"];
        assert!(zone.y + zone.height / 2.0 >= platform.bottom());
    }

    #[test]
    fn edges_bind_layer_handles() {
        let layout = layout(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}],
                "edges": [{"source": "A", "target": "B"}],
                "layers": {"indicators": {"nodes": [{"id": "i", "component": "A"}]}}}"#,
            ActiveLayers {
                indicator: true,
                ..ActiveLayers::default()
            },
        );
        let primary = layout.edges.iter().find(|edge| edge.id == "e-A-B").expect("edge");
        assert_eq!((primary.source_handle, primary.target_handle), (Handle::Right, Handle::Left));
        let indicator = layout.edges.iter().find(|edge| edge.target == "i").expect("edge");
        assert_eq!((indicator.source_handle, indicator.target_handle), (Handle::Top, Handle::Bottom));
        assert_eq!(indicator.points.first(), Some(&layout.nodes["A"].anchor(Handle::Top)));
    }
}
