use crate::error::GraphError;
use crate::interaction::{EdgeEmphasis, EdgeStyle, InteractionController};
use crate::ir::{EdgeDirection, Layer, NodeData};
use crate::layout::Layout;
use crate::theme::Theme;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub rows: Vec<RowDump>,
    pub zones: Vec<ZoneDump>,
    pub highlighted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<NodeData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub layer: Layer,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    pub is_root: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub layer: Layer,
    pub direction: EdgeDirection,
    pub source_handle: &'static str,
    pub target_handle: &'static str,
    pub emphasis: EdgeEmphasis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
    pub points: Vec<[f32; 2]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDump {
    pub layer: Layer,
    pub y: f32,
    pub min_gap: f32,
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDump {
    pub label: &'static str,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, interaction: &InteractionController, theme: &Theme) -> Self {
        let nodes = layout
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id.clone(),
                label: node.label.clone(),
                layer: node.layer,
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                rank: node.rank,
                is_root: node.is_root,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                layer: edge.layer,
                direction: edge.direction,
                source_handle: edge.source_handle.as_str(),
                target_handle: edge.target_handle.as_str(),
                emphasis: interaction.edge_emphasis(&edge.id),
                style: interaction.edge_style(&edge.id, theme),
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        let rows = layout
            .rows
            .iter()
            .map(|row| RowDump {
                layer: row.layer,
                y: row.y,
                min_gap: row.min_gap,
                nodes: row.nodes.clone(),
            })
            .collect();

        let zones = layout
            .zones
            .iter()
            .map(|zone| ZoneDump {
                label: zone.kind.label(),
                x: zone.x,
                y: zone.y,
                width: zone.width,
                height: zone.height,
            })
            .collect();

        LayoutDump {
            width: layout.bounds.width(),
            height: layout.bounds.height(),
            nodes,
            edges,
            rows,
            zones,
            highlighted: interaction.highlighted().iter().cloned().collect(),
            selected: interaction.selected_node_data().cloned(),
        }
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string(self)?)
    }
}

pub fn write_layout_dump(path: &Path, dump: &LayoutDump) -> Result<(), GraphError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::ActiveLayers;
    use crate::layout::compute_layout;
    use crate::model::build_model;
    use crate::parser::parse_payload;

    #[test]
    fn dump_reports_emphasis_and_selection() {
        let payload = parse_payload(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}, {"id": "C"}],
                "edges": [{"source": "A", "target": "B"}, {"source": "A", "target": "C"}]}"#,
        )
        .expect("payload");
        let config = LayoutConfig::default();
        let model = build_model(&payload, &ActiveLayers::default(), &config);
        let layout = compute_layout(&model, &config);
        let mut interaction = InteractionController::from_model(&model);
        interaction.on_node_click("B", false);

        let dump = LayoutDump::from_layout(&layout, &interaction, &Theme::dark());
        assert_eq!(dump.nodes.len(), 3);
        assert_eq!(dump.highlighted, vec!["e-A-B".to_string()]);
        let json: serde_json::Value =
            serde_json::from_str(&dump.to_json().expect("json")).expect("valid json");
        assert_eq!(json["selected"]["id"], "B");
        let dimmed = json["edges"]
            .as_array()
            .and_then(|edges| edges.iter().find(|edge| edge["id"] == "e-A-C"))
            .expect("edge");
        assert_eq!(dimmed["emphasis"], "dimmed");
        assert_eq!(dimmed["sourceHandle"], "right");
    }
}
