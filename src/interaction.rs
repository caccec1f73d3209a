use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::ir::{GraphModel, Layer, NodeData};
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionState {
    Idle,
    Highlighted,
}

/// How an edge is drawn relative to the current highlight set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeEmphasis {
    Highlighted,
    Dimmed,
    Neutral,
}

impl EdgeEmphasis {
    /// Pure function of membership and whether anything is highlighted.
    pub fn of(in_set: bool, any_highlighted: bool) -> Self {
        match (in_set, any_highlighted) {
            (true, _) => EdgeEmphasis::Highlighted,
            (false, true) => EdgeEmphasis::Dimmed,
            (false, false) => EdgeEmphasis::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub color: String,
    pub width: f32,
    pub opacity: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<&'static str>,
    /// Draw a soft halo under the stroke.
    pub glow: bool,
}

pub const HIGHLIGHT_WIDTH: f32 = 2.5;
pub const NEUTRAL_WIDTH: f32 = 1.4;
pub const DIMMED_OPACITY: f32 = 0.15;

/// Stroke for an edge of `layer` drawn in `color` with the given emphasis.
pub fn edge_style_for(layer: Layer, color: &str, emphasis: EdgeEmphasis, theme: &Theme) -> EdgeStyle {
    let highlighted = emphasis == EdgeEmphasis::Highlighted;
    let dash = match layer {
        Layer::Platform => Some("6 3"),
        Layer::Datacenter => Some("3 3"),
        Layer::Indicator | Layer::IndicatorGroup => Some("4 2"),
        Layer::Component | Layer::External => highlighted.then_some("6 3"),
    };
    let color = match emphasis {
        EdgeEmphasis::Dimmed => theme.dimmed_edge_color.clone(),
        EdgeEmphasis::Highlighted | EdgeEmphasis::Neutral => color.to_string(),
    };
    EdgeStyle {
        color,
        width: if highlighted { HIGHLIGHT_WIDTH } else { NEUTRAL_WIDTH },
        opacity: if emphasis == EdgeEmphasis::Dimmed { DIMMED_OPACITY } else { 1.0 },
        dash,
        glow: highlighted,
    }
}

#[derive(Debug, Clone)]
struct EdgeEntry {
    layer: Layer,
    color: String,
    target: String,
}

/// Click-driven edge highlighting for one graph session.
///
/// The controller keeps the set of highlighted edge ids. Node clicks select
/// the edges incident to the node, edge clicks select or toggle a single
/// edge, and a click on the background clears everything. Ids that are not
/// part of the current graph are ignored.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    incident: HashMap<String, Vec<String>>,
    edges: HashMap<String, EdgeEntry>,
    nodes: HashMap<String, NodeData>,
    highlighted: BTreeSet<String>,
    selected: Option<NodeData>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_model(model: &GraphModel) -> Self {
        let mut controller = Self::new();
        controller.rebuild(model);
        controller
    }

    /// Replaces the adjacency with the one of `model` and clears the
    /// highlight set and selection.
    pub fn rebuild(&mut self, model: &GraphModel) {
        self.incident.clear();
        self.edges.clear();
        self.nodes.clear();
        self.highlighted.clear();
        self.selected = None;

        for node in &model.nodes {
            self.incident.entry(node.id.clone()).or_default();
            self.nodes.insert(node.id.clone(), node.data());
        }
        for edge in &model.edges {
            self.incident.entry(edge.source.clone()).or_default().push(edge.id.clone());
            if edge.target != edge.source {
                self.incident.entry(edge.target.clone()).or_default().push(edge.id.clone());
            }
            self.edges.insert(
                edge.id.clone(),
                EdgeEntry {
                    layer: edge.layer,
                    color: edge.color.clone(),
                    target: edge.target.clone(),
                },
            );
        }
        tracing::debug!(nodes = self.nodes.len(), edges = self.edges.len(), "interaction state rebuilt");
    }

    /// Returns whether the click was applied.
    pub fn on_node_click(&mut self, node_id: &str, modifier: bool) -> bool {
        let Some(incident) = self.incident.get(node_id) else {
            tracing::debug!(node = node_id, "ignoring click on unknown node");
            return false;
        };
        if !modifier {
            self.highlighted.clear();
        }
        self.highlighted.extend(incident.iter().cloned());
        self.selected = self.nodes.get(node_id).cloned();
        true
    }

    /// Returns whether the click was applied.
    pub fn on_edge_click(&mut self, edge_id: &str, modifier: bool) -> bool {
        let Some(entry) = self.edges.get(edge_id) else {
            tracing::debug!(edge = edge_id, "ignoring click on unknown edge");
            return false;
        };
        if modifier {
            if !self.highlighted.remove(edge_id) {
                self.highlighted.insert(edge_id.to_string());
            }
        } else {
            self.highlighted.clear();
            self.highlighted.insert(edge_id.to_string());
        }
        self.selected = self.nodes.get(&entry.target).cloned();
        true
    }

    pub fn on_pane_click(&mut self) {
        self.highlighted.clear();
    }

    pub fn highlighted(&self) -> &BTreeSet<String> {
        &self.highlighted
    }

    pub fn state(&self) -> InteractionState {
        if self.highlighted.is_empty() {
            InteractionState::Idle
        } else {
            InteractionState::Highlighted
        }
    }

    pub fn edge_emphasis(&self, edge_id: &str) -> EdgeEmphasis {
        EdgeEmphasis::of(self.highlighted.contains(edge_id), !self.highlighted.is_empty())
    }

    pub fn edge_style(&self, edge_id: &str, theme: &Theme) -> Option<EdgeStyle> {
        let entry = self.edges.get(edge_id)?;
        Some(edge_style_for(entry.layer, &entry.color, self.edge_emphasis(edge_id), theme))
    }

    pub fn selected_node_data(&self) -> Option<&NodeData> {
        self.selected.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::ActiveLayers;
    use crate::model::build_model;
    use crate::parser::parse_payload;

    fn abc() -> InteractionController {
        let payload = parse_payload(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}, {"id": "C", "status": "critical"}],
                "edges": [{"source": "A", "target": "B"}, {"source": "A", "target": "C"}]}"#,
        )
        .expect("payload");
        let model = build_model(&payload, &ActiveLayers::default(), &LayoutConfig::default());
        InteractionController::from_model(&model)
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn node_clicks_select_and_extend() {
        let mut controller = abc();
        assert_eq!(controller.state(), InteractionState::Idle);

        assert!(controller.on_node_click("B", false));
        assert_eq!(controller.highlighted(), &set(&["e-A-B"]));
        assert_eq!(controller.edge_emphasis("e-A-B"), EdgeEmphasis::Highlighted);
        assert_eq!(controller.edge_emphasis("e-A-C"), EdgeEmphasis::Dimmed);

        assert!(controller.on_node_click("C", true));
        assert_eq!(controller.highlighted(), &set(&["e-A-B", "e-A-C"]));

        controller.on_pane_click();
        assert!(controller.highlighted().is_empty());
        assert_eq!(controller.edge_emphasis("e-A-C"), EdgeEmphasis::Neutral);
    }

    #[test]
    fn plain_node_click_replaces_selection() {
        let mut controller = abc();
        controller.on_node_click("B", false);
        controller.on_node_click("C", false);
        assert_eq!(controller.highlighted(), &set(&["e-A-C"]));
        assert_eq!(controller.selected_node_data().map(|data| data.id.as_str()), Some("C"));
    }

    #[test]
    fn modifier_edge_click_toggles() {
        let mut controller = abc();
        controller.on_node_click("A", false);
        let before = controller.highlighted().clone();
        controller.on_edge_click("e-A-B", true);
        assert!(!controller.highlighted().contains("e-A-B"));
        controller.on_edge_click("e-A-B", true);
        assert_eq!(controller.highlighted(), &before);
    }

    #[test]
    fn modifier_edge_clicks_from_idle_return_to_idle() {
        let mut controller = abc();
        assert_eq!(controller.state(), InteractionState::Idle);
        assert!(controller.on_edge_click("e-A-B", true));
        assert_eq!(controller.state(), InteractionState::Highlighted);
        assert_eq!(controller.highlighted(), &set(&["e-A-B"]));
        assert!(controller.on_edge_click("e-A-B", true));
        assert_eq!(controller.state(), InteractionState::Idle);
        assert!(controller.highlighted().is_empty());
        assert_eq!(controller.edge_emphasis("e-A-B"), EdgeEmphasis::Neutral);
    }

    #[test]
    fn pane_click_clears_from_any_state() {
        let mut controller = abc();
        controller.on_pane_click();
        assert_eq!(controller.state(), InteractionState::Idle);
        assert!(controller.highlighted().is_empty());

        controller.on_edge_click("e-A-B", true);
        controller.on_edge_click("e-A-C", true);
        controller.on_node_click("B", true);
        assert_eq!(controller.highlighted(), &set(&["e-A-B", "e-A-C"]));
        controller.on_pane_click();
        assert_eq!(controller.state(), InteractionState::Idle);
        assert!(controller.highlighted().is_empty());
    }

    #[test]
    fn plain_edge_click_selects_only_that_edge() {
        let mut controller = abc();
        controller.on_node_click("A", false);
        controller.on_edge_click("e-A-C", false);
        assert_eq!(controller.highlighted(), &set(&["e-A-C"]));
        assert_eq!(controller.selected_node_data().map(|data| data.id.as_str()), Some("C"));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut controller = abc();
        controller.on_node_click("B", false);
        assert!(!controller.on_node_click("nope", false));
        assert!(!controller.on_edge_click("e-x-y", false));
        assert_eq!(controller.highlighted(), &set(&["e-A-B"]));
    }

    #[test]
    fn rebuild_clears_highlight_and_selection() {
        let mut controller = abc();
        controller.on_node_click("A", false);
        let payload = parse_payload(r#"{"root": {"id": "A"}}"#).expect("payload");
        let model = build_model(&payload, &ActiveLayers::default(), &LayoutConfig::default());
        controller.rebuild(&model);
        assert!(controller.highlighted().is_empty());
        assert!(controller.selected_node_data().is_none());
        assert!(!controller.on_edge_click("e-A-B", false));
    }

    #[test]
    fn styles_follow_emphasis_and_layer() {
        let theme = Theme::dark();
        let highlighted = edge_style_for(Layer::Component, "#f44336", EdgeEmphasis::Highlighted, &theme);
        assert_eq!(highlighted.width, HIGHLIGHT_WIDTH);
        assert_eq!(highlighted.dash, Some("6 3"));
        assert!(highlighted.glow);

        let dimmed = edge_style_for(Layer::Component, "#f44336", EdgeEmphasis::Dimmed, &theme);
        assert_eq!(dimmed.opacity, DIMMED_OPACITY);
        assert_eq!(dimmed.color, theme.dimmed_edge_color);
        assert_eq!(dimmed.dash, None);

        let neutral = edge_style_for(Layer::Datacenter, "#5DA5A0", EdgeEmphasis::Neutral, &theme);
        assert_eq!(neutral.width, NEUTRAL_WIDTH);
        assert_eq!(neutral.dash, Some("3 3"));
    }

    #[test]
    fn edge_style_uses_target_status_color() {
        let controller = abc();
        let style = controller.edge_style("e-A-C", &Theme::dark()).expect("style");
        assert_eq!(style.color, crate::theme::CRITICAL_COLOR);
    }
}
