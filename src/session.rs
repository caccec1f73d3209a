use crate::config::Config;
use crate::error::GraphError;
use crate::interaction::{EdgeEmphasis, EdgeStyle, InteractionController, edge_style_for};
use crate::ir::{ActiveLayers, GraphModel, NodeData};
use crate::layout::{EdgeLayout, Layout, compute_layout};
use crate::layout_dump::LayoutDump;
use crate::model::build_model;
use crate::parser::{GraphPayload, parse_payload};
use crate::render::render_svg;

/// Routed edge joined with its current style.
#[derive(Debug, Clone)]
pub struct RenderedEdge<'a> {
    pub edge: &'a EdgeLayout,
    pub emphasis: EdgeEmphasis,
    pub style: EdgeStyle,
}

/// Everything shown for one root entity: the payload, the active layers, the
/// derived model and layout, and the click state. Changing the payload or the
/// layers rebuilds the model and layout and clears the highlight.
#[derive(Debug, Clone)]
pub struct GraphSession {
    payload: GraphPayload,
    active: ActiveLayers,
    config: Config,
    model: GraphModel,
    layout: Layout,
    interaction: InteractionController,
}

impl GraphSession {
    pub fn new(payload: GraphPayload, active: ActiveLayers, config: Config) -> Self {
        let mut session = Self {
            payload,
            active: active.normalized(),
            config,
            model: GraphModel::default(),
            layout: Layout::default(),
            interaction: InteractionController::new(),
        };
        session.rebuild();
        session
    }

    pub fn from_json(input: &str, active: ActiveLayers, config: Config) -> Result<Self, GraphError> {
        Ok(Self::new(parse_payload(input)?, active, config))
    }

    pub fn set_payload(&mut self, payload: GraphPayload) {
        self.payload = payload;
        self.rebuild();
    }

    pub fn set_active_layers(&mut self, active: ActiveLayers) {
        self.active = active.normalized();
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.model = build_model(&self.payload, &self.active, &self.config.layout);
        self.layout = compute_layout(&self.model, &self.config.layout);
        self.interaction.rebuild(&self.model);
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn active_layers(&self) -> ActiveLayers {
        self.active
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn on_node_click(&mut self, node_id: &str, modifier: bool) -> bool {
        self.interaction.on_node_click(node_id, modifier)
    }

    pub fn on_edge_click(&mut self, edge_id: &str, modifier: bool) -> bool {
        self.interaction.on_edge_click(edge_id, modifier)
    }

    pub fn on_pane_click(&mut self) {
        self.interaction.on_pane_click();
    }

    pub fn selected_node_data(&self) -> Option<&NodeData> {
        self.interaction.selected_node_data()
    }

    pub fn render_edges(&self) -> Vec<RenderedEdge<'_>> {
        let theme = &self.config.theme;
        self.layout
            .edges
            .iter()
            .map(|edge| {
                let emphasis = self.interaction.edge_emphasis(&edge.id);
                let style = self
                    .interaction
                    .edge_style(&edge.id, theme)
                    .unwrap_or_else(|| edge_style_for(edge.layer, &edge.color, emphasis, theme));
                RenderedEdge { edge, emphasis, style }
            })
            .collect()
    }

    pub fn render_svg(&self) -> String {
        render_svg(&self.layout, &self.interaction, &self.config.theme, &self.config.render)
    }

    pub fn dump(&self) -> LayoutDump {
        LayoutDump::from_layout(&self.layout, &self.interaction, &self.config.theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::InteractionState;
    use crate::ir::Layer;

    const LAYERED: &str = r#"{
        "root": {"id": "A"},
        "dependencies": [{"id": "B"}],
        "edges": [{"source": "A", "target": "B"}],
        "layers": {
            "platform": {"nodes": [{"id": "p"}], "edges": [{"source": "B", "target": "p"}]},
            "datacenter": {"nodes": [{"id": "dc"}], "edges": [{"source": "p", "target": "dc"}]}
        }
    }"#;

    fn session(active: ActiveLayers) -> GraphSession {
        GraphSession::from_json(LAYERED, active, Config::default()).expect("payload")
    }

    #[test]
    fn layer_change_rebuilds_and_clears_highlight() {
        let mut session = session(ActiveLayers::default());
        assert!(session.on_node_click("B", false));
        assert_eq!(session.interaction().state(), InteractionState::Highlighted);
        assert!(session.layout().row(Layer::Platform).next().is_none());

        session.set_active_layers(ActiveLayers::all());
        assert_eq!(session.interaction().state(), InteractionState::Idle);
        assert!(session.layout().row(Layer::Platform).next().is_some());
        assert!(session.layout().row(Layer::Datacenter).next().is_some());
    }

    #[test]
    fn datacenter_needs_platform() {
        let session = session(ActiveLayers {
            datacenter: true,
            ..ActiveLayers::default()
        });
        assert!(!session.model().contains("dc"));
        assert!(session.layout().row(Layer::Datacenter).next().is_none());
    }

    #[test]
    fn render_edges_follow_clicks() {
        let mut session = session(ActiveLayers::all());
        session.on_edge_click("e-A-B", false);
        let edges = session.render_edges();
        let clicked = edges.iter().find(|item| item.edge.id == "e-A-B").expect("edge");
        assert_eq!(clicked.emphasis, EdgeEmphasis::Highlighted);
        assert!(
            edges
                .iter()
                .filter(|item| item.edge.id != "e-A-B")
                .all(|item| item.emphasis == EdgeEmphasis::Dimmed)
        );
        session.on_pane_click();
        assert!(session.render_edges().iter().all(|item| item.emphasis == EdgeEmphasis::Neutral));
    }

    #[test]
    fn new_payload_resets_selection() {
        let mut session = session(ActiveLayers::default());
        session.on_node_click("A", false);
        assert!(session.selected_node_data().is_some());
        session.set_payload(GraphPayload::default());
        assert!(session.selected_node_data().is_none());
        assert!(session.layout().is_empty());
    }
}
