use serde::{Deserialize, Serialize};
use service_graph_layout::config::Config;
use service_graph_layout::interaction::{EdgeEmphasis, EdgeStyle};
use service_graph_layout::theme::Theme;
use service_graph_layout::{ActiveLayers, GraphSession};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphViewOptions {
    layers: Option<ActiveLayers>,
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeView<'a> {
    id: &'a str,
    source: &'a str,
    target: &'a str,
    emphasis: EdgeEmphasis,
    style: &'a EdgeStyle,
    points: Vec<[f32; 2]>,
}

fn parse_options(options_json: Option<&str>) -> Result<GraphViewOptions, String> {
    match options_json {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw).map_err(|error| error.to_string()),
        _ => Ok(GraphViewOptions::default()),
    }
}

fn build_config(options: &GraphViewOptions) -> Config {
    let mut config = Config::default();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::from_name) {
        config.render.background = theme.background.clone();
        config.theme = theme;
    }
    if let Some(font_family) = &options.font_family {
        config.theme.font_family = font_family.clone();
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    config
}

fn open_session(payload_json: &str, options_json: Option<&str>) -> Result<GraphSession, String> {
    let options = parse_options(options_json)?;
    let config = build_config(&options);
    GraphSession::from_json(payload_json, options.layers.unwrap_or_default(), config).map_err(|error| error.to_string())
}

fn edges_view_json(session: &GraphSession) -> Result<String, String> {
    let rendered = session.render_edges();
    let edges: Vec<EdgeView<'_>> = rendered
        .iter()
        .map(|item| EdgeView {
            id: &item.edge.id,
            source: &item.edge.source,
            target: &item.edge.target,
            emphasis: item.emphasis,
            style: &item.style,
            points: item.edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
        })
        .collect();
    serde_json::to_string(&edges).map_err(|error| error.to_string())
}

fn to_js(error: String) -> JsValue {
    JsValue::from_str(&error)
}

/// Lays out a payload and returns the layout dump as JSON.
#[wasm_bindgen]
pub fn layout_graph(payload_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let session = open_session(payload_json, options_json.as_deref()).map_err(to_js)?;
    session.dump().to_json().map_err(|error| to_js(error.to_string()))
}

#[wasm_bindgen]
pub fn render_graph_svg(payload_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let session = open_session(payload_json, options_json.as_deref()).map_err(to_js)?;
    Ok(session.render_svg())
}

/// Stateful view for one root entity; clicks update the highlight set.
#[wasm_bindgen]
pub struct GraphView {
    session: GraphSession,
}

#[wasm_bindgen]
impl GraphView {
    #[wasm_bindgen(constructor)]
    pub fn new(payload_json: &str, options_json: Option<String>) -> Result<GraphView, JsValue> {
        let session = open_session(payload_json, options_json.as_deref()).map_err(to_js)?;
        Ok(GraphView { session })
    }

    #[wasm_bindgen(js_name = setLayers)]
    pub fn set_layers(&mut self, layers_json: &str) -> Result<(), JsValue> {
        let layers: ActiveLayers =
            serde_json::from_str(layers_json).map_err(|error| to_js(error.to_string()))?;
        self.session.set_active_layers(layers);
        Ok(())
    }

    #[wasm_bindgen(js_name = nodeClick)]
    pub fn node_click(&mut self, node_id: &str, modifier: bool) -> bool {
        self.session.on_node_click(node_id, modifier)
    }

    #[wasm_bindgen(js_name = edgeClick)]
    pub fn edge_click(&mut self, edge_id: &str, modifier: bool) -> bool {
        self.session.on_edge_click(edge_id, modifier)
    }

    #[wasm_bindgen(js_name = paneClick)]
    pub fn pane_click(&mut self) {
        self.session.on_pane_click();
    }

    /// Detail-panel data of the last clicked node, as JSON.
    #[wasm_bindgen(js_name = selectedNode)]
    pub fn selected_node(&self) -> Result<Option<String>, JsValue> {
        self.session
            .selected_node_data()
            .map(|data| serde_json::to_string(data).map_err(|error| to_js(error.to_string())))
            .transpose()
    }

    #[wasm_bindgen(js_name = edgesJson)]
    pub fn edges_json(&self) -> Result<String, JsValue> {
        edges_view_json(&self.session).map_err(to_js)
    }

    #[wasm_bindgen(js_name = layoutJson)]
    pub fn layout_json(&self) -> Result<String, JsValue> {
        self.session.dump().to_json().map_err(|error| to_js(error.to_string()))
    }

    pub fn svg(&self) -> String {
        self.session.render_svg()
    }
}
