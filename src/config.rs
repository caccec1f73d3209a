use crate::error::GraphError;
use crate::ir::Layer;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeDims {
    pub width: f32,
    pub height: f32,
}

impl NodeDims {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDimsConfig {
    pub component: NodeDims,
    pub external: NodeDims,
    pub platform: NodeDims,
    pub datacenter: NodeDims,
    pub indicator: NodeDims,
}

impl Default for NodeDimsConfig {
    fn default() -> Self {
        Self {
            component: NodeDims::new(190.0, 50.0),
            external: NodeDims::new(190.0, 50.0),
            platform: NodeDims::new(160.0, 45.0),
            datacenter: NodeDims::new(150.0, 55.0),
            indicator: NodeDims::new(170.0, 48.0),
        }
    }
}

/// Minimum horizontal gap between neighbours of one auxiliary row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowGapConfig {
    pub indicator: f32,
    pub platform: f32,
    pub datacenter: f32,
}

impl Default for RowGapConfig {
    fn default() -> Self {
        Self {
            indicator: 40.0,
            platform: 80.0,
            datacenter: 70.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorGroupConfig {
    pub width: f32,
    pub row_height: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub gap: f32,
    pub row_gap: f32,
    pub stagger: f32,
}

impl Default for IndicatorGroupConfig {
    fn default() -> Self {
        Self {
            width: 220.0,
            row_height: 18.0,
            padding_top: 26.0,
            padding_bottom: 10.0,
            gap: 12.0,
            row_gap: 10.0,
            stagger: 120.0,
        }
    }
}

impl IndicatorGroupConfig {
    pub fn height_for(&self, members: usize) -> f32 {
        self.padding_top + members as f32 * self.row_height + self.padding_bottom
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub rank_spacing: f32,
    pub node_spacing: f32,
    pub edge_spacing: f32,
    pub component_spacing: f32,
    pub node_padding_x: f32,
    pub node_padding_y: f32,
    pub order_passes: usize,
    pub vertical_gap: f32,
    pub separation_gap: f32,
    pub external_spacing: f32,
    pub zone_extra_width: f32,
    pub zone_padding_y: f32,
    pub zone_clearance: f32,
    /// Clearance kept between a row node and edges it is not an endpoint of.
    pub edge_clearance: f32,
    pub nodes: NodeDimsConfig,
    pub row_gaps: RowGapConfig,
    pub indicator_group: IndicatorGroupConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_spacing: 90.0,
            node_spacing: 25.0,
            edge_spacing: 15.0,
            component_spacing: 60.0,
            node_padding_x: 50.0,
            node_padding_y: 30.0,
            order_passes: 8,
            vertical_gap: 80.0,
            separation_gap: 280.0,
            external_spacing: 80.0,
            zone_extra_width: 120.0,
            zone_padding_y: 40.0,
            zone_clearance: 20.0,
            edge_clearance: 20.0,
            nodes: NodeDimsConfig::default(),
            row_gaps: RowGapConfig::default(),
            indicator_group: IndicatorGroupConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn node_dims(&self, layer: Layer) -> NodeDims {
        match layer {
            Layer::Component => self.nodes.component,
            Layer::External => self.nodes.external,
            Layer::Platform => self.nodes.platform,
            Layer::Datacenter => self.nodes.datacenter,
            Layer::Indicator => self.nodes.indicator,
            Layer::IndicatorGroup => NodeDims::new(
                self.indicator_group.width,
                self.indicator_group.height_for(1),
            ),
        }
    }

    /// Minimum gap for the row a layer is placed in.
    pub fn row_gap(&self, layer: Layer) -> f32 {
        match layer {
            Layer::Indicator => self.row_gaps.indicator,
            Layer::IndicatorGroup => self.indicator_group.gap,
            Layer::Platform => self.row_gaps.platform,
            Layer::Datacenter => self.row_gaps.datacenter,
            Layer::Component | Layer::External => self.node_spacing,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            padding: 30.0,
            background: "#0a0e1a".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::dark();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    nodes: Option<NodeDimsFile>,
    row_gaps: Option<RowGapFile>,
    indicator_group: Option<IndicatorGroupFile>,
    render: Option<RenderConfigFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    text_color: Option<String>,
    dimmed_edge_color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    #[serde(alias = "ranksep")]
    rank_spacing: Option<f32>,
    #[serde(alias = "nodesep")]
    node_spacing: Option<f32>,
    #[serde(alias = "edgesep")]
    edge_spacing: Option<f32>,
    component_spacing: Option<f32>,
    node_padding_x: Option<f32>,
    node_padding_y: Option<f32>,
    order_passes: Option<usize>,
    vertical_gap: Option<f32>,
    separation_gap: Option<f32>,
    external_spacing: Option<f32>,
    zone_extra_width: Option<f32>,
    zone_padding_y: Option<f32>,
    zone_clearance: Option<f32>,
    edge_clearance: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeDimsFile {
    component: Option<NodeDims>,
    external: Option<NodeDims>,
    platform: Option<NodeDims>,
    datacenter: Option<NodeDims>,
    indicator: Option<NodeDims>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RowGapFile {
    indicator: Option<f32>,
    platform: Option<f32>,
    datacenter: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndicatorGroupFile {
    width: Option<f32>,
    row_height: Option<f32>,
    padding_top: Option<f32>,
    padding_bottom: Option<f32>,
    gap: Option<f32>,
    row_gap: Option<f32>,
    stagger: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    padding: Option<f32>,
    background: Option<String>,
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Loads a JSON5 config file and merges it over the defaults. `None` returns
/// the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, GraphError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents).map_err(|message| GraphError::Config {
        path: path.to_path_buf(),
        message,
    })
}

pub fn parse_config(contents: &str) -> Result<Config, String> {
    let parsed: ConfigFile = json5::from_str(contents).map_err(|err| err.to_string())?;
    let mut config = Config::default();

    if let Some(name) = parsed.theme.as_deref() {
        match Theme::from_name(name) {
            Some(theme) => {
                config.render.background = theme.background.clone();
                config.theme = theme;
            }
            None => tracing::warn!(theme = name, "unknown theme, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        set(&mut config.theme.font_family, vars.font_family);
        set(&mut config.theme.font_size, vars.font_size);
        if let Some(background) = vars.background {
            config.render.background = background.clone();
            config.theme.background = background;
        }
        set(&mut config.theme.text_color, vars.text_color);
        set(&mut config.theme.dimmed_edge_color, vars.dimmed_edge_color);
    }

    let layout = &mut config.layout;
    if let Some(file) = parsed.layout {
        set(&mut layout.rank_spacing, file.rank_spacing);
        set(&mut layout.node_spacing, file.node_spacing);
        set(&mut layout.edge_spacing, file.edge_spacing);
        set(&mut layout.component_spacing, file.component_spacing);
        set(&mut layout.node_padding_x, file.node_padding_x);
        set(&mut layout.node_padding_y, file.node_padding_y);
        set(&mut layout.order_passes, file.order_passes);
        set(&mut layout.vertical_gap, file.vertical_gap);
        set(&mut layout.separation_gap, file.separation_gap);
        set(&mut layout.external_spacing, file.external_spacing);
        set(&mut layout.zone_extra_width, file.zone_extra_width);
        set(&mut layout.zone_padding_y, file.zone_padding_y);
        set(&mut layout.zone_clearance, file.zone_clearance);
        set(&mut layout.edge_clearance, file.edge_clearance);
    }
    if let Some(file) = parsed.nodes {
        set(&mut layout.nodes.component, file.component);
        set(&mut layout.nodes.external, file.external);
        set(&mut layout.nodes.platform, file.platform);
        set(&mut layout.nodes.datacenter, file.datacenter);
        set(&mut layout.nodes.indicator, file.indicator);
    }
    if let Some(file) = parsed.row_gaps {
        set(&mut layout.row_gaps.indicator, file.indicator);
        set(&mut layout.row_gaps.platform, file.platform);
        set(&mut layout.row_gaps.datacenter, file.datacenter);
    }
    if let Some(file) = parsed.indicator_group {
        let group = &mut layout.indicator_group;
        set(&mut group.width, file.width);
        set(&mut group.row_height, file.row_height);
        set(&mut group.padding_top, file.padding_top);
        set(&mut group.padding_bottom, file.padding_bottom);
        set(&mut group.gap, file.gap);
        set(&mut group.row_gap, file.row_gap);
        set(&mut group.stagger, file.stagger);
    }
    if let Some(file) = parsed.render {
        set(&mut config.render.width, file.width);
        set(&mut config.render.height, file.height);
        set(&mut config.render.padding, file.padding);
        set(&mut config.render.background, file.background);
    }

    Ok(config)
}
