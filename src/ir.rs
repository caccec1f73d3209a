use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic layer a node belongs to. `Component` and `External` make up the
/// primary layer; everything else is placed relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    Component,
    Platform,
    Datacenter,
    Indicator,
    External,
    IndicatorGroup,
}

impl Layer {
    pub fn is_primary(self) -> bool {
        match self {
            Layer::Component | Layer::External => true,
            Layer::Platform | Layer::Datacenter | Layer::Indicator | Layer::IndicatorGroup => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Component => "component",
            Layer::Platform => "platform",
            Layer::Datacenter => "datacenter",
            Layer::Indicator => "indicator",
            Layer::External => "external",
            Layer::IndicatorGroup => "indicatorGroup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Healthy,
    Warning,
    Critical,
    NoData,
}

impl ServiceStatus {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "healthy" => Some(Self::Healthy),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            "no_data" | "nodata" | "unknown" => Some(Self::NoData),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorHealth {
    NoData,
    Green,
    Amber,
    Red,
}

impl IndicatorHealth {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "green" => Some(Self::Green),
            "amber" => Some(Self::Amber),
            "red" => Some(Self::Red),
            "no_data" | "nodata" => Some(Self::NoData),
            _ => None,
        }
    }
}

/// Health signal attached to a node. Services report a status, indicators a
/// RAG health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    Status(ServiceStatus),
    Health(IndicatorHealth),
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Status(ServiceStatus::Healthy) => "healthy",
            Condition::Status(ServiceStatus::Warning) => "warning",
            Condition::Status(ServiceStatus::Critical) => "critical",
            Condition::Status(ServiceStatus::NoData) => "no_data",
            Condition::Health(IndicatorHealth::Green) => "green",
            Condition::Health(IndicatorHealth::Amber) => "amber",
            Condition::Health(IndicatorHealth::Red) => "red",
            Condition::Health(IndicatorHealth::NoData) => "no_data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrossDirection {
    Upstream,
    Downstream,
}

impl CrossDirection {
    pub fn from_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("upstream") {
            Self::Upstream
        } else {
            Self::Downstream
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeDirection {
    Uni,
    Bi,
}

impl EdgeDirection {
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "bi" | "both" | "bidirectional" => Self::Bi,
            _ => Self::Uni,
        }
    }
}

/// Snapshot of a node handed to the detail panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub id: String,
    pub label: String,
    pub layer: Layer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<NodeData>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub layer: Layer,
    pub label: String,
    pub condition: Option<Condition>,
    pub parent_ids: Vec<String>,
    pub width: f32,
    pub height: f32,
    pub is_root: bool,
    pub cross_direction: Option<CrossDirection>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub members: Vec<NodeData>,
}

impl Node {
    pub fn data(&self) -> NodeData {
        NodeData {
            id: self.id.clone(),
            label: self.label.clone(),
            layer: self.layer,
            condition: self.condition,
            attributes: self.attributes.clone(),
            members: self.members.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub layer: Layer,
    pub color: String,
    pub direction: EdgeDirection,
}

pub fn edge_id(source: &str, target: &str) -> String {
    format!("e-{source}-{target}")
}

/// Which auxiliary layers are switched on. The component layer is always
/// active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActiveLayers {
    pub platform: bool,
    pub datacenter: bool,
    pub indicator: bool,
    #[serde(alias = "crossapp")]
    pub cross_app: bool,
    pub group_indicators: bool,
}

impl Default for ActiveLayers {
    fn default() -> Self {
        Self {
            platform: false,
            datacenter: false,
            indicator: false,
            cross_app: true,
            group_indicators: false,
        }
    }
}

impl ActiveLayers {
    pub fn all() -> Self {
        Self {
            platform: true,
            datacenter: true,
            indicator: true,
            cross_app: true,
            group_indicators: false,
        }
    }

    /// Drops layers whose prerequisite is off.
    pub fn normalized(self) -> Self {
        Self {
            datacenter: self.datacenter && self.platform,
            ..self
        }
    }

    pub fn is_active(&self, layer: Layer) -> bool {
        let layers = self.normalized();
        match layer {
            Layer::Component => true,
            Layer::External => layers.cross_app,
            Layer::Platform => layers.platform,
            Layer::Datacenter => layers.datacenter,
            Layer::Indicator => layers.indicator && !layers.group_indicators,
            Layer::IndicatorGroup => layers.indicator && layers.group_indicators,
        }
    }

    /// Parses a comma separated token list such as `platform,datacenter`.
    /// `crossapp` is on unless `nocrossapp` is given.
    pub fn from_tokens(list: &str) -> Self {
        let mut layers = Self::default();
        for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.to_ascii_lowercase().as_str() {
                "platform" => layers.platform = true,
                "datacenter" | "dc" => layers.datacenter = true,
                "indicator" | "indicators" => layers.indicator = true,
                "crossapp" | "cross_app" => layers.cross_app = true,
                "nocrossapp" => layers.cross_app = false,
                "grouped" => layers.group_indicators = true,
                "all" => {
                    layers.platform = true;
                    layers.datacenter = true;
                    layers.indicator = true;
                }
                _ => tracing::warn!(token, "ignoring unknown layer token"),
            }
        }
        layers
    }
}

/// Normalized graph: a node table in input order plus the surviving edges.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub root: Option<String>,
    pub active: ActiveLayers,
    index: HashMap<String, usize>,
}

impl GraphModel {
    pub fn new(active: ActiveLayers) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            root: None,
            active: active.normalized(),
            index: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).and_then(|idx| self.nodes.get(*idx))
    }

    pub fn node_order(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    /// Inserts a node unless its id is already taken. Returns whether it was
    /// inserted.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let idx = *self.index.get(id)?;
        self.nodes.get_mut(idx)
    }

    pub fn nodes_in(&self, layer: Layer) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |node| node.layer == layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datacenter_requires_platform() {
        let layers = ActiveLayers {
            datacenter: true,
            ..ActiveLayers::default()
        };
        assert!(!layers.is_active(Layer::Datacenter));
        assert!(!layers.normalized().datacenter);
        let with_platform = ActiveLayers {
            platform: true,
            ..layers
        };
        assert!(with_platform.is_active(Layer::Datacenter));
    }

    #[test]
    fn parses_layer_tokens() {
        let layers = ActiveLayers::from_tokens("platform, dc,indicator,nocrossapp");
        assert!(layers.platform);
        assert!(layers.datacenter);
        assert!(layers.indicator);
        assert!(!layers.cross_app);
    }

    #[test]
    fn status_tokens_are_lenient() {
        assert_eq!(ServiceStatus::from_token(" Critical "), Some(ServiceStatus::Critical));
        assert_eq!(ServiceStatus::from_token("degraded"), None);
        assert_eq!(IndicatorHealth::from_token("amber"), Some(IndicatorHealth::Amber));
    }

    #[test]
    fn insert_keeps_first_occurrence() {
        let mut model = GraphModel::new(ActiveLayers::default());
        let node = |label: &str| Node {
            id: "a".to_string(),
            layer: Layer::Component,
            label: label.to_string(),
            condition: None,
            parent_ids: Vec::new(),
            width: 10.0,
            height: 10.0,
            is_root: false,
            cross_direction: None,
            attributes: serde_json::Map::new(),
            members: Vec::new(),
        };
        assert!(model.insert_node(node("first")));
        assert!(!model.insert_node(node("second")));
        assert_eq!(model.node("a").map(|n| n.label.as_str()), Some("first"));
    }
}
