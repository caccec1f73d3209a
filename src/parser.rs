use crate::error::GraphError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One layer of a multi-layer payload. Elements stay raw until the model
/// builder validates them one by one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerPayload {
    #[serde(default, deserialize_with = "lenient_list")]
    pub nodes: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub edges: Vec<Value>,
    #[serde(default, alias = "externalNodes", deserialize_with = "lenient_list")]
    pub external_nodes: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerSet {
    #[serde(default, alias = "component", deserialize_with = "lenient_object")]
    pub components: Option<LayerPayload>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub platform: Option<LayerPayload>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub datacenter: Option<LayerPayload>,
    #[serde(default, alias = "indicator", deserialize_with = "lenient_object")]
    pub indicators: Option<LayerPayload>,
}

/// Graph payload as served by the dependency, blast-radius and layers
/// endpoints. All three shapes share this struct.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub root: Option<Value>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub layers: Option<LayerSet>,
    #[serde(default, alias = "component", deserialize_with = "lenient_object")]
    pub components: Option<LayerPayload>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub platform: Option<LayerPayload>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub datacenter: Option<LayerPayload>,
    #[serde(default, alias = "indicator", deserialize_with = "lenient_object")]
    pub indicators: Option<LayerPayload>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub dependencies: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub impacted: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub edges: Vec<Value>,
    #[serde(default, alias = "crossAppEdges", deserialize_with = "lenient_list")]
    pub cross_app_edges: Vec<Value>,
}

impl GraphPayload {
    /// Layers from the nested `layers` object, falling back to top-level keys
    /// per layer.
    pub fn layer_set(&self) -> LayerSet {
        let nested = self.layers.clone().unwrap_or_default();
        LayerSet {
            components: nested.components.or_else(|| self.components.clone()),
            platform: nested.platform.or_else(|| self.platform.clone()),
            datacenter: nested.datacenter.or_else(|| self.datacenter.clone()),
            indicators: nested.indicators.or_else(|| self.indicators.clone()),
        }
    }

    /// The multi-layer endpoint carries no root; everything else must.
    pub fn is_layered_view(&self) -> bool {
        self.components.is_some()
    }
}

pub fn parse_payload(input: &str) -> Result<GraphPayload, GraphError> {
    Ok(serde_json::from_str(input)?)
}

/// Element lists tolerate `null` and non-array values; both read as empty.
fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => {
            tracing::debug!(value = %other, "ignoring list field that is not an array");
            Ok(Vec::new())
        }
    }
}

/// Layer sections that are `null` or not objects read as absent.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        if !value.is_null() {
            tracing::debug!(value = %value, "ignoring layer section that is not an object");
        }
        return Ok(None);
    }
    match T::deserialize(&value) {
        Ok(section) => Ok(Some(section)),
        Err(err) => {
            tracing::debug!(error = %err, "dropping malformed layer section");
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default, alias = "parentIds")]
    pub parent_ids: Vec<String>,
    #[serde(default, alias = "crossDirection")]
    pub cross_direction: Option<String>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub direction: Option<String>,
}

/// Reads a node element; anything without a string id is rejected.
pub fn read_node(value: &Value) -> Option<RawNode> {
    match RawNode::deserialize(value) {
        Ok(node) if !node.id.trim().is_empty() => Some(node),
        Ok(_) => {
            tracing::debug!("dropping node with empty id");
            None
        }
        Err(err) => {
            tracing::debug!(error = %err, "dropping malformed node");
            None
        }
    }
}

pub fn read_edge(value: &Value) -> Option<RawEdge> {
    match RawEdge::deserialize(value) {
        Ok(edge) => Some(edge),
        Err(err) => {
            tracing::debug!(error = %err, "dropping malformed edge");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_layer_view() {
        let payload = parse_payload(
            r#"{"root": {"id": "A", "label": "Alpha", "status": "healthy"},
                "dependencies": [{"id": "B"}],
                "edges": [{"source": "A", "target": "B"}]}"#,
        )
        .expect("payload");
        assert!(payload.root.is_some());
        assert_eq!(payload.dependencies.len(), 1);
        assert!(!payload.is_layered_view());
    }

    #[test]
    fn nested_layers_win_over_top_level() {
        let payload = parse_payload(
            r#"{"layers": {"component": {"nodes": [{"id": "n"}]}},
                "components": {"nodes": []},
                "platform": {"nodes": [{"id": "p"}]}}"#,
        )
        .expect("payload");
        let layers = payload.layer_set();
        assert_eq!(layers.components.map(|l| l.nodes.len()), Some(1));
        assert_eq!(layers.platform.map(|l| l.nodes.len()), Some(1));
    }

    #[test]
    fn malformed_elements_are_rejected_individually() {
        assert!(read_node(&serde_json::json!({"label": "no id"})).is_none());
        assert!(read_node(&serde_json::json!({"id": ""})).is_none());
        assert!(read_node(&serde_json::json!("B")).is_none());
        assert!(read_edge(&serde_json::json!({"source": "A"})).is_none());
        let node = read_node(&serde_json::json!({"id": "X", "parentIds": ["Y"]})).expect("node");
        assert_eq!(node.parent_ids, vec!["Y".to_string()]);
    }

    #[test]
    fn null_and_mistyped_lists_read_as_empty() {
        let payload = parse_payload(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}], "impacted": null,
                "edges": "nope", "crossAppEdges": null,
                "components": {"nodes": [{"id": "a"}], "edges": null, "external_nodes": 3},
                "platform": null, "datacenter": [1, 2], "layers": null}"#,
        )
        .expect("payload");
        assert_eq!(payload.dependencies.len(), 1);
        assert!(payload.impacted.is_empty());
        assert!(payload.edges.is_empty());
        assert!(payload.cross_app_edges.is_empty());
        let components = payload.components.as_ref().expect("components");
        assert_eq!(components.nodes.len(), 1);
        assert!(components.edges.is_empty() && components.external_nodes.is_empty());
        assert!(payload.platform.is_none());
        assert!(payload.datacenter.is_none());
        assert!(payload.layers.is_none());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_payload("{not json").is_err());
    }
}
