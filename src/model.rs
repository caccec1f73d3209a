use crate::config::LayoutConfig;
use crate::ir::{
    ActiveLayers, Condition, CrossDirection, Edge, EdgeDirection, GraphModel, IndicatorHealth,
    Layer, Node, ServiceStatus, edge_id,
};
use crate::parser::{GraphPayload, RawEdge, RawNode, read_edge, read_node};
use crate::theme::{condition_color, layer_edge_color};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Builds the graph model for the given payload and active layers.
///
/// Never fails: a missing or malformed root yields an empty model, and nodes
/// or edges that do not validate are dropped individually.
pub fn build_model(payload: &GraphPayload, active: &ActiveLayers, config: &LayoutConfig) -> GraphModel {
    let active = active.normalized();
    let mut model = GraphModel::new(active);

    match payload.root.as_ref() {
        Some(root_value) => {
            let Some(raw) = read_node(root_value) else {
                tracing::debug!("malformed root node, building empty graph");
                return model;
            };
            let mut root = make_node(&raw, root_value, Layer::Component, config);
            root.is_root = true;
            model.root = Some(root.id.clone());
            model.insert_node(root);
        }
        None if payload.is_layered_view() => {}
        None => {
            tracing::debug!("payload has no root, building empty graph");
            return model;
        }
    }

    let layers = payload.layer_set();
    let empty = Vec::new();
    let component_nodes = layers.components.as_ref().map_or(&empty, |l| &l.nodes);
    let external_nodes = layers.components.as_ref().map_or(&empty, |l| &l.external_nodes);

    for value in component_nodes
        .iter()
        .chain(payload.dependencies.iter())
        .chain(payload.impacted.iter())
    {
        insert_raw(&mut model, value, Layer::Component, config);
    }
    if active.cross_app {
        for value in external_nodes {
            insert_raw(&mut model, value, Layer::External, config);
        }
    }
    if active.platform {
        if let Some(layer) = &layers.platform {
            for value in &layer.nodes {
                insert_raw(&mut model, value, Layer::Platform, config);
            }
        }
    }
    if active.datacenter {
        if let Some(layer) = &layers.datacenter {
            for value in &layer.nodes {
                insert_raw(&mut model, value, Layer::Datacenter, config);
            }
        }
    }

    let mut raw_edges: Vec<(RawEdge, Layer)> = Vec::new();
    let component_edges = layers.components.as_ref().map_or(&empty, |l| &l.edges);
    for value in payload.edges.iter().chain(component_edges.iter()) {
        raw_edges.extend(read_edge(value).map(|edge| (edge, Layer::Component)));
    }
    if active.cross_app {
        for value in &payload.cross_app_edges {
            raw_edges.extend(read_edge(value).map(|edge| (edge, Layer::External)));
        }
    }
    if active.platform {
        if let Some(layer) = &layers.platform {
            for value in &layer.edges {
                raw_edges.extend(read_edge(value).map(|edge| (edge, Layer::Platform)));
            }
        }
    }
    if active.datacenter {
        if let Some(layer) = &layers.datacenter {
            for value in &layer.edges {
                raw_edges.extend(read_edge(value).map(|edge| (edge, Layer::Datacenter)));
            }
        }
    }

    if active.indicator {
        if let Some(layer) = &layers.indicators {
            let indicator_edges: Vec<RawEdge> = layer.edges.iter().filter_map(read_edge).collect();
            if active.group_indicators {
                raw_edges.extend(add_indicator_groups(&mut model, &layer.nodes, &indicator_edges, config));
            } else {
                raw_edges.extend(add_indicators(&mut model, &layer.nodes, &indicator_edges, config));
            }
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    for (raw, layer) in raw_edges {
        let Some(edge) = make_edge(&model, &raw, layer) else {
            tracing::debug!(source = %raw.source, target = %raw.target, "dropping edge with missing endpoint");
            continue;
        };
        if seen.insert(edge.id.clone()) {
            model.edges.push(edge);
        }
    }

    assign_parents(&mut model);

    tracing::debug!(
        nodes = model.nodes.len(),
        edges = model.edges.len(),
        "built graph model"
    );
    model
}

fn insert_raw(model: &mut GraphModel, value: &Value, layer: Layer, config: &LayoutConfig) -> Option<String> {
    let raw = read_node(value)?;
    let node = make_node(&raw, value, layer, config);
    let id = node.id.clone();
    model.insert_node(node).then_some(id)
}

fn make_node(raw: &RawNode, value: &Value, layer: Layer, config: &LayoutConfig) -> Node {
    let dims = config.node_dims(layer);
    let condition = raw
        .status
        .as_deref()
        .and_then(ServiceStatus::from_token)
        .map(Condition::Status)
        .or_else(|| {
            raw.health
                .as_deref()
                .and_then(IndicatorHealth::from_token)
                .map(Condition::Health)
        });
    let mut parent_ids = Vec::new();
    if let Some(component) = &raw.component {
        parent_ids.push(component.clone());
    }
    parent_ids.extend(raw.parent_ids.iter().cloned());
    Node {
        id: raw.id.clone(),
        layer,
        label: raw
            .label
            .clone()
            .or_else(|| raw.name.clone())
            .unwrap_or_else(|| raw.id.clone()),
        condition,
        parent_ids,
        width: raw.width.filter(|w| *w > 0.0).unwrap_or(dims.width),
        height: raw.height.filter(|h| *h > 0.0).unwrap_or(dims.height),
        is_root: false,
        cross_direction: match layer {
            Layer::External => Some(
                raw.cross_direction
                    .as_deref()
                    .map_or(CrossDirection::Downstream, CrossDirection::from_token),
            ),
            _ => None,
        },
        attributes: value.as_object().cloned().unwrap_or_default(),
        members: Vec::new(),
    }
}

fn add_indicators(
    model: &mut GraphModel,
    nodes: &[Value],
    edges: &[RawEdge],
    config: &LayoutConfig,
) -> Vec<(RawEdge, Layer)> {
    let mut derived = Vec::new();
    for value in nodes {
        let Some(id) = insert_raw(model, value, Layer::Indicator, config) else {
            continue;
        };
        let parents = model.node(&id).map(|n| n.parent_ids.clone()).unwrap_or_default();
        for parent in parents {
            derived.push((
                RawEdge {
                    source: parent,
                    target: id.clone(),
                    direction: None,
                },
                Layer::Indicator,
            ));
        }
    }
    derived.extend(edges.iter().cloned().map(|edge| (edge, Layer::Indicator)));
    derived
}

/// Collapses indicators into one group node per parent component.
fn add_indicator_groups(
    model: &mut GraphModel,
    nodes: &[Value],
    edges: &[RawEdge],
    config: &LayoutConfig,
) -> Vec<(RawEdge, Layer)> {
    let mut groups: Vec<(String, Vec<Node>)> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    for value in nodes {
        let Some(raw) = read_node(value) else {
            continue;
        };
        if !seen_ids.insert(raw.id.clone()) {
            continue;
        }
        let mut node = make_node(&raw, value, Layer::Indicator, config);
        node.parent_ids.extend(
            edges
                .iter()
                .filter(|edge| edge.target == node.id)
                .map(|edge| edge.source.clone()),
        );
        let parent = node
            .parent_ids
            .iter()
            .find(|id| model.node(id).is_some_and(|n| n.layer.is_primary()))
            .cloned();
        let Some(parent) = parent else {
            tracing::debug!(indicator = %node.id, "indicator has no component, skipping");
            continue;
        };
        match groups.iter_mut().find(|(component, _)| *component == parent) {
            Some((_, members)) => members.push(node),
            None => groups.push((parent, vec![node])),
        }
    }

    let mut derived = Vec::new();
    for (component, members) in groups {
        let group_id = format!("ind-group-{component}");
        let worst = members
            .iter()
            .filter_map(|member| match member.condition {
                Some(Condition::Health(health)) => Some(health),
                _ => None,
            })
            .max()
            .unwrap_or(IndicatorHealth::NoData);
        let worst = if worst == IndicatorHealth::NoData { IndicatorHealth::Green } else { worst };
        let mut attributes = serde_json::Map::new();
        attributes.insert("componentId".to_string(), Value::String(component.clone()));
        attributes.insert("count".to_string(), Value::from(members.len()));
        let group = Node {
            id: group_id.clone(),
            layer: Layer::IndicatorGroup,
            label: format!("{component} indicators"),
            condition: Some(Condition::Health(worst)),
            parent_ids: vec![component.clone()],
            width: config.indicator_group.width,
            height: config.indicator_group.height_for(members.len()),
            is_root: false,
            cross_direction: None,
            attributes,
            members: members.iter().map(Node::data).collect(),
        };
        if model.insert_node(group) {
            derived.push((
                RawEdge {
                    source: component,
                    target: group_id,
                    direction: None,
                },
                Layer::IndicatorGroup,
            ));
        }
    }
    derived
}

fn make_edge(model: &GraphModel, raw: &RawEdge, layer: Layer) -> Option<Edge> {
    let source = model.node(&raw.source)?;
    let target = model.node(&raw.target)?;
    let touches_external = source.layer == Layer::External || target.layer == Layer::External;
    let layer = if touches_external { Layer::External } else { layer };
    let color = if touches_external {
        layer_edge_color(Layer::External)
    } else {
        target
            .condition
            .and_then(condition_color)
            .unwrap_or_else(|| layer_edge_color(layer))
    };
    Some(Edge {
        id: edge_id(&raw.source, &raw.target),
        source: raw.source.clone(),
        target: raw.target.clone(),
        layer,
        color: color.to_string(),
        direction: raw
            .direction
            .as_deref()
            .map_or(EdgeDirection::Uni, EdgeDirection::from_token),
    })
}

/// Resolves parent references of auxiliary nodes against the surviving graph:
/// explicit references first, then sources of incoming edges of the node's
/// own layer.
fn assign_parents(model: &mut GraphModel) {
    let mut incoming: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for edge in &model.edges {
        incoming
            .entry(edge.target.clone())
            .or_default()
            .push(edge.source.clone());
    }
    let resolved: Vec<(String, Vec<String>)> = model
        .nodes
        .iter()
        .filter(|node| !node.layer.is_primary())
        .map(|node| {
            let mut parents: Vec<String> = Vec::new();
            let candidates = node
                .parent_ids
                .iter()
                .chain(incoming.get(&node.id).into_iter().flatten());
            for candidate in candidates {
                let valid = model
                    .node(candidate)
                    .is_some_and(|parent| is_parent_layer(parent.layer, node.layer));
                if valid && !parents.contains(candidate) {
                    parents.push(candidate.clone());
                }
            }
            (node.id.clone(), parents)
        })
        .collect();
    for (id, parents) in resolved {
        if let Some(node) = model.node_mut(&id) {
            node.parent_ids = parents;
        }
    }
}

/// Which layer an auxiliary node hangs from.
pub fn is_parent_layer(parent: Layer, child: Layer) -> bool {
    match child {
        Layer::Indicator | Layer::IndicatorGroup | Layer::Platform => parent.is_primary(),
        Layer::Datacenter => parent == Layer::Platform,
        Layer::Component | Layer::External => false,
    }
}
