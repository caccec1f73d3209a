use crate::ir::{Condition, IndicatorHealth, Layer, ServiceStatus};
use serde::{Deserialize, Serialize};

pub const HEALTHY_COLOR: &str = "#4caf50";
pub const WARNING_COLOR: &str = "#ff9800";
pub const CRITICAL_COLOR: &str = "#f44336";
pub const NO_DATA_COLOR: &str = "#78909c";

/// Edge color implied by a node condition. Indicator `no_data` has no color of
/// its own and falls back to the layer color.
pub fn condition_color(condition: Condition) -> Option<&'static str> {
    match condition {
        Condition::Status(ServiceStatus::Healthy) | Condition::Health(IndicatorHealth::Green) => {
            Some(HEALTHY_COLOR)
        }
        Condition::Status(ServiceStatus::Warning) | Condition::Health(IndicatorHealth::Amber) => {
            Some(WARNING_COLOR)
        }
        Condition::Status(ServiceStatus::Critical) | Condition::Health(IndicatorHealth::Red) => {
            Some(CRITICAL_COLOR)
        }
        Condition::Status(ServiceStatus::NoData) => Some(NO_DATA_COLOR),
        Condition::Health(IndicatorHealth::NoData) => None,
    }
}

/// Neutral edge color per layer.
pub fn layer_edge_color(layer: Layer) -> &'static str {
    match layer {
        Layer::Component => "#1565C0",
        Layer::Platform => "#C27BA0",
        Layer::Datacenter => "#5DA5A0",
        Layer::Indicator | Layer::IndicatorGroup => "#94a3b8",
        Layer::External => "#78716c",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub component_border: String,
    pub component_fill: String,
    pub platform_border: String,
    pub platform_fill: String,
    pub datacenter_border: String,
    pub datacenter_fill: String,
    pub indicator_border: String,
    pub indicator_fill: String,
    pub external_border: String,
    pub external_fill: String,
    pub zone_fill: String,
    pub zone_border: String,
    pub dimmed_edge_color: String,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            background: "#0a0e1a".to_string(),
            text_color: "#FFFFFF".to_string(),
            muted_text_color: "#94a3b8".to_string(),
            component_border: "#5C8CC2".to_string(),
            component_fill: "rgba(92,140,194,0.10)".to_string(),
            platform_border: "#C27BA0".to_string(),
            platform_fill: "rgba(194,123,160,0.12)".to_string(),
            datacenter_border: "#5DA5A0".to_string(),
            datacenter_fill: "rgba(93,165,160,0.12)".to_string(),
            indicator_border: "#B8976B".to_string(),
            indicator_fill: "rgba(184,151,107,0.12)".to_string(),
            external_border: "#78716c".to_string(),
            external_fill: "rgba(120,113,108,0.12)".to_string(),
            zone_fill: "rgba(148,163,184,0.06)".to_string(),
            zone_border: "rgba(148,163,184,0.25)".to_string(),
            dimmed_edge_color: "#94a3b8".to_string(),
        }
    }

    pub fn light() -> Self {
        Self {
            background: "#FFFFFF".to_string(),
            text_color: "#0f172a".to_string(),
            muted_text_color: "#64748b".to_string(),
            component_fill: "rgba(92,140,194,0.07)".to_string(),
            platform_fill: "rgba(194,123,160,0.08)".to_string(),
            datacenter_fill: "rgba(93,165,160,0.08)".to_string(),
            indicator_fill: "rgba(184,151,107,0.08)".to_string(),
            external_fill: "rgba(120,113,108,0.08)".to_string(),
            zone_fill: "rgba(15,23,42,0.03)".to_string(),
            zone_border: "rgba(15,23,42,0.15)".to_string(),
            ..Self::dark()
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dark" => Some(Self::dark()),
            "light" | "default" => Some(Self::light()),
            _ => None,
        }
    }

    /// Border and fill used for a node of the given layer.
    pub fn node_colors(&self, layer: Layer) -> (&str, &str) {
        match layer {
            Layer::Component => (&self.component_border, &self.component_fill),
            Layer::Platform => (&self.platform_border, &self.platform_fill),
            Layer::Datacenter => (&self.datacenter_border, &self.datacenter_fill),
            Layer::Indicator | Layer::IndicatorGroup => {
                (&self.indicator_border, &self.indicator_fill)
            }
            Layer::External => (&self.external_border, &self.external_fill),
        }
    }
}
