#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod interaction;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod model;
pub mod parser;
pub mod render;
pub mod session;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use error::GraphError;
pub use interaction::{EdgeEmphasis, EdgeStyle, InteractionController, InteractionState};
pub use ir::{ActiveLayers, GraphModel, Layer};
pub use layout::{Layout, compute_layout};
pub use session::GraphSession;

use theme::Theme;

/// Options for one-shot rendering of a payload.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub active: ActiveLayers,
    pub config: Config,
}

impl RenderOptions {
    pub fn light() -> Self {
        let mut options = Self::default();
        options.config.render.background = Theme::light().background;
        options.config.theme = Theme::light();
        options
    }

    pub fn with_layers(mut self, active: ActiveLayers) -> Self {
        self.active = active;
        self
    }
}

/// Parses a payload and lays it out in one go.
pub fn layout_payload(input: &str, active: &ActiveLayers, config: &LayoutConfig) -> Result<Layout, GraphError> {
    let payload = parser::parse_payload(input)?;
    let model = model::build_model(&payload, active, config);
    Ok(compute_layout(&model, config))
}

/// Parses, lays out and renders a payload to SVG with nothing highlighted.
pub fn render_with_options(input: &str, options: RenderOptions) -> Result<String, GraphError> {
    let session = GraphSession::from_json(input, options.active, options.config)?;
    Ok(session.render_svg())
}
