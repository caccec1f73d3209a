use crate::config::RenderConfig;
use crate::error::GraphError;
use crate::interaction::{EdgeEmphasis, EdgeStyle, InteractionController, edge_style_for};
use crate::ir::{EdgeDirection, Layer};
use crate::layout::{EdgeLayout, Layout, NodeLayout, ZoneLayout};
use crate::theme::Theme;
use std::path::Path;

const MIN_CANVAS: f32 = 200.0;

/// Draws zones, then edges styled by the current highlight set, then nodes.
pub fn render_svg(
    layout: &Layout,
    interaction: &InteractionController,
    theme: &Theme,
    config: &RenderConfig,
) -> String {
    let pad = config.padding;
    let width = (layout.bounds.width() + pad * 2.0).max(MIN_CANVAS);
    let height = (layout.bounds.height() + pad * 2.0).max(MIN_CANVAS);
    let offset = (pad - layout.bounds.min_x, pad - layout.bounds.min_y);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&config.background)
    ));
    svg.push_str(&format!("<g transform=\"translate({:.2} {:.2})\">", offset.0, offset.1));

    for zone in &layout.zones {
        svg.push_str(&zone_svg(zone, theme));
    }
    for edge in &layout.edges {
        let style = interaction
            .edge_style(&edge.id, theme)
            .unwrap_or_else(|| edge_style_for(edge.layer, &edge.color, EdgeEmphasis::Neutral, theme));
        svg.push_str(&edge_svg(edge, &style));
    }
    for node in layout.nodes.values() {
        svg.push_str(&node_svg(node, theme));
    }

    svg.push_str("</g></svg>");
    svg
}

fn zone_svg(zone: &ZoneLayout, theme: &Theme) -> String {
    let x = zone.x - zone.width / 2.0;
    let y = zone.y - zone.height / 2.0;
    let mut out = format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"12\" ry=\"12\" fill=\"{}\" stroke=\"{}\" stroke-dasharray=\"6 4\" stroke-width=\"1\"/>",
        zone.width,
        zone.height,
        theme.zone_fill,
        theme.zone_border
    );
    out.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{:.1}\" fill=\"{}\" letter-spacing=\"1\">{}</text>",
        zone.x,
        y + 18.0,
        escape_xml(&theme.font_family),
        theme.font_size * 0.85,
        theme.muted_text_color,
        zone.kind.label().to_uppercase()
    ));
    out
}

fn edge_svg(edge: &EdgeLayout, style: &EdgeStyle) -> String {
    let d = points_to_path(&edge.points);
    if d.is_empty() {
        return String::new();
    }
    let mut out = format!(
        "<g class=\"edge\" data-id=\"{}\" opacity=\"{:.2}\">",
        escape_xml(&edge.id),
        style.opacity
    );
    if style.glow {
        out.push_str(&format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"6\" stroke-opacity=\"0.2\"/>",
            style.color
        ));
    }
    let dash = style
        .dash
        .map(|dash| format!(" stroke-dasharray=\"{dash}\""))
        .unwrap_or_default();
    out.push_str(&format!(
        "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.1}\"{dash}/>",
        style.color, style.width
    ));
    if style.glow {
        let mut ends = vec![edge.points[edge.points.len() - 1]];
        if edge.direction == EdgeDirection::Bi {
            ends.push(edge.points[0]);
        }
        for (x, y) in ends {
            out.push_str(&format!(
                "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"4\" fill=\"{0}\" stroke=\"{0}\" stroke-width=\"1\"/>",
                style.color
            ));
        }
    }
    out.push_str("</g>");
    out
}

fn node_svg(node: &NodeLayout, theme: &Theme) -> String {
    let (border, fill) = theme.node_colors(node.layer);
    let stroke_width = if node.is_root { 2.4 } else { 1.4 };
    let dash = match node.layer {
        Layer::External => " stroke-dasharray=\"5 3\"",
        Layer::Component | Layer::Platform | Layer::Datacenter | Layer::Indicator | Layer::IndicatorGroup => "",
    };
    let mut out = format!(
        "<g class=\"node {}\" data-id=\"{}\">",
        node.layer.as_str(),
        escape_xml(&node.id)
    );
    out.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{fill}\" stroke=\"{border}\" stroke-width=\"{stroke_width}\"{dash}/>",
        node.left(),
        node.top(),
        node.width,
        node.height,
    ));
    let caption_size = theme.font_size * 0.7;
    out.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{caption_size:.1}\" fill=\"{border}\" opacity=\"0.7\">{}</text>",
        node.left() + 10.0,
        node.top() + caption_size + 6.0,
        escape_xml(&theme.font_family),
        node.layer.as_str().to_uppercase()
    ));
    out.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{:.1}\" font-weight=\"600\" fill=\"{}\">{}</text>",
        node.left() + 10.0,
        node.top() + caption_size + theme.font_size + 10.0,
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.text_color,
        escape_xml(&node.label)
    ));
    out.push_str("</g>");
    out
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let Some((first, rest)) = points.split_first() else {
        return String::new();
    };
    let mut d = format!("M {:.2} {:.2}", first.0, first.1);
    for point in rest {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<(), GraphError> {
    match output {
        Some(path) => std::fs::write(path, svg)?,
        None => print!("{svg}"),
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<(), GraphError> {
    let render_error = |message: String| GraphError::Render { message };
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| render_error(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| render_error("failed to allocate pixmap".to_string()))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap
        .save_png(output)
        .map_err(|err| render_error(err.to_string()))?;
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::ActiveLayers;
    use crate::layout::compute_layout;
    use crate::model::build_model;
    use crate::parser::parse_payload;

    fn render(clicks: &[&str]) -> String {
        let payload = parse_payload(
            r#"{"root": {"id": "A", "label": "Checkout & Pay"}, "dependencies": [{"id": "B"}, {"id": "C"}],
                "edges": [{"source": "A", "target": "B"}, {"source": "A", "target": "C"}]}"#,
        )
        .expect("payload");
        let config = LayoutConfig::default();
        let model = build_model(&payload, &ActiveLayers::default(), &config);
        let layout = compute_layout(&model, &config);
        let mut interaction = InteractionController::from_model(&model);
        for id in clicks {
            interaction.on_node_click(id, false);
        }
        render_svg(&layout, &interaction, &Theme::dark(), &RenderConfig::default())
    }

    #[test]
    fn render_svg_basic() {
        let svg = render(&[]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Checkout &amp; Pay"));
        assert_eq!(svg.matches("class=\"edge\"").count(), 2);
        assert!(!svg.contains("opacity=\"0.15\""));
    }

    #[test]
    fn highlighted_render_dims_other_edges() {
        let svg = render(&["B"]);
        assert!(svg.contains("stroke-width=\"2.5\""));
        assert!(svg.contains("opacity=\"0.15\""));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml("<a & 'b'>"), "&lt;a &amp; &apos;b&apos;&gt;");
    }
}
