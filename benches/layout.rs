use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use service_graph_layout::config::{LayoutConfig, RenderConfig};
use service_graph_layout::interaction::InteractionController;
use service_graph_layout::ir::ActiveLayers;
use service_graph_layout::layout::compute_layout;
use service_graph_layout::model::build_model;
use service_graph_layout::parser::parse_payload;
use service_graph_layout::render::render_svg;
use service_graph_layout::theme::Theme;
use std::hint::black_box;

/// Layered payload with `services` components in a chain plus fan-out edges,
/// one platform node per four services and two indicators per service.
fn layered_payload(services: usize, extra_edges: usize) -> String {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for i in 0..services {
        nodes.push(format!(r#"{{"id": "svc{i}", "label": "Service {i}", "status": "healthy"}}"#));
    }
    for i in 0..services.saturating_sub(1) {
        edges.push(format!(r#"{{"source": "svc{i}", "target": "svc{}"}}"#, i + 1));
    }
    let mut count = 0usize;
    'outer: for i in 0..services {
        for j in (i + 2)..services {
            if count >= extra_edges {
                break 'outer;
            }
            edges.push(format!(r#"{{"source": "svc{i}", "target": "svc{j}"}}"#));
            count += 1;
        }
    }

    let platform_count = services.div_ceil(4).max(1);
    let platform_nodes: Vec<String> = (0..platform_count)
        .map(|p| format!(r#"{{"id": "plat{p}", "label": "Platform {p}"}}"#))
        .collect();
    let platform_edges: Vec<String> = (0..services)
        .map(|i| format!(r#"{{"source": "svc{i}", "target": "plat{}"}}"#, i / 4))
        .collect();
    let indicators: Vec<String> = (0..services)
        .flat_map(|i| {
            [
                format!(r#"{{"id": "lat{i}", "component": "svc{i}", "health": "green"}}"#),
                format!(r#"{{"id": "err{i}", "component": "svc{i}", "health": "amber"}}"#),
            ]
        })
        .collect();

    format!(
        r#"{{"components": {{"nodes": [{}], "edges": [{}]}},
            "platform": {{"nodes": [{}], "edges": [{}]}},
            "indicators": {{"nodes": [{}]}}}}"#,
        nodes.join(","),
        edges.join(","),
        platform_nodes.join(","),
        platform_edges.join(","),
        indicators.join(",")
    )
}

const SIZES: [(usize, usize); 4] = [(8, 4), (32, 24), (96, 80), (200, 160)];

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for active in [ActiveLayers::default(), ActiveLayers::all()] {
        for (services, extra) in SIZES {
            let payload = parse_payload(&layered_payload(services, extra)).expect("payload");
            let model = build_model(&payload, &active, &config);
            let label = format!("{services}x{extra}/{}", if active.platform { "all" } else { "primary" });
            group.bench_with_input(BenchmarkId::from_parameter(label), &model, |b, model| {
                b.iter(|| {
                    let layout = compute_layout(black_box(model), &config);
                    black_box(layout.nodes.len());
                });
            });
        }
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = LayoutConfig::default();
    let render = RenderConfig::default();
    let theme = Theme::dark();
    let active = ActiveLayers::all();
    for (services, extra) in SIZES {
        let input = layered_payload(services, extra);
        group.bench_with_input(BenchmarkId::from_parameter(services), &input, |b, data| {
            b.iter(|| {
                let payload = parse_payload(black_box(data)).expect("payload");
                let model = build_model(&payload, &active, &config);
                let layout = compute_layout(&model, &config);
                let mut interaction = InteractionController::from_model(&model);
                interaction.on_node_click("svc0", false);
                black_box(render_svg(&layout, &interaction, &theme, &render).len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layout, bench_end_to_end);
criterion_main!(benches);
