use crate::config::load_config;
use crate::ir::ActiveLayers;
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_payload;
use crate::render::write_output_svg;
use crate::session::GraphSession;
use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "depgraph", version, about = "Layered service-dependency graph layout")]
pub struct Args {
    /// Input payload (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Active layers, comma separated: platform,datacenter,indicator,crossapp,nocrossapp,all
    #[arg(short = 'l', long = "layers", default_value = "")]
    pub layers: String,

    /// Collapse indicators into one group per component
    #[arg(long = "group-indicators")]
    pub group_indicators: bool,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Replay a click on a node before rendering (repeatable)
    #[arg(long = "click-node")]
    pub click_node: Vec<String>,

    /// Replay a click on an edge before rendering (repeatable)
    #[arg(long = "click-edge")]
    pub click_edge: Vec<String>,

    /// Hold the multi-select modifier for replayed clicks after the first
    #[arg(long = "modifier")]
    pub modifier: bool,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let mut active = ActiveLayers::from_tokens(&args.layers);
    active.group_indicators |= args.group_indicators;

    let input = read_input(args.input.as_deref())?;
    let payload = parse_payload(&input)?;
    let mut session = GraphSession::new(payload, active, config);
    tracing::info!(
        nodes = session.model().nodes.len(),
        edges = session.model().edges.len(),
        "graph laid out"
    );

    replay_clicks(&mut session, &args);

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &session.dump())?;
        tracing::info!(path = %path.display(), "wrote layout dump");
    }

    let svg = session.render_svg();
    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref())?,
        OutputFormat::Png => write_png(&svg, &args, &session)?,
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, args: &Args, session: &GraphSession) -> Result<()> {
    let output = ensure_output(&args.output, "png")?;
    crate::render::write_output_png(svg, &output, &session.config().render)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _args: &Args, _session: &GraphSession) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

/// Node clicks first, then edge clicks. The first click replaces the
/// highlight; later ones use the modifier when `--modifier` is set.
fn replay_clicks(session: &mut GraphSession, args: &Args) {
    let mut first = true;
    for id in &args.click_node {
        let modifier = args.modifier && !first;
        if !session.on_node_click(id, modifier) {
            tracing::warn!(node = %id, "click on unknown node ignored");
        }
        first = false;
    }
    for id in &args.click_edge {
        let modifier = args.modifier && !first;
        if !session.on_edge_click(id, modifier) {
            tracing::warn!(edge = %id, "click on unknown edge ignored");
        }
        first = false;
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)));
    if let Err(err) = tracing_subscriber::registry().with(stderr_layer).try_init() {
        tracing::debug!(error = %err, "keeping the existing tracing subscriber");
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(feature = "png")]
fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn parses_repeated_clicks_and_layers() {
        let args = Args::try_parse_from([
            "depgraph",
            "-i",
            "graph.json",
            "-l",
            "platform,indicator",
            "--click-node",
            "B",
            "--click-node",
            "C",
            "--modifier",
            "-vv",
        ])
        .expect("args");
        assert_eq!(args.click_node, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(args.verbose, 2);
        let active = ActiveLayers::from_tokens(&args.layers);
        assert!(active.platform && active.indicator && !active.datacenter);
    }

    #[test]
    fn tracing_init_tolerates_an_installed_subscriber() {
        init_tracing(0);
        init_tracing(3);
    }

    #[test]
    fn replayed_clicks_use_modifier_after_first() {
        let args = Args::try_parse_from(["depgraph", "--click-node", "B", "--click-node", "C", "--modifier"])
            .expect("args");
        let mut session = GraphSession::from_json(
            r#"{"root": {"id": "A"}, "dependencies": [{"id": "B"}, {"id": "C"}],
                "edges": [{"source": "A", "target": "B"}, {"source": "A", "target": "C"}]}"#,
            ActiveLayers::default(),
            Config::default(),
        )
        .expect("payload");
        replay_clicks(&mut session, &args);
        assert_eq!(session.interaction().highlighted().len(), 2);
    }
}
