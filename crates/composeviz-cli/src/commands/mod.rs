//! CLI argument definitions and dispatch.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use composeviz_common::config::{BuildOptions, OutputFormat, StyleOptions, VizConfig};
use composeviz_common::constants::{BIN_NAME, DEFAULT_COMPOSE_FILE};
use composeviz_graph::builder::build_graph;
use composeviz_graph::document::FileLoader;
use composeviz_graph::render;
use composeviz_graph::style::style;

/// Draw the topology of a docker-compose application.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Path to the docker-compose file.
    #[arg(default_value = DEFAULT_COMPOSE_FILE)]
    pub file: PathBuf,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Output format.
    #[arg(short = 'm', long, value_enum, default_value_t = Format::Dot)]
    pub output_format: Format,

    /// Lay the graph out left to right.
    #[arg(short = 'r', long)]
    pub horizontal: bool,

    /// Do not draw volumes.
    #[arg(long)]
    pub no_volumes: bool,

    /// Do not draw networks.
    #[arg(long)]
    pub no_networks: bool,

    /// Do not draw ports.
    #[arg(long)]
    pub no_ports: bool,

    /// Only draw these services (repeatable).
    #[arg(long = "only", value_name = "SERVICE")]
    pub only: Vec<String>,

    /// Ignore docker-compose.override.yml.
    #[arg(long)]
    pub ignore_override: bool,

    /// Background color of the graph.
    #[arg(long, value_name = "COLOR")]
    pub background: Option<String>,
}

/// Output formats accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Graphviz DOT.
    Dot,
    /// JSON dump of the typed graph.
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Dot => Self::Dot,
            Format::Json => Self::Json,
        }
    }
}

impl From<Cli> for VizConfig {
    fn from(cli: Cli) -> Self {
        Self {
            input: cli.file,
            output: cli.output_file,
            format: cli.output_format.into(),
            ignore_override: cli.ignore_override,
            build: BuildOptions {
                include_volumes: !cli.no_volumes,
                include_networks: !cli.no_networks,
                include_ports: !cli.no_ports,
                only: cli.only,
            },
            style: StyleOptions {
                horizontal: cli.horizontal,
                background: cli.background,
            },
        }
    }
}

/// Builds the graph described by the parsed arguments and writes it out.
///
/// # Errors
///
/// Returns an error if the document cannot be loaded, the graph cannot be
/// built, or the output cannot be written.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    run(&VizConfig::from(cli))
}

/// Runs one compilation described by `config`.
///
/// # Errors
///
/// See [`execute`].
pub fn run(config: &VizConfig) -> anyhow::Result<()> {
    tracing::info!(
        path = %config.input.display(),
        format = %config.format,
        "rendering compose topology"
    );

    let graph = build_graph(
        &FileLoader,
        &config.input,
        &config.build,
        config.ignore_override,
    )?;
    tracing::debug!(
        vertices = graph.vertex_count(),
        relations = graph.relation_count(),
        "graph built"
    );

    let rendered = match config.format {
        OutputFormat::Dot => render::to_dot(&style(&graph, &config.style)),
        OutputFormat::Json => render::to_json(&graph)?,
    };

    crate::output::write_output(config.output.as_deref(), &rendered)
}
