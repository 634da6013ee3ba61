//! Configuration model for a graph compilation run.

use std::fmt;
use std::path::PathBuf;

/// Controls which resources the graph builder turns into vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Create vertices and edges for named volumes and mounts.
    pub include_volumes: bool,
    /// Create vertices and edges for networks.
    pub include_networks: bool,
    /// Create vertices and edges for published ports.
    pub include_ports: bool,
    /// Restrict the root document to these services. Empty keeps all.
    pub only: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            include_volumes: true,
            include_networks: true,
            include_ports: true,
            only: Vec::new(),
        }
    }
}

/// Presentation hints applied by the styling step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleOptions {
    /// Lay the graph out left to right instead of top to bottom.
    pub horizontal: bool,
    /// Background color of the rendered graph.
    pub background: Option<String>,
}

/// Output format of the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Graphviz DOT text.
    #[default]
    Dot,
    /// JSON dump of the typed graph.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dot => write!(f, "dot"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Root configuration of one `composeviz` run.
#[derive(Debug, Clone)]
pub struct VizConfig {
    /// Compose document to read.
    pub input: PathBuf,
    /// Destination file. `None` writes to stdout.
    pub output: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// Skip merging the override document.
    pub ignore_override: bool,
    /// Graph builder options.
    pub build: BuildOptions,
    /// Styling options.
    pub style: StyleOptions,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(crate::constants::DEFAULT_COMPOSE_FILE),
            output: None,
            format: OutputFormat::default(),
            ignore_override: false,
            build: BuildOptions::default(),
            style: StyleOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_every_resource() {
        let options = BuildOptions::default();
        assert!(options.include_volumes);
        assert!(options.include_networks);
        assert!(options.include_ports);
        assert!(options.only.is_empty());
    }

    #[test]
    fn default_config_reads_compose_file() {
        let config = VizConfig::default();
        assert_eq!(config.input, PathBuf::from("docker-compose.yml"));
        assert_eq!(config.format, OutputFormat::Dot);
        assert!(config.output.is_none());
    }
}
