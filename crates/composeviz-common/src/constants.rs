//! Well-known file names and vertex identity prefixes.

/// Compose file read when no path is given on the command line.
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// Override file merged on top of the main document when present.
pub const OVERRIDE_COMPOSE_FILE: &str = "docker-compose.override.yml";

/// Prefix of named volume vertex identifiers.
pub const NAMED_VOLUME_PREFIX: &str = "named: ";

/// Prefix of network vertex identifiers.
pub const NETWORK_PREFIX: &str = "net: ";

/// Graphviz padding applied to every rendered graph.
pub const GRAPH_PADDING: &str = "0.5";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "composeviz";
