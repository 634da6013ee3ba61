//! Graph construction from extracted compose sections.
//!
//! [`GraphBuilder`] owns the graph while it is being built and walks one
//! document level at a time: declared volumes and networks first, so that
//! they get their declared kind, then every service in declaration order.
//! `extends` references to other documents are resolved depth-first by
//! loading the referenced document and building it into the same graph.

use std::path::{Path, PathBuf};

use composeviz_common::config::BuildOptions;
use composeviz_common::constants::{NAMED_VOLUME_PREFIX, NETWORK_PREFIX};
use composeviz_common::error::{ComposeVizError, Result};
use petgraph::graph::NodeIndex;
use serde_yaml::{Mapping, Value};

use crate::document::{self, DocumentLoader};
use crate::extract;
use crate::graph::{Protocol, RelationKind, TopologyGraph, VertexKind};
use crate::mapping::{coerce_port, parse_mapping};

/// Builds a [`TopologyGraph`] from compose documents.
pub struct GraphBuilder<'a> {
    loader: &'a dyn DocumentLoader,
    options: &'a BuildOptions,
    graph: TopologyGraph,
    /// Documents currently being built, outermost first.
    chain: Vec<PathBuf>,
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder around an empty graph.
    pub fn new(loader: &'a dyn DocumentLoader, options: &'a BuildOptions) -> Self {
        Self::with_graph(loader, options, TopologyGraph::new())
    }

    /// Creates a builder that accumulates into an existing graph.
    pub fn with_graph(
        loader: &'a dyn DocumentLoader,
        options: &'a BuildOptions,
        graph: TopologyGraph,
    ) -> Self {
        Self {
            loader,
            options,
            graph,
            chain: Vec::new(),
        }
    }

    /// Returns the graph built so far.
    pub fn finish(self) -> TopologyGraph {
        self.graph
    }

    /// Adds one document level to the graph.
    ///
    /// `current_path` is the path of the document the sections come from;
    /// relative `extends.file` references are resolved against its
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if an extended document cannot be loaded, if an
    /// `extends` chain cycles back to one of its ancestors, or if an entry
    /// cannot be coerced into a vertex.
    pub fn build_level(
        &mut self,
        services: &Mapping,
        volumes: &Mapping,
        networks: &Mapping,
        current_path: &Path,
    ) -> Result<()> {
        self.chain.push(document::normalize(current_path));
        let result = self.walk_level(services, volumes, networks, current_path);
        let _ = self.chain.pop();
        result
    }

    fn walk_level(
        &mut self,
        services: &Mapping,
        volumes: &Mapping,
        networks: &Mapping,
        current_path: &Path,
    ) -> Result<()> {
        if self.options.include_volumes {
            for name in volumes.keys().filter_map(scalar_string) {
                let _ = self
                    .graph
                    .vertex(format!("{NAMED_VOLUME_PREFIX}{name}"), VertexKind::Volume);
            }
        }

        if self.options.include_networks {
            for (name, definition) in networks {
                let Some(name) = scalar_string(name) else {
                    continue;
                };
                let kind = if is_external(definition) {
                    VertexKind::ExternalNetwork
                } else {
                    VertexKind::Network
                };
                let _ = self.graph.vertex(format!("{NETWORK_PREFIX}{name}"), kind);
            }
        }

        for (name, definition) in services {
            let Some(name) = scalar_string(name) else {
                tracing::warn!(key = ?name, "skipping service with a non-scalar name");
                continue;
            };
            self.add_service(&name, definition, current_path)?;
        }

        Ok(())
    }

    fn add_service(&mut self, name: &str, definition: &Value, current_path: &Path) -> Result<()> {
        tracing::debug!(service = name, "adding service");
        let service = self.graph.vertex(name, VertexKind::Service);

        if let Some(extends) = definition.get("extends") {
            self.add_extends(name, service, extends, current_path)?;
        }

        for link in string_entries(name, "links", definition.get("links"))? {
            let mapping = parse_mapping(&link);
            let target = self.graph.vertex(mapping.first.as_str(), VertexKind::Service);
            let alias = (mapping.second != mapping.first).then_some(mapping.second);
            let _ = self
                .graph
                .relate(target, service, RelationKind::Links, alias, false);
        }

        for link in string_entries(name, "external_links", definition.get("external_links"))? {
            let mapping = parse_mapping(&link);
            let target = self
                .graph
                .vertex(mapping.first.as_str(), VertexKind::ExternalService);
            let alias = (mapping.second != mapping.first).then_some(mapping.second);
            let _ = self
                .graph
                .relate(target, service, RelationKind::ExternalLinks, alias, false);
        }

        for dependency in string_entries(name, "depends_on", definition.get("depends_on"))? {
            let dependency = self.graph.vertex(dependency, VertexKind::Service);
            let _ = self
                .graph
                .relate(service, dependency, RelationKind::DependsOn, None, false);
        }

        for source in string_entries(name, "volumes_from", definition.get("volumes_from"))? {
            let source = self.graph.vertex(source, VertexKind::Service);
            let _ = self
                .graph
                .relate(source, service, RelationKind::VolumesFrom, None, false);
        }

        if self.options.include_volumes {
            for entry in sequence(name, "volumes", definition.get("volumes"))? {
                self.add_volume(name, service, entry)?;
            }
        }

        if self.options.include_ports {
            for entry in sequence(name, "ports", definition.get("ports"))? {
                self.add_port(name, service, entry)?;
            }
        }

        if self.options.include_networks {
            self.add_networks(name, service, definition.get("networks"))?;
        }

        Ok(())
    }

    fn add_extends(
        &mut self,
        name: &str,
        service: NodeIndex,
        extends: &Value,
        current_path: &Path,
    ) -> Result<()> {
        let (base, file) = match extends {
            Value::Mapping(_) => {
                let base = extends
                    .get("service")
                    .and_then(scalar_string)
                    .ok_or_else(|| invalid(name, "extends", "missing base service name"))?;
                (base, extends.get("file").and_then(scalar_string))
            }
            other => {
                let base = scalar_string(other)
                    .ok_or_else(|| invalid(name, "extends", "expected a mapping or a name"))?;
                (base, None)
            }
        };

        if let Some(file) = file {
            let target = current_path
                .parent()
                .map_or_else(|| PathBuf::from(&file), |dir| dir.join(&file));
            let normalized = document::normalize(&target);

            if normalized != document::normalize(current_path) {
                if self.chain.contains(&normalized) {
                    return Err(self.cycle_error(&normalized));
                }

                tracing::debug!(
                    service = name,
                    base = base.as_str(),
                    file = %target.display(),
                    "resolving extends"
                );
                let extended = self.loader.load(&target)?;
                self.build_level(
                    &extract::services(&extended),
                    &extract::volumes(&extended),
                    &extract::networks(&extended),
                    &target,
                )?;
            }
        }

        let base = self.graph.vertex(base, VertexKind::Service);
        let _ = self
            .graph
            .relate(base, service, RelationKind::Extends, None, false);
        Ok(())
    }

    fn add_volume(&mut self, name: &str, service: NodeIndex, entry: &Value) -> Result<()> {
        let (host, container, read_only) = match entry {
            Value::Mapping(_) => {
                let target = entry.get("target").and_then(scalar_string);
                let host = entry
                    .get("source")
                    .and_then(scalar_string)
                    .or_else(|| target.clone())
                    .ok_or_else(|| invalid(name, "volumes", "missing source and target"))?;
                let read_only = entry
                    .get("read_only")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let container = target.unwrap_or_else(|| host.clone());
                (host, container, read_only)
            }
            other => {
                let raw = scalar_string(other)
                    .ok_or_else(|| invalid(name, "volumes", "expected a string"))?;
                let mapping = parse_mapping(&raw);
                let read_only = mapping.third.as_deref() == Some("ro");
                (mapping.first, mapping.second, read_only)
            }
        };

        let host = if is_host_path(&host) {
            host
        } else {
            format!("{NAMED_VOLUME_PREFIX}{host}")
        };

        let alias = (host != container).then_some(container);
        let volume = self.graph.vertex(host, VertexKind::Volume);
        let _ = self
            .graph
            .relate(volume, service, RelationKind::Volumes, alias, !read_only);
        Ok(())
    }

    fn add_port(&mut self, name: &str, service: NodeIndex, entry: &Value) -> Result<()> {
        let (host, container, proto) = match entry {
            Value::Mapping(_) => {
                let container = entry
                    .get("target")
                    .and_then(scalar_string)
                    .ok_or_else(|| invalid(name, "ports", "missing target port"))?;
                let host = entry
                    .get("published")
                    .and_then(scalar_string)
                    .unwrap_or_else(|| container.clone());
                let proto = entry.get("protocol").and_then(scalar_string);
                (host, container, proto)
            }
            other => {
                let raw = scalar_string(other)
                    .ok_or_else(|| invalid(name, "ports", "expected a string"))?;
                let mapping = parse_mapping(&raw);
                (mapping.first, mapping.second, mapping.third)
            }
        };

        let number = coerce_port(&host)?;
        let proto = Protocol::from_qualifier(proto.as_deref());
        let port = self
            .graph
            .vertex(number.to_string(), VertexKind::Port { proto });
        let alias = (host != container).then_some(container);
        let _ = self
            .graph
            .relate(port, service, RelationKind::Ports, alias, false);
        Ok(())
    }

    fn add_networks(
        &mut self,
        name: &str,
        service: NodeIndex,
        networks: Option<&Value>,
    ) -> Result<()> {
        let entries: Vec<(String, Option<&Value>)> = match networks {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| {
                    scalar_string(item)
                        .map(|network| (network, None))
                        .ok_or_else(|| invalid(name, "networks", "expected a network name"))
                })
                .collect::<Result<_>>()?,
            Some(Value::Mapping(items)) => items
                .iter()
                .filter_map(|(network, config)| {
                    scalar_string(network).map(|network| (network, Some(config)))
                })
                .collect(),
            Some(_) => return Err(invalid(name, "networks", "expected a sequence or a mapping")),
        };

        for (network, config) in entries {
            let aliases: Vec<String> = config
                .and_then(|c| c.get("aliases"))
                .and_then(Value::as_sequence)
                .map(|items| items.iter().filter_map(scalar_string).collect())
                .unwrap_or_default();
            let alias = (!aliases.is_empty()).then(|| aliases.join(", "));

            let network = self
                .graph
                .vertex(format!("{NETWORK_PREFIX}{network}"), VertexKind::Network);
            let _ = self
                .graph
                .relate(service, network, RelationKind::Networks, alias, false);
        }

        Ok(())
    }

    fn cycle_error(&self, target: &Path) -> ComposeVizError {
        let chain = self
            .chain
            .iter()
            .map(|p| p.as_path())
            .chain(std::iter::once(target))
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        ComposeVizError::ExtendsCycle { chain }
    }
}

/// Builds the graph of an already loaded document.
///
/// The service map is restricted to [`BuildOptions::only`] when it is not
/// empty; documents reached through `extends` are never filtered.
///
/// # Errors
///
/// Returns an error if the build fails, see [`GraphBuilder::build_level`].
pub fn build_document(
    loader: &dyn DocumentLoader,
    document: &Value,
    path: &Path,
    options: &BuildOptions,
) -> Result<TopologyGraph> {
    let mut services = extract::services(document);
    if !options.only.is_empty() {
        services = services
            .into_iter()
            .filter(|(name, _)| {
                scalar_string(name).is_some_and(|name| options.only.contains(&name))
            })
            .collect();
    }

    tracing::info!(
        path = %path.display(),
        services = services.len(),
        "building topology graph"
    );

    let mut builder = GraphBuilder::new(loader, options);
    builder.build_level(
        &services,
        &extract::volumes(document),
        &extract::networks(document),
        path,
    )?;
    Ok(builder.finish())
}

/// Loads the document at `path`, merges its override unless told not to,
/// and builds its graph.
///
/// # Errors
///
/// Returns an error if loading or building fails.
pub fn build_graph(
    loader: &dyn DocumentLoader,
    path: &Path,
    options: &BuildOptions,
    ignore_override: bool,
) -> Result<TopologyGraph> {
    let document = document::load_with_override(loader, path, ignore_override)?;
    build_document(loader, &document, path, options)
}

fn is_external(definition: &Value) -> bool {
    match definition.get("external") {
        Some(Value::Bool(external)) => *external,
        Some(Value::Mapping(_)) => true,
        _ => false,
    }
}

fn is_host_path(host: &str) -> bool {
    host.starts_with(|c: char| c == '.' || std::path::is_separator(c))
}

/// Renders a YAML scalar as a string.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn sequence<'v>(
    service: &str,
    field: &'static str,
    value: Option<&'v Value>,
) -> Result<&'v [Value]> {
    match value {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Sequence(items)) => Ok(items),
        Some(_) => Err(invalid(service, field, "expected a sequence")),
    }
}

/// Reads a list of names: a sequence of scalars, or the keys of a mapping.
fn string_entries(
    service: &str,
    field: &'static str,
    value: Option<&Value>,
) -> Result<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| {
                scalar_string(item).ok_or_else(|| invalid(service, field, "expected a string"))
            })
            .collect(),
        Some(Value::Mapping(items)) => Ok(items.keys().filter_map(scalar_string).collect()),
        Some(_) => Err(invalid(service, field, "expected a sequence or a mapping")),
    }
}

fn invalid(service: &str, field: &'static str, message: &str) -> ComposeVizError {
    ComposeVizError::InvalidEntry {
        service: service.to_owned(),
        field,
        message: message.to_owned(),
    }
}
