//! Typed topology graph using `petgraph`.
//!
//! Vertices are identified by strings derived from domain values (service
//! name, `named: <volume>`, `net: <network>`, host port) so that repeated
//! references to one entity resolve to one vertex. Relations are unique
//! per `(from, to, kind)`.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;

/// Transport protocol of a published port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP, the default.
    #[default]
    Tcp,
    /// UDP.
    Udp,
}

impl Protocol {
    /// Reads a protocol qualifier. Anything other than a lowercase `udp` is TCP.
    pub fn from_qualifier(qualifier: Option<&str>) -> Self {
        match qualifier {
            Some("udp") => Self::Udp,
            _ => Self::Tcp,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// Semantic type of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum VertexKind {
    /// A service declared in one of the documents.
    Service,
    /// A service only reached through `external_links`.
    ExternalService,
    /// A named volume or a host path.
    Volume,
    /// A network managed by the application.
    Network,
    /// A network declared with `external: true`.
    ExternalNetwork,
    /// A published host port.
    Port {
        /// Protocol of the first mapping that published it.
        proto: Protocol,
    },
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::ExternalService => write!(f, "external_service"),
            Self::Volume => write!(f, "volume"),
            Self::Network => write!(f, "network"),
            Self::ExternalNetwork => write!(f, "external_network"),
            Self::Port { .. } => write!(f, "port"),
        }
    }
}

/// A graph vertex. Its id doubles as its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vertex {
    /// Unique identifier.
    pub id: String,
    /// Semantic type, fixed at creation.
    #[serde(flatten)]
    pub kind: VertexKind,
}

/// Semantic type of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// `links`: target service to linking service.
    Links,
    /// `external_links`: external service to linking service.
    ExternalLinks,
    /// `depends_on`: dependent service to its dependency.
    DependsOn,
    /// `volumes_from`: source service to consuming service.
    VolumesFrom,
    /// `volumes`: volume to mounting service.
    Volumes,
    /// `ports`: host port to publishing service.
    Ports,
    /// `networks`: service to the network it joins.
    Networks,
    /// `extends`: base service to the service extending it.
    Extends,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Links => "links",
            Self::ExternalLinks => "external_links",
            Self::DependsOn => "depends_on",
            Self::VolumesFrom => "volumes_from",
            Self::Volumes => "volumes",
            Self::Ports => "ports",
            Self::Networks => "networks",
            Self::Extends => "extends",
        };
        f.write_str(name)
    }
}

/// Edge weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    /// Semantic type.
    pub kind: RelationKind,
    /// Link alias, container path, container port, or network aliases.
    pub alias: Option<String>,
    /// Set for read-write volume mounts.
    pub bidirectional: bool,
}

/// A relation together with the ids of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationRef<'a> {
    /// Source vertex.
    pub from: &'a Vertex,
    /// Destination vertex.
    pub to: &'a Vertex,
    /// The relation itself.
    pub relation: &'a Relation,
}

/// Directed, deduplicated graph of compose resources.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    graph: DiGraph<Vertex, Relation>,
    vertices: HashMap<String, NodeIndex>,
    relations: HashMap<(NodeIndex, NodeIndex, RelationKind), EdgeIndex>,
}

impl TopologyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the vertex with `id`, creating it with `kind` if missing.
    ///
    /// The kind of an existing vertex is never changed.
    pub fn vertex(&mut self, id: impl Into<String>, kind: VertexKind) -> NodeIndex {
        let id = id.into();
        if let Some(&idx) = self.vertices.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(Vertex {
            id: id.clone(),
            kind,
        });
        let _ = self.vertices.insert(id, idx);
        idx
    }

    /// Relates `from` to `to`, updating the existing relation of the same
    /// kind instead of adding a second one.
    ///
    /// `bidirectional` always takes the new value; `alias` only when one is
    /// given.
    pub fn relate(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        kind: RelationKind,
        alias: Option<String>,
        bidirectional: bool,
    ) -> EdgeIndex {
        if let Some(&edge) = self.relations.get(&(from, to, kind)) {
            if let Some(relation) = self.graph.edge_weight_mut(edge) {
                if alias.is_some() {
                    relation.alias = alias;
                }
                relation.bidirectional = bidirectional;
            }
            return edge;
        }

        let edge = self.graph.add_edge(
            from,
            to,
            Relation {
                kind,
                alias,
                bidirectional,
            },
        );
        let _ = self.relations.insert((from, to, kind), edge);
        edge
    }

    /// Looks a vertex up by id.
    pub fn get(&self, id: &str) -> Option<&Vertex> {
        self.vertices
            .get(id)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Looks a relation up by endpoint ids and kind.
    pub fn relation(&self, from: &str, to: &str, kind: RelationKind) -> Option<&Relation> {
        let from = *self.vertices.get(from)?;
        let to = *self.vertices.get(to)?;
        let edge = *self.relations.get(&(from, to, kind))?;
        self.graph.edge_weight(edge)
    }

    /// Iterates over vertices in creation order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.graph.node_weights()
    }

    /// Iterates over relations in creation order.
    pub fn relations(&self) -> impl Iterator<Item = RelationRef<'_>> {
        self.graph.edge_references().map(|edge| RelationRef {
            from: &self.graph[edge.source()],
            to: &self.graph[edge.target()],
            relation: edge.weight(),
        })
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of relations.
    pub fn relation_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Read-only access to the underlying `petgraph` graph.
    pub const fn inner(&self) -> &DiGraph<Vertex, Relation> {
        &self.graph
    }
}
