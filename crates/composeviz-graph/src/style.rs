//! Graphviz presentation attributes.
//!
//! Styling maps each vertex and relation kind to shape, color and line
//! style hints. It produces a new [`StyledGraph`] and never touches the
//! topology graph it reads from.

use std::collections::BTreeMap;

use composeviz_common::config::StyleOptions;
use composeviz_common::constants::GRAPH_PADDING;
use petgraph::graph::DiGraph;

use crate::graph::{Protocol, Relation, RelationKind, TopologyGraph, Vertex, VertexKind};

/// Graphviz attributes, sorted by name.
pub type Attributes = BTreeMap<&'static str, String>;

/// A vertex ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledVertex {
    /// Vertex id, also used as its label.
    pub id: String,
    /// Presentation attributes.
    pub attributes: Attributes,
}

/// A relation ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledEdge {
    /// Presentation attributes.
    pub attributes: Attributes,
}

/// Presentation copy of a [`TopologyGraph`].
#[derive(Debug, Clone)]
pub struct StyledGraph {
    /// Graph-level attributes.
    pub attributes: Attributes,
    /// Styled vertices and edges.
    pub graph: DiGraph<StyledVertex, StyledEdge>,
}

/// Builds the presentation copy of `graph`.
pub fn style(graph: &TopologyGraph, options: &StyleOptions) -> StyledGraph {
    let mut attributes = Attributes::new();
    let _ = attributes.insert("pad", GRAPH_PADDING.to_owned());
    let _ = attributes.insert("ratio", "fill".to_owned());
    if options.horizontal {
        let _ = attributes.insert("rankdir", "LR".to_owned());
    }
    if let Some(color) = &options.background {
        let _ = attributes.insert("bgcolor", color.clone());
    }

    StyledGraph {
        attributes,
        graph: graph.inner().map(
            |_, vertex| style_vertex(vertex),
            |_, relation| style_edge(relation),
        ),
    }
}

fn style_vertex(vertex: &Vertex) -> StyledVertex {
    let mut attributes = Attributes::new();
    let mut set = |name, value: &str| {
        let _ = attributes.insert(name, value.to_owned());
    };

    match vertex.kind {
        VertexKind::Service => set("shape", "component"),
        VertexKind::ExternalService => {
            set("shape", "component");
            set("color", "gray");
        }
        VertexKind::Volume => set("shape", "folder"),
        VertexKind::Network => set("shape", "pentagon"),
        VertexKind::ExternalNetwork => {
            set("shape", "pentagon");
            set("color", "gray");
        }
        VertexKind::Port { proto } => {
            set("shape", "circle");
            if proto == Protocol::Udp {
                set("style", "dashed");
            }
        }
    }

    StyledVertex {
        id: vertex.id.clone(),
        attributes,
    }
}

fn style_edge(relation: &Relation) -> StyledEdge {
    let mut attributes = Attributes::new();
    let mut set = |name, value: &str| {
        let _ = attributes.insert(name, value.to_owned());
    };

    match relation.kind {
        RelationKind::Links | RelationKind::Ports => set("style", "solid"),
        RelationKind::ExternalLinks => {
            set("style", "solid");
            set("color", "gray");
        }
        RelationKind::Volumes | RelationKind::VolumesFrom => set("style", "dashed"),
        RelationKind::DependsOn => set("style", "dotted"),
        RelationKind::Extends => {
            set("dir", "both");
            set("arrowhead", "inv");
            set("arrowtail", "dot");
        }
        RelationKind::Networks => {}
    }

    if let Some(alias) = &relation.alias {
        set("label", alias.as_str());
    }
    if relation.bidirectional {
        set("dir", "both");
    }

    StyledEdge { attributes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TopologyGraph {
        let mut graph = TopologyGraph::new();
        let web = graph.vertex("web", VertexKind::Service);
        let legacy = graph.vertex("legacy", VertexKind::ExternalService);
        let data = graph.vertex("named: data", VertexKind::Volume);
        let dns = graph.vertex("53", VertexKind::Port { proto: Protocol::Udp });
        let net = graph.vertex("net: outside", VertexKind::ExternalNetwork);
        let base = graph.vertex("base", VertexKind::Service);
        let _ = graph.relate(legacy, web, RelationKind::ExternalLinks, Some("db".into()), false);
        let _ = graph.relate(data, web, RelationKind::Volumes, Some("/data".into()), true);
        let _ = graph.relate(dns, web, RelationKind::Ports, None, false);
        let _ = graph.relate(web, net, RelationKind::Networks, None, false);
        let _ = graph.relate(base, web, RelationKind::Extends, None, false);
        graph
    }

    fn vertex<'a>(styled: &'a StyledGraph, id: &str) -> &'a Attributes {
        styled
            .graph
            .node_weights()
            .find(|v| v.id == id)
            .map(|v| &v.attributes)
            .expect(id)
    }

    fn edges(styled: &StyledGraph) -> Vec<&Attributes> {
        styled.graph.edge_weights().map(|e| &e.attributes).collect()
    }

    #[test]
    fn graph_attributes() {
        let styled = style(&TopologyGraph::new(), &StyleOptions::default());
        assert_eq!(styled.attributes.get("pad").map(String::as_str), Some("0.5"));
        assert_eq!(styled.attributes.get("ratio").map(String::as_str), Some("fill"));
        assert!(!styled.attributes.contains_key("rankdir"));

        let options = StyleOptions {
            horizontal: true,
            background: Some("#ffffff".into()),
        };
        let styled = style(&TopologyGraph::new(), &options);
        assert_eq!(styled.attributes.get("rankdir").map(String::as_str), Some("LR"));
        assert_eq!(styled.attributes.get("bgcolor").map(String::as_str), Some("#ffffff"));
    }

    #[test]
    fn vertex_shapes() {
        let styled = style(&sample(), &StyleOptions::default());
        assert_eq!(vertex(&styled, "web")["shape"], "component");
        assert!(!vertex(&styled, "web").contains_key("color"));
        assert_eq!(vertex(&styled, "legacy")["color"], "gray");
        assert_eq!(vertex(&styled, "named: data")["shape"], "folder");
        assert_eq!(vertex(&styled, "53")["shape"], "circle");
        assert_eq!(vertex(&styled, "53")["style"], "dashed");
        assert_eq!(vertex(&styled, "net: outside")["shape"], "pentagon");
        assert_eq!(vertex(&styled, "net: outside")["color"], "gray");
    }

    #[test]
    fn edge_styles() {
        let styled = style(&sample(), &StyleOptions::default());
        let all = edges(&styled);

        assert_eq!(all[0]["style"], "solid");
        assert_eq!(all[0]["color"], "gray");
        assert_eq!(all[0]["label"], "db");

        assert_eq!(all[1]["style"], "dashed");
        assert_eq!(all[1]["dir"], "both");
        assert_eq!(all[1]["label"], "/data");

        assert_eq!(all[2]["style"], "solid");
        assert!(!all[2].contains_key("label"));

        assert!(all[3].is_empty());

        assert_eq!(all[4]["dir"], "both");
        assert_eq!(all[4]["arrowhead"], "inv");
        assert_eq!(all[4]["arrowtail"], "dot");
    }

    #[test]
    fn styling_is_pure() {
        let graph = sample();
        let before = graph.clone();
        let first = style(&graph, &StyleOptions::default());
        let second = style(&graph, &StyleOptions::default());

        assert_eq!(first.attributes, second.attributes);
        assert!(
            first
                .graph
                .node_weights()
                .zip(second.graph.node_weights())
                .all(|(a, b)| a == b)
        );
        assert!(
            first
                .graph
                .edge_weights()
                .zip(second.graph.edge_weights())
                .all(|(a, b)| a == b)
        );
        assert!(graph.vertices().eq(before.vertices()));
        assert!(graph.relations().eq(before.relations()));
    }
}
