//! Text emitters for built graphs.
//!
//! DOT output is meant to be piped into Graphviz; JSON output dumps the
//! typed graph for other tooling.

use std::io::{self, Write};

use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::graph::{Relation, TopologyGraph, Vertex};
use crate::style::{Attributes, StyledGraph};

/// Writes `graph` as a Graphviz `digraph`.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn render_dot<W: Write>(graph: &StyledGraph, out: &mut W) -> io::Result<()> {
    writeln!(out, "digraph G {{")?;
    for (name, value) in &graph.attributes {
        writeln!(out, "  {name}={};", quote(value))?;
    }

    for vertex in graph.graph.node_weights() {
        writeln!(
            out,
            "  {}{};",
            quote(&vertex.id),
            attribute_list(&vertex.attributes)
        )?;
    }

    for edge in graph.graph.edge_references() {
        let from = &graph.graph[edge.source()].id;
        let to = &graph.graph[edge.target()].id;
        writeln!(
            out,
            "  {} -> {}{};",
            quote(from),
            quote(to),
            attribute_list(&edge.weight().attributes)
        )?;
    }

    writeln!(out, "}}")
}

/// Renders `graph` as a DOT string.
pub fn to_dot(graph: &StyledGraph) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = render_dot(graph, &mut out);
    String::from_utf8_lossy(&out).into_owned()
}

fn attribute_list(attributes: &Attributes) -> String {
    if attributes.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = attributes
        .iter()
        .map(|(name, value)| format!("{name}={}", quote(value)))
        .collect();
    format!(" [{}]", pairs.join(", "))
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

#[derive(Serialize)]
struct JsonGraph<'a> {
    vertices: Vec<&'a Vertex>,
    edges: Vec<JsonEdge<'a>>,
}

#[derive(Serialize)]
struct JsonEdge<'a> {
    from: &'a str,
    to: &'a str,
    #[serde(flatten)]
    relation: &'a Relation,
}

/// Serializes the typed graph as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(graph: &TopologyGraph) -> serde_json::Result<String> {
    let document = JsonGraph {
        vertices: graph.vertices().collect(),
        edges: graph
            .relations()
            .map(|r| JsonEdge {
                from: &r.from.id,
                to: &r.to.id,
                relation: r.relation,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&document)
}

#[cfg(test)]
mod tests {
    use composeviz_common::config::StyleOptions;

    use super::*;
    use crate::graph::{Protocol, RelationKind, VertexKind};
    use crate::style::style;

    fn sample() -> TopologyGraph {
        let mut graph = TopologyGraph::new();
        let port = graph.vertex("8080", VertexKind::Port { proto: Protocol::Tcp });
        let web = graph.vertex("web", VertexKind::Service);
        let _ = graph.relate(port, web, RelationKind::Ports, Some("80".into()), false);
        graph
    }

    #[test]
    fn dot_contains_graph_vertices_and_edges() {
        let dot = to_dot(&style(&sample(), &StyleOptions::default()));
        assert!(dot.starts_with("digraph G {\n"), "got: {dot}");
        assert!(dot.contains("  pad=\"0.5\";\n"), "got: {dot}");
        assert!(dot.contains("  \"8080\" [shape=\"circle\"];\n"), "got: {dot}");
        assert!(dot.contains("  \"web\" [shape=\"component\"];\n"), "got: {dot}");
        assert!(
            dot.contains("  \"8080\" -> \"web\" [label=\"80\", style=\"solid\"];\n"),
            "got: {dot}"
        );
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn dot_escapes_quotes_and_backslashes() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("C:\\data"), "\"C:\\\\data\"");
    }

    #[test]
    fn empty_attributes_render_bare_statement() {
        assert_eq!(attribute_list(&Attributes::new()), "");
    }

    #[test]
    fn json_lists_vertices_and_edges() {
        let json = to_json(&sample()).expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");

        assert_eq!(value["vertices"][0]["id"], "8080");
        assert_eq!(value["vertices"][0]["type"], "port");
        assert_eq!(value["vertices"][0]["proto"], "tcp");
        assert_eq!(value["vertices"][1]["type"], "service");

        let edge = &value["edges"][0];
        assert_eq!(edge["from"], "8080");
        assert_eq!(edge["to"], "web");
        assert_eq!(edge["kind"], "ports");
        assert_eq!(edge["alias"], "80");
        assert_eq!(edge["bidirectional"], false);
    }
}
