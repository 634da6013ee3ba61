//! # composeviz-graph
//!
//! Compiler from docker-compose documents to topology graphs.
//!
//! Handles:
//! - **Extract**: Locating the service, volume, and network maps of a document.
//! - **Mapping**: Parsing `host:container[/proto]` shorthand strings.
//! - **Graph**: The typed, deduplicated vertex and relation store.
//! - **Builder**: Walking services and resolving `extends` across documents.
//! - **Document**: Loading YAML documents and merging override files.
//! - **Style**: Mapping semantic kinds to Graphviz presentation attributes.
//! - **Render**: DOT and JSON emitters.

pub mod builder;
pub mod document;
pub mod extract;
pub mod graph;
pub mod mapping;
pub mod render;
pub mod style;
