//! Unified error types for the composeviz workspace.
//!
//! The graph compiler performs no schema validation: these variants cover
//! the document-loading boundary plus the few places where a value cannot
//! be coerced into the shape the builder needs.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ComposeVizError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A compose document does not exist.
    #[error("file \"{}\" does not exist", path.display())]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// A compose document exists but does not decode to a mapping.
    #[error("file \"{}\" does not contain valid YAML: {message}", path.display())]
    Malformed {
        /// Path of the offending document.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// An `extends` chain refers back to one of its own ancestors.
    #[error("cyclic extends detected: {chain}")]
    ExtendsCycle {
        /// The offending chain, rendered as `a.yml -> b.yml -> a.yml`.
        chain: String,
    },

    /// A host port cannot be coerced to a port number.
    #[error("invalid port: \"{value}\"")]
    InvalidPort {
        /// The raw host port.
        value: String,
    },

    /// A service entry has a shape the builder cannot coerce.
    #[error("invalid {field} entry in service \"{service}\": {message}")]
    InvalidEntry {
        /// Service declaring the entry.
        service: String,
        /// Service field holding the entry.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ComposeVizError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_mentions_path() {
        let err = ComposeVizError::NotFound {
            path: PathBuf::from("missing.yml"),
        };
        assert_eq!(err.to_string(), "file \"missing.yml\" does not exist");
    }

    #[test]
    fn invalid_entry_names_service_and_field() {
        let err = ComposeVizError::InvalidEntry {
            service: "web".into(),
            field: "links",
            message: "expected a string".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("links"), "got: {msg}");
        assert!(msg.contains("\"web\""), "got: {msg}");
    }
}
