//! Loading of compose documents.
//!
//! The graph builder never touches the file system directly: documents
//! come through a [`DocumentLoader`], either [`FileLoader`] for real
//! files or [`MemoryLoader`] for documents held in memory.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use composeviz_common::constants::OVERRIDE_COMPOSE_FILE;
use composeviz_common::error::{ComposeVizError, Result};
use serde_yaml::Value;

/// Source of decoded compose documents.
pub trait DocumentLoader {
    /// Loads and decodes the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeVizError::NotFound`] when the document does not
    /// exist and [`ComposeVizError::Malformed`] when it does not decode to
    /// a mapping.
    fn load(&self, path: &Path) -> Result<Value>;

    /// Returns whether a document exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// Reads YAML documents from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl DocumentLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<Value> {
        tracing::info!(path = %path.display(), "loading compose document");

        if !path.exists() {
            return Err(ComposeVizError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ComposeVizError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        decode(path, &content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Serves documents from memory, keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: HashMap<PathBuf, Value>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an already decoded document.
    pub fn insert(&mut self, path: impl AsRef<Path>, document: Value) {
        let _ = self.documents.insert(normalize(path.as_ref()), document);
    }

    /// Decodes `yaml` and registers it under `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeVizError::Malformed`] if `yaml` does not decode to a
    /// mapping.
    pub fn insert_yaml(&mut self, path: impl AsRef<Path>, yaml: &str) -> Result<()> {
        let path = path.as_ref();
        let document = decode(path, yaml)?;
        self.insert(path, document);
        Ok(())
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<Value> {
        tracing::debug!(path = %path.display(), "loading in-memory compose document");
        self.documents
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| ComposeVizError::NotFound {
                path: path.to_path_buf(),
            })
    }

    fn exists(&self, path: &Path) -> bool {
        self.documents.contains_key(&normalize(path))
    }
}

fn decode(path: &Path, content: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(content).map_err(|e| ComposeVizError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if value.is_mapping() {
        Ok(value)
    } else {
        Err(ComposeVizError::Malformed {
            path: path.to_path_buf(),
            message: "top-level value is not a mapping".into(),
        })
    }
}

/// Lexically resolves `.` and `..` components without touching the disk.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Merges `overlay` on top of `base`.
///
/// Mappings merge key by key, sequences concatenate, and any other value
/// is replaced by the overlay.
pub fn merge_documents(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                if let Some(existing) = base.get_mut(&key) {
                    let current = std::mem::take(existing);
                    *existing = merge_documents(current, value);
                } else {
                    let _ = base.insert(key, value);
                }
            }
            Value::Mapping(base)
        }
        (Value::Sequence(mut base), Value::Sequence(overlay)) => {
            base.extend(overlay);
            Value::Sequence(base)
        }
        (_, overlay) => overlay,
    }
}

/// Loads `path` and merges the override document found next to it.
///
/// # Errors
///
/// Returns an error if either document cannot be loaded.
pub fn load_with_override(
    loader: &dyn DocumentLoader,
    path: &Path,
    ignore_override: bool,
) -> Result<Value> {
    let document = loader.load(path)?;
    if ignore_override {
        return Ok(document);
    }

    let override_path = path
        .parent()
        .map_or_else(|| PathBuf::from(OVERRIDE_COMPOSE_FILE), |dir| {
            dir.join(OVERRIDE_COMPOSE_FILE)
        });
    if normalize(&override_path) == normalize(path) || !loader.exists(&override_path) {
        return Ok(document);
    }

    tracing::info!(path = %override_path.display(), "merging override document");
    let overlay = loader.load(&override_path)?;
    Ok(merge_documents(document, overlay))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn yaml(input: &str) -> Value {
        serde_yaml::from_str(input).expect("valid yaml")
    }

    #[test]
    fn file_loader_reads_mapping() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "version: \"2\"\nservices:\n  web: {{}}").expect("write");
        let doc = FileLoader.load(file.path()).expect("load");
        assert!(doc.get("services").is_some());
    }

    #[test]
    fn file_loader_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FileLoader.load(&dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, ComposeVizError::NotFound { .. }), "got: {err}");
    }

    #[test]
    fn file_loader_rejects_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "services: [unclosed").expect("write");
        let err = FileLoader.load(file.path()).unwrap_err();
        assert!(matches!(err, ComposeVizError::Malformed { .. }), "got: {err}");
    }

    #[test]
    fn scalar_document_is_malformed() {
        let mut loader = MemoryLoader::new();
        let err = loader.insert_yaml("a.yml", "just a string").unwrap_err();
        assert!(matches!(err, ComposeVizError::Malformed { .. }));
    }

    #[test]
    fn memory_loader_normalizes_paths() {
        let mut loader = MemoryLoader::new();
        loader
            .insert_yaml("app/base.yml", "web: {}")
            .expect("insert");
        assert!(loader.exists(Path::new("app/./sub/../base.yml")));
        let doc = loader.load(Path::new("./app/base.yml")).expect("load");
        assert!(doc.get("web").is_some());
    }

    #[test]
    fn memory_loader_reports_missing_document() {
        let loader = MemoryLoader::new();
        let err = loader.load(Path::new("missing.yml")).unwrap_err();
        assert!(matches!(err, ComposeVizError::NotFound { .. }));
    }

    #[test]
    fn normalize_keeps_leading_parent_dirs() {
        assert_eq!(normalize(Path::new("../a/./b/../c.yml")), PathBuf::from("../a/c.yml"));
        assert_eq!(normalize(Path::new("/srv/../etc/x.yml")), PathBuf::from("/etc/x.yml"));
    }

    #[test]
    fn merge_overlays_mappings_and_concatenates_sequences() {
        let base = yaml("services:\n  web:\n    image: nginx\n    ports: [\"80\"]\n");
        let overlay = yaml(
            "services:\n  web:\n    image: nginx:alpine\n    ports: [\"443\"]\n  db:\n    image: postgres\n",
        );
        let merged = merge_documents(base, overlay);
        let web = &merged["services"]["web"];
        assert_eq!(web["image"], Value::from("nginx:alpine"));
        assert_eq!(web["ports"], yaml("[\"80\", \"443\"]"));
        assert!(merged["services"].get("db").is_some());
    }

    #[test]
    fn override_document_is_merged_when_present() {
        let mut loader = MemoryLoader::new();
        loader
            .insert_yaml("proj/docker-compose.yml", "version: \"2\"\nservices:\n  web: {}\n")
            .expect("insert");
        loader
            .insert_yaml(
                "proj/docker-compose.override.yml",
                "services:\n  debug: {}\n",
            )
            .expect("insert");

        let path = Path::new("proj/docker-compose.yml");
        let merged = load_with_override(&loader, path, false).expect("load");
        assert!(merged["services"].get("debug").is_some());

        let plain = load_with_override(&loader, path, true).expect("load");
        assert!(plain["services"].get("debug").is_none());
    }

    #[test]
    fn missing_override_is_skipped() {
        let mut loader = MemoryLoader::new();
        loader.insert_yaml("docker-compose.yml", "web: {}").expect("insert");
        let doc = load_with_override(&loader, Path::new("docker-compose.yml"), false)
            .expect("load");
        assert!(doc.get("web").is_some());
    }
}
