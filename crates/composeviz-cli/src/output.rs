//! Output destination handling.

use std::io::Write;
use std::path::Path;

use anyhow::Context;

/// Writes `content` to `path`, or to stdout when no path is given.
///
/// # Errors
///
/// Returns an error if the destination cannot be written.
pub fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = content.len(), "graph written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_to_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.dot");
        write_output(Some(&path), "digraph G {}\n").expect("write");
        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "digraph G {}\n"
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope").join("out.dot");
        assert!(write_output(Some(&path), "x").is_err());
    }
}
