use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes analysis documents to disk as pretty-printed JSON.
pub struct ReportExporter {
    file_path: PathBuf,
}

impl ReportExporter {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn write<T: Serialize>(&self, document: &T) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create report directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(document).context("Failed to serialize report")?;

        // Atomic write: write to temp file then rename
        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp report file")?;
        fs::rename(&temp_path, &self.file_path).context("Failed to rename report file")?;

        debug!("Wrote report to {:?}", self.file_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("window.json");
        let exporter = ReportExporter::new(&path);

        exporter.write(&json!({ "error": "first" })).unwrap();
        exporter.write(&json!({ "error": "second" })).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("second"));
        assert!(!path.with_extension("tmp").exists());
    }
}
