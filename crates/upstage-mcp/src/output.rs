//! Persisted tool output.
//!
//! Every successful tool call writes its result under a fixed base directory
//! as pretty-printed JSON, named `<stem>_<timestamp>_<suffix>.json` with a
//! per-category subdirectory and suffix. Timestamps have second resolution,
//! so two writes for the same input stem within the same second produce the
//! same name and the later write replaces the earlier one.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Where a persisted result belongs in the output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCategory {
    DocumentParsing,
    InformationExtraction,
    Schema,
    GeneratedSchema,
    DocumentClassification,
}

impl OutputCategory {
    fn subdir(&self) -> &'static str {
        match self {
            OutputCategory::DocumentParsing => "document_parsing",
            OutputCategory::InformationExtraction => "information_extraction",
            OutputCategory::Schema | OutputCategory::GeneratedSchema => {
                "information_extraction/schemas"
            }
            OutputCategory::DocumentClassification => "document_classification",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            OutputCategory::DocumentParsing => "upstage",
            OutputCategory::InformationExtraction => "extraction",
            OutputCategory::Schema => "schema",
            OutputCategory::GeneratedSchema => "generated_schema",
            OutputCategory::DocumentClassification => "classification",
        }
    }
}

/// Writes tool results as timestamped JSON files.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    base: PathBuf,
}

impl OutputWriter {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Persist a payload for the given source document, creating the
    /// category directory as needed. Returns the full path written.
    pub async fn write_json(
        &self,
        category: OutputCategory,
        source: &Path,
        payload: &Value,
    ) -> Result<PathBuf> {
        let dir = self.base.join(category.subdir());
        tokio::fs::create_dir_all(&dir).await?;

        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{}_{}_{}.json", stem, timestamp, category.suffix()));

        let text = serde_json::to_string_pretty(payload)?;
        tokio::fs::write(&path, text).await?;
        debug!(path = %path.display(), "result persisted");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_json_creates_category_directory() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path());

        let path = writer
            .write_json(
                OutputCategory::DocumentParsing,
                Path::new("/tmp/report.pdf"),
                &json!({"content": {"text": "hello"}}),
            )
            .await
            .unwrap();

        assert!(path.starts_with(dir.path().join("document_parsing")));
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("report_"));
        assert!(name.ends_with("_upstage.json"));
    }

    #[tokio::test]
    async fn test_written_payload_round_trips() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path());
        let payload = json!({"classification": "invoice"});

        let path = writer
            .write_json(
                OutputCategory::DocumentClassification,
                Path::new("scan.jpg"),
                &payload,
            )
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, payload);
    }

    #[tokio::test]
    async fn test_schema_categories_share_directory_with_distinct_suffixes() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path());
        let source = Path::new("doc.pdf");

        let schema_path = writer
            .write_json(OutputCategory::Schema, source, &json!({}))
            .await
            .unwrap();
        let generated_path = writer
            .write_json(OutputCategory::GeneratedSchema, source, &json!({}))
            .await
            .unwrap();

        let schemas_dir = dir.path().join("information_extraction").join("schemas");
        assert!(schema_path.starts_with(&schemas_dir));
        assert!(generated_path.starts_with(&schemas_dir));
        assert!(schema_path.to_string_lossy().ends_with("_schema.json"));
        assert!(generated_path.to_string_lossy().ends_with("_generated_schema.json"));
    }

    #[tokio::test]
    async fn test_same_second_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path());
        let source = Path::new("doc.pdf");

        let first = writer
            .write_json(OutputCategory::InformationExtraction, source, &json!({"v": 1}))
            .await
            .unwrap();
        let second = writer
            .write_json(OutputCategory::InformationExtraction, source, &json!({"v": 2}))
            .await
            .unwrap();

        if first == second {
            let text = std::fs::read_to_string(&second).unwrap();
            let parsed: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(parsed["v"], 2);
        }
    }
}
