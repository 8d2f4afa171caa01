//! The `parse_document` tool.
//!
//! Uploads a document to the digitization endpoint as a multipart form with
//! OCR forced and table-cell base64 output always requested, persists the
//! full raw response, and returns the response's `content` field as JSON
//! text alongside the save path.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::client::Endpoint;
use crate::error::Result;
use crate::output::OutputCategory;
use crate::progress::ProgressReporter;
use crate::validation::{FilePurpose, validate_file};

use super::ToolRegistry;

#[derive(Debug, Clone, Deserialize)]
pub struct ParseDocumentParams {
    pub file_path: String,
    #[serde(default)]
    pub output_formats: Option<Vec<String>>,
}

pub(crate) async fn run(
    ctx: &ToolRegistry,
    params: ParseDocumentParams,
    progress: &ProgressReporter,
) -> Result<String> {
    let path = Path::new(&params.file_path);

    progress.report(0);
    validate_file(path, FilePurpose::Parsing)?;
    progress.report(10);

    let mut fields = vec![
        ("model".to_string(), Endpoint::DocumentParse.model().to_string()),
        ("ocr".to_string(), "force".to_string()),
        ("base64_encoding".to_string(), "[\"table\"]".to_string()),
    ];
    if let Some(formats) = &params.output_formats {
        fields.push(("output_formats".to_string(), serde_json::to_string(formats)?));
    }
    progress.report(30);

    let response = ctx
        .client
        .post_multipart(Endpoint::DocumentParse, path, fields)
        .await?;
    progress.report(80);

    let saved = ctx
        .writer
        .write_json(OutputCategory::DocumentParsing, path, &response)
        .await?;
    progress.report(90);

    info!(file = %path.display(), "document parsed");

    let content = response.get("content").cloned().unwrap_or(Value::Null);
    let text = format!(
        "Document parsed successfully.\n\nResult saved to: {}\n\nParsed content:\n{}",
        saved.display(),
        serde_json::to_string_pretty(&content)?
    );
    progress.report(100);
    Ok(text)
}
