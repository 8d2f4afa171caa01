//! The `classify_document` tool.
//!
//! Classifies a document into one of a set of categories. A custom
//! classification schema can be supplied inline or as a file; otherwise the
//! built-in 13-category default applies. The persisted record keeps the full
//! raw API response for audit, while the returned text carries only the
//! label and save metadata.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::client::{Endpoint, chat_completion_body, file_to_data_uri, message_content};
use crate::error::{Result, UpstageError};
use crate::output::OutputCategory;
use crate::progress::ProgressReporter;
use crate::schema::{templates, validate_schema_shape};
use crate::validation::{FilePurpose, validate_file};

use super::ToolRegistry;

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyDocumentParams {
    pub file_path: String,
    #[serde(default)]
    pub schema_path: Option<String>,
    #[serde(default)]
    pub schema_json: Option<String>,
}

pub(crate) async fn run(
    ctx: &ToolRegistry,
    params: ClassifyDocumentParams,
    progress: &ProgressReporter,
) -> Result<String> {
    let path = Path::new(&params.file_path);

    progress.report(0);
    validate_file(path, FilePurpose::Extraction)?;
    progress.report(10);

    let (response_format, schema_source) = resolve_schema(&params).await?;
    progress.report(40);

    let data_uri = file_to_data_uri(path).await?;
    progress.report(50);

    let body = chat_completion_body(
        Endpoint::DocumentClassify.model(),
        &data_uri,
        Some(response_format),
    );
    let response = ctx.client.post_json(Endpoint::DocumentClassify, &body).await?;
    progress.report(80);

    let content = message_content(&response)?;
    let classification = parse_label(content);

    let record = json!({
        "source_file": params.file_path,
        "schema_source": schema_source,
        "classified_at": chrono::Local::now().to_rfc3339(),
        "classification": classification,
        "response": response,
    });
    let saved = ctx
        .writer
        .write_json(OutputCategory::DocumentClassification, path, &record)
        .await?;
    progress.report(90);

    info!(file = %path.display(), classification, "document classified");

    let result = json!({
        "classification": classification,
        "result_saved_to": saved.display().to_string(),
    });
    let text = serde_json::to_string_pretty(&result)?;
    progress.report(100);
    Ok(text)
}

async fn resolve_schema(params: &ClassifyDocumentParams) -> Result<(Value, &'static str)> {
    if let Some(text) = &params.schema_json {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| UpstageError::schema(format!("malformed JSON in schema_json: {}", err)))?;
        validate_schema_shape(&value)?;
        return Ok((value, "inline"));
    }

    if let Some(schema_path) = &params.schema_path {
        let text = tokio::fs::read_to_string(schema_path).await?;
        let value: Value = serde_json::from_str(&text).map_err(|err| {
            UpstageError::schema(format!("malformed JSON in schema file {}: {}", schema_path, err))
        })?;
        validate_schema_shape(&value)?;
        return Ok((value, "file"));
    }

    Ok((
        templates::default_classification().to_response_format(),
        "default",
    ))
}

/// The endpoint usually answers with a JSON object like
/// `{"category": "invoice"}`, but older responses carry the bare label; both
/// forms resolve to the label string.
fn parse_label(content: &str) -> String {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => map
            .get("category")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| content.trim().to_string()),
        Ok(Value::String(label)) => label,
        _ => content.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_from_category_object() {
        assert_eq!(parse_label(r#"{"category": "invoice"}"#), "invoice");
    }

    #[test]
    fn test_parse_label_from_json_string() {
        assert_eq!(parse_label(r#""receipt""#), "receipt");
    }

    #[test]
    fn test_parse_label_from_bare_text() {
        assert_eq!(parse_label("contract\n"), "contract");
    }

    #[test]
    fn test_parse_label_object_without_category_falls_back() {
        assert_eq!(parse_label(r#"{"label": "cv"}"#), r#"{"label": "cv"}"#);
    }

    #[tokio::test]
    async fn test_default_schema_used_when_none_supplied() {
        let params: ClassifyDocumentParams =
            serde_json::from_value(json!({"file_path": "/tmp/a.pdf"})).unwrap();
        let (format, source) = resolve_schema(&params).await.unwrap();
        assert_eq!(source, "default");
        let one_of = format["json_schema"]["schema"]["properties"]["category"]["oneOf"]
            .as_array()
            .unwrap();
        assert_eq!(one_of.len(), 13);
    }

    #[tokio::test]
    async fn test_inline_schema_beats_file() {
        let inline = templates::default_classification().to_response_format();
        let params = ClassifyDocumentParams {
            file_path: "/tmp/a.pdf".to_string(),
            schema_path: Some("/nonexistent/schema.json".to_string()),
            schema_json: Some(inline.to_string()),
        };
        let (format, source) = resolve_schema(&params).await.unwrap();
        assert_eq!(source, "inline");
        assert_eq!(format, inline);
    }

    #[tokio::test]
    async fn test_malformed_inline_schema_is_a_schema_error() {
        let params = ClassifyDocumentParams {
            file_path: "/tmp/a.pdf".to_string(),
            schema_path: None,
            schema_json: Some("{broken".to_string()),
        };
        let err = resolve_schema(&params).await.unwrap_err();
        assert!(matches!(err, UpstageError::Schema { .. }));
    }
}
