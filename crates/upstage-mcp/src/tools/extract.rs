//! The `extract_information` tool.
//!
//! Resolves an extraction schema with a strict precedence, then calls the
//! extraction endpoint with the schema as the `response_format`. Precedence:
//! inline `schema_json` beats `schema_path`, which beats auto-generation
//! (only when enabled); with no usable source the call fails before any
//! network request.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::client::{Endpoint, chat_completion_body, file_to_data_uri, message_content};
use crate::error::{Result, UpstageError};
use crate::output::OutputCategory;
use crate::progress::ProgressReporter;
use crate::schema::validate_schema_shape;
use crate::validation::{FilePurpose, validate_file};

use super::{ToolRegistry, generate_schema};

fn default_auto_generate() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractInformationParams {
    pub file_path: String,
    #[serde(default)]
    pub schema_path: Option<String>,
    #[serde(default)]
    pub schema_json: Option<String>,
    #[serde(default = "default_auto_generate")]
    pub auto_generate_schema: bool,
}

pub(crate) async fn run(
    ctx: &ToolRegistry,
    params: ExtractInformationParams,
    progress: &ProgressReporter,
) -> Result<String> {
    let path = Path::new(&params.file_path);

    progress.report(0);
    validate_file(path, FilePurpose::Extraction)?;
    progress.report(10);

    let (response_format, schema_source) = resolve_schema(ctx, &params, path).await?;
    progress.report(40);

    let data_uri = file_to_data_uri(path).await?;
    progress.report(50);

    let body = chat_completion_body(
        Endpoint::InformationExtract.model(),
        &data_uri,
        Some(response_format),
    );
    let response = ctx.client.post_json(Endpoint::InformationExtract, &body).await?;
    progress.report(80);

    let content = message_content(&response)?;
    let data: Value = serde_json::from_str(content).map_err(|err| {
        UpstageError::invalid_response(format!("extraction content is not valid JSON: {}", err))
    })?;

    let record = json!({
        "source_file": params.file_path,
        "schema_source": schema_source,
        "extracted_at": chrono::Local::now().to_rfc3339(),
        "data": data,
    });
    let saved = ctx
        .writer
        .write_json(OutputCategory::InformationExtraction, path, &record)
        .await?;
    progress.report(90);

    info!(file = %path.display(), schema_source, "information extracted");

    let text = format!(
        "Information extracted successfully.\n\nResult saved to: {}\n\nExtracted data:\n{}",
        saved.display(),
        serde_json::to_string_pretty(&data)?
    );
    progress.report(100);
    Ok(text)
}

/// Resolve the `response_format` to send, returning it with a label for the
/// persisted metadata.
async fn resolve_schema(
    ctx: &ToolRegistry,
    params: &ExtractInformationParams,
    path: &Path,
) -> Result<(Value, &'static str)> {
    if let Some(text) = &params.schema_json {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| UpstageError::schema(format!("malformed JSON in schema_json: {}", err)))?;
        let candidate = unwrap_schema_document(value);
        validate_schema_shape(&candidate)?;
        return Ok((candidate, "inline"));
    }

    if let Some(schema_path) = &params.schema_path {
        let text = tokio::fs::read_to_string(schema_path).await?;
        let value: Value = serde_json::from_str(&text).map_err(|err| {
            UpstageError::schema(format!("malformed JSON in schema file {}: {}", schema_path, err))
        })?;
        let candidate = unwrap_schema_document(value);
        validate_schema_shape(&candidate)?;
        return Ok((candidate, "file"));
    }

    if params.auto_generate_schema {
        let schema = generate_schema::request_schema(ctx, path).await?;
        let record = json!({
            "source_file": path.display().to_string(),
            "generated_at": chrono::Local::now().to_rfc3339(),
            "schema": schema,
        });
        let saved = ctx
            .writer
            .write_json(OutputCategory::Schema, path, &record)
            .await?;
        debug!(path = %saved.display(), "auto-generated schema saved");
        return Ok((schema, "auto_generated"));
    }

    Err(UpstageError::NoSchema)
}

/// Accept either a bare `response_format` document or the persisted wrapper
/// that stores the schema under a `schema` key.
fn unwrap_schema_document(value: Value) -> Value {
    if value.get("type").and_then(Value::as_str) == Some("json_schema") {
        value
    } else if let Some(inner) = value.get("schema") {
        inner.clone()
    } else {
        value
    }
}
