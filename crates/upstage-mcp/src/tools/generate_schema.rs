//! The `generate_schema` tool.
//!
//! Sends the document to the schema-generation endpoint and turns the
//! model's answer into a reusable `response_format` document. The endpoint
//! answers in chat-completion shape with `choices[0].message.content`
//! holding a JSON string; that string must contain a `json_schema` key.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::client::{Endpoint, chat_completion_body, file_to_data_uri, message_content};
use crate::error::{Result, UpstageError};
use crate::output::OutputCategory;
use crate::progress::ProgressReporter;
use crate::validation::{FilePurpose, validate_file};

use super::ToolRegistry;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSchemaParams {
    pub file_path: String,
}

pub(crate) async fn run(
    ctx: &ToolRegistry,
    params: GenerateSchemaParams,
    progress: &ProgressReporter,
) -> Result<String> {
    let path = Path::new(&params.file_path);

    progress.report(0);
    validate_file(path, FilePurpose::Extraction)?;
    progress.report(10);

    let data_uri = file_to_data_uri(path).await?;
    progress.report(30);

    let response_format = request_schema_from_uri(ctx, &data_uri).await?;
    progress.report(80);

    let record = json!({
        "source_file": params.file_path,
        "generated_at": chrono::Local::now().to_rfc3339(),
        "schema": response_format,
    });
    let saved = ctx
        .writer
        .write_json(OutputCategory::GeneratedSchema, path, &record)
        .await?;
    progress.report(90);

    info!(file = %path.display(), "schema generated");

    let text = format!(
        "Schema generated successfully.\n\nSchema saved to: {}\n\nGenerated schema:\n{}\n\n\
         To reuse it, pass this string as the schema_json argument of extract_information:\n{}",
        saved.display(),
        serde_json::to_string_pretty(&response_format)?,
        serde_json::to_string(&response_format)?
    );
    progress.report(100);
    Ok(text)
}

/// Generate a `response_format` schema for a document.
///
/// Shared with `extract_information`'s auto-generation path.
pub(crate) async fn request_schema(ctx: &ToolRegistry, path: &Path) -> Result<Value> {
    let data_uri = file_to_data_uri(path).await?;
    request_schema_from_uri(ctx, &data_uri).await
}

async fn request_schema_from_uri(ctx: &ToolRegistry, data_uri: &str) -> Result<Value> {
    let body = chat_completion_body(Endpoint::SchemaGeneration.model(), data_uri, None);
    let response = ctx.client.post_json(Endpoint::SchemaGeneration, &body).await?;

    let content = message_content(&response)?;
    let parsed: Value = serde_json::from_str(content).map_err(|err| {
        UpstageError::invalid_response(format!(
            "schema generation content is not valid JSON: {}",
            err
        ))
    })?;

    let json_schema = parsed
        .get("json_schema")
        .ok_or_else(|| UpstageError::schema("schema generation response has no 'json_schema' key"))?;

    Ok(json!({
        "type": "json_schema",
        "json_schema": json_schema.clone(),
    }))
}
