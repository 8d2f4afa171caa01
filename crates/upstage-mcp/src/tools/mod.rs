//! MCP tool surface.
//!
//! Four tools are exposed: `parse_document`, `extract_information`,
//! `generate_schema`, and `classify_document`. [`ToolRegistry`] owns the
//! shared API client and output writer and routes a tool name plus raw JSON
//! arguments to the matching handler. Handler failures of any kind are
//! rendered as an error-flagged [`ToolOutput`] rather than escaping to the
//! transport, so a caller can keep issuing tool calls after a failure.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::warn;

use crate::client::ApiClient;
use crate::config::ServerConfig;
use crate::error::{Result, UpstageError};
use crate::output::OutputWriter;
use crate::progress::ProgressReporter;

pub mod classify;
pub mod extract;
pub mod generate_schema;
pub mod parse;

/// Names of the exposed tools, in listing order.
pub const TOOL_NAMES: [&str; 4] = [
    "parse_document",
    "extract_information",
    "generate_schema",
    "classify_document",
];

/// Result of a tool call as handed back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Render as an MCP `tools/call` result. `isError` is only present on
    /// failures.
    pub fn into_call_result(self) -> Value {
        let mut result = json!({
            "content": [{ "type": "text", "text": self.text }]
        });
        if self.is_error {
            result["isError"] = json!(true);
        }
        result
    }
}

/// Static tool descriptors for `tools/list`.
pub fn descriptors() -> Vec<Value> {
    vec![
        json!({
            "name": "parse_document",
            "description": "Parse a document with Upstage document digitization (OCR forced). \
                            Returns the parsed content and saves the full result to disk.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to the document to parse"
                    },
                    "output_formats": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Optional output formats to request, e.g. [\"html\", \"markdown\", \"text\"]"
                    }
                },
                "required": ["file_path"]
            }
        }),
        json!({
            "name": "extract_information",
            "description": "Extract structured information from a document. Supply a schema as \
                            JSON text or a file path, or let one be generated automatically.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to the document to extract from"
                    },
                    "schema_path": {
                        "type": "string",
                        "description": "Path to a JSON file holding the extraction schema"
                    },
                    "schema_json": {
                        "type": "string",
                        "description": "Extraction schema as a JSON string; takes precedence over schema_path"
                    },
                    "auto_generate_schema": {
                        "type": "boolean",
                        "description": "Generate a schema automatically when none is supplied (default true)",
                        "default": true
                    }
                },
                "required": ["file_path"]
            }
        }),
        json!({
            "name": "generate_schema",
            "description": "Analyze a document and generate an extraction schema for it, \
                            reusable with extract_information.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to the document to analyze"
                    }
                },
                "required": ["file_path"]
            }
        }),
        json!({
            "name": "classify_document",
            "description": "Classify a document into one of a set of categories. Uses a built-in \
                            13-category default unless a custom classification schema is supplied.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to the document to classify"
                    },
                    "schema_path": {
                        "type": "string",
                        "description": "Path to a JSON file holding a classification schema"
                    },
                    "schema_json": {
                        "type": "string",
                        "description": "Classification schema as a JSON string; takes precedence over schema_path"
                    }
                },
                "required": ["file_path"]
            }
        }),
    ]
}

/// Routes tool calls to their handlers.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) client: ApiClient,
    pub(crate) writer: OutputWriter,
}

impl ToolRegistry {
    pub fn new(config: Arc<ServerConfig>) -> Result<Self> {
        let client = ApiClient::new(Arc::clone(&config))?;
        let writer = OutputWriter::new(config.output_dir.clone());
        Ok(Self {
            config,
            client,
            writer,
        })
    }

    /// Call a tool by name. Never fails: every handler error is folded into
    /// an error-flagged output.
    pub async fn call(
        &self,
        name: &str,
        arguments: Value,
        progress: &ProgressReporter,
    ) -> ToolOutput {
        match self.dispatch_tool(name, arguments, progress).await {
            Ok(text) => ToolOutput::success(text),
            Err(err) => {
                warn!(tool = name, error = %err, "tool call failed");
                ToolOutput::error(format!("Error: {}", err))
            }
        }
    }

    async fn dispatch_tool(
        &self,
        name: &str,
        arguments: Value,
        progress: &ProgressReporter,
    ) -> Result<String> {
        match name {
            "parse_document" => {
                parse::run(self, serde_json::from_value(arguments)?, progress).await
            }
            "extract_information" => {
                extract::run(self, serde_json::from_value(arguments)?, progress).await
            }
            "generate_schema" => {
                generate_schema::run(self, serde_json::from_value(arguments)?, progress).await
            }
            "classify_document" => {
                classify::run(self, serde_json::from_value(arguments)?, progress).await
            }
            other => Err(UpstageError::config(format!("unknown tool '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_registry() -> ToolRegistry {
        let config = ServerConfig::new("test-key").with_output_dir("/tmp/upstage-mcp-tests");
        ToolRegistry::new(Arc::new(config)).unwrap()
    }

    #[test]
    fn test_descriptor_names_match_tool_names() {
        let names: Vec<String> = descriptors()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, TOOL_NAMES);
    }

    #[test]
    fn test_descriptors_declare_input_schemas() {
        for descriptor in descriptors() {
            let schema = &descriptor["inputSchema"];
            assert_eq!(schema["type"], "object");
            assert_eq!(schema["required"][0], "file_path");
            assert!(!descriptor["description"].as_str().unwrap().is_empty());
        }
    }

    #[test]
    fn test_tool_output_call_result_success_omits_is_error() {
        let result = ToolOutput::success("done").into_call_result();
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "done");
        assert!(result.get("isError").is_none());
    }

    #[test]
    fn test_tool_output_call_result_error_sets_flag() {
        let result = ToolOutput::error("Error: boom").into_call_result();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Error: boom");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error_output() {
        let registry = test_registry();
        let output = registry
            .call("does_not_exist", json!({}), &ProgressReporter::disabled())
            .await;
        assert!(output.is_error);
        assert!(output.text.contains("unknown tool"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_an_error_output() {
        let registry = test_registry();
        let output = registry
            .call("parse_document", json!({}), &ProgressReporter::disabled())
            .await;
        assert!(output.is_error);
        assert!(output.text.contains("file_path"));
    }

    #[tokio::test]
    async fn test_validation_failure_is_an_error_output() {
        let registry = test_registry();
        let output = registry
            .call(
                "parse_document",
                json!({"file_path": "/nonexistent/file.pdf"}),
                &ProgressReporter::disabled(),
            )
            .await;
        assert!(output.is_error);
        assert!(output.text.starts_with("Error: "));
        assert!(output.text.contains("File not found"));
    }
}
