//! Transport-agnostic request dispatch.
//!
//! Both transports hand raw JSON values to [`Dispatcher::dispatch_value`]
//! and write back whatever it returns, so `tools/list` and `tools/call`
//! behave identically over stdio and HTTP by construction.
//!
//! Error boundaries: an envelope that is not a valid JSON-RPC request yields
//! −32600, an unknown method −32601, malformed `tools/call` parameters
//! −32602. Tool handler failures are NOT protocol errors: they come back as
//! ordinary `tools/call` results with `isError: true`, leaving the session
//! usable.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::progress::ProgressReporter;
use crate::tools::{self, ToolRegistry};

use super::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION, RequestId, SERVER_NAME,
    methods,
};

/// Routes JSON-RPC requests to the tool registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: ToolRegistry,
}

impl Dispatcher {
    pub fn new(config: Arc<ServerConfig>) -> Result<Self> {
        Ok(Self {
            registry: ToolRegistry::new(config)?,
        })
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Validate a raw envelope and dispatch it. Returns `None` when the
    /// request is a notification and no response must be sent.
    pub async fn dispatch_value(&self, raw: Value) -> Option<JsonRpcResponse> {
        let id = raw.get("id").and_then(RequestId::from_value);

        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(err) => {
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!("malformed JSON-RPC envelope: {}", err)),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request(format!(
                    "unsupported jsonrpc version '{}', expected \"2.0\"",
                    request.jsonrpc
                )),
            ));
        }

        self.dispatch(request).await
    }

    /// Dispatch a validated request.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "dispatching request");
        let id = request.id.clone();

        let outcome = match request.method.as_str() {
            methods::INITIALIZE => Ok(initialize_result()),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => Ok(json!({ "tools": tools::descriptors() })),
            methods::TOOLS_CALL => self.handle_tools_call(request.params).await,
            method if method.starts_with("notifications/") => return None,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        // Notifications get no response, whatever the outcome was.
        id.as_ref()?;

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    async fn handle_tools_call(
        &self,
        params: Option<Value>,
    ) -> std::result::Result<Value, JsonRpcError> {
        let params =
            params.ok_or_else(|| JsonRpcError::invalid_params("tools/call requires parameters"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("tools/call parameters missing 'name'"))?
            .to_string();

        if !tools::TOOL_NAMES.contains(&name.as_str()) {
            return Err(JsonRpcError::invalid_params(format!("Unknown tool: {}", name)));
        }

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let output = self
            .registry
            .call(&name, arguments, &ProgressReporter::disabled())
            .await;
        Ok(output.into_call_result())
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dispatcher() -> Dispatcher {
        let config = ServerConfig::new("test-key").with_output_dir("/tmp/upstage-mcp-tests");
        Dispatcher::new(Arc::new(config)).unwrap()
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> Value {
        let mut value = json!({"jsonrpc": "2.0", "id": id, "method": method});
        if let Some(params) = params {
            value["params"] = params;
        }
        value
    }

    #[tokio::test]
    async fn test_initialize() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .dispatch_value(request(1, "initialize", None))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "upstage-mcp");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_ping_returns_empty_result() {
        let dispatcher = test_dispatcher();
        let response = dispatcher.dispatch_value(request(2, "ping", None)).await.unwrap();
        assert_eq!(response.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_tools_list_has_four_descriptors() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .dispatch_value(request(3, "tools/list", None))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 4);
        assert_eq!(tools[0]["name"], "parse_document");
    }

    #[tokio::test]
    async fn test_unknown_method_is_method_not_found() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .dispatch_value(request(4, "nonexistent/thing", None))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert!(error.message.contains("nonexistent/thing"));
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_invalid_request() {
        let dispatcher = test_dispatcher();
        let response = dispatcher.dispatch_value(json!({"foo": 1})).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version_is_invalid_request() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .dispatch_value(json!({"jsonrpc": "1.0", "id": 1, "method": "ping"}))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32600);
        assert!(error.message.contains("1.0"));
    }

    #[tokio::test]
    async fn test_invalid_request_echoes_id() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .dispatch_value(json!({"id": 9, "method": 42}))
            .await
            .unwrap();
        assert_eq!(response.id, Some(RequestId::Number(9)));
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[tokio::test]
    async fn test_notification_produces_no_response() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .dispatch_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        assert!(response.is_none());

        let ping = dispatcher
            .dispatch_value(json!({"jsonrpc": "2.0", "method": "ping"}))
            .await;
        assert!(ping.is_none());
    }

    #[tokio::test]
    async fn test_tools_call_without_params_is_invalid_params() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .dispatch_value(request(5, "tools/call", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool_is_invalid_params() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .dispatch_value(request(6, "tools/call", Some(json!({"name": "bogus_tool"}))))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("bogus_tool"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_an_error_result_not_a_protocol_error() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .dispatch_value(request(
                7,
                "tools/call",
                Some(json!({
                    "name": "parse_document",
                    "arguments": {"file_path": "/nonexistent/file.pdf"}
                })),
            ))
            .await
            .unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_string_ids_are_echoed() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .dispatch_value(json!({"jsonrpc": "2.0", "id": "req-1", "method": "ping"}))
            .await
            .unwrap();
        assert_eq!(response.id, Some(RequestId::String("req-1".to_string())));
    }
}
