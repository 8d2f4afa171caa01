//! JSON-RPC 2.0 message types for the Model Context Protocol.
//!
//! Both transports deserialize incoming bytes into these envelopes and
//! serialize the dispatcher's answers back out. Requests without an `id` are
//! notifications and never produce a response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported MCP protocol version.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name advertised during initialization.
pub const SERVER_NAME: &str = "upstage-mcp";

/// MCP method names.
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const PING: &str = "ping";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// JSON-RPC request identifier: a string or a number, echoed verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl RequestId {
    /// Pull an id out of a raw envelope, if one is present and well-typed.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(RequestId::String(s.clone())),
            Value::Number(n) => n.as_i64().map(RequestId::Number),
            _ => None,
        }
    }
}

/// JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version; must be "2.0".
    pub jsonrpc: String,
    /// Request identifier. Absent for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    /// Method name.
    pub method: String,
    /// Optional parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response message.
///
/// `id` is serialized even when absent (as `null`), which is what JSON-RPC
/// 2.0 prescribes for errors raised before an id could be read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Parse error (-32700): the bytes were not valid JSON.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
            data: None,
        }
    }

    /// Invalid request (-32600): valid JSON, not a valid envelope.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method.into()),
            data: None,
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: None,
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_untagged_serde() {
        let string_id: RequestId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(string_id, RequestId::String("abc".to_string()));
        let number_id: RequestId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(number_id, RequestId::Number(7));

        assert_eq!(serde_json::to_value(&string_id).unwrap(), json!("abc"));
        assert_eq!(serde_json::to_value(&number_id).unwrap(), json!(7));
    }

    #[test]
    fn test_request_id_from_value_rejects_other_types() {
        assert!(RequestId::from_value(&json!(null)).is_none());
        assert!(RequestId::from_value(&json!([1])).is_none());
        assert!(RequestId::from_value(&json!(1.5)).is_none());
    }

    #[test]
    fn test_request_without_id_is_a_notification() {
        let request: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "ping"})).unwrap();
        assert!(request.id.is_none());
        assert_eq!(request.method, "ping");
    }

    #[test]
    fn test_request_missing_method_fails_to_parse() {
        let result =
            serde_json::from_value::<JsonRpcRequest>(json!({"jsonrpc": "2.0", "id": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_success_response_omits_error_field() {
        let response = JsonRpcResponse::success(Some(RequestId::Number(1)), json!({"ok": true}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 1);
        assert_eq!(value["result"]["ok"], true);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_response_without_id_serializes_null_id() {
        let response = JsonRpcResponse::error(None, JsonRpcError::parse_error("bad json"));
        let value = serde_json::to_value(&response).unwrap();
        assert!(value["id"].is_null());
        assert_eq!(value["error"]["code"], -32700);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_error_constructors_use_standard_codes() {
        assert_eq!(JsonRpcError::parse_error("x").code, -32700);
        assert_eq!(JsonRpcError::invalid_request("x").code, -32600);
        assert_eq!(JsonRpcError::method_not_found("x").code, -32601);
        assert_eq!(JsonRpcError::invalid_params("x").code, -32602);
        assert_eq!(JsonRpcError::internal_error("x").code, -32603);
    }

    #[test]
    fn test_method_not_found_names_the_method() {
        let error = JsonRpcError::method_not_found("nonexistent/thing");
        assert!(error.message.contains("nonexistent/thing"));
    }
}
