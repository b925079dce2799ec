//! JSON-RPC 2.0 wire types shared by the stdio and SSE transports.
//!
//! Reference: <https://spec.modelcontextprotocol.io/>

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use toolhub_core::{ClientError, Tool, ToolCallResult};

/// Protocol revision sent in the initialize handshake.
pub(crate) const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub(crate) fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcResponse {
    #[allow(dead_code)] // required by serde deserialization
    pub jsonrpc: String,
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(rename = "data")]
    pub _data: Option<Value>,
}

/// Result of the MCP initialize request.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    #[allow(dead_code)]
    pub protocol_version: String,
    #[serde(rename = "serverInfo", default)]
    pub server_info: Option<ServerInfo>,
    #[serde(default)]
    pub capabilities: ServerCapabilities,
}

/// Server information from initialize.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerInfo {
    pub name: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub version: Option<String>,
}

/// Server capabilities advertised during initialize.
#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct ServerCapabilities {
    #[serde(default)]
    pub tools: Option<Value>,
    #[serde(default)]
    #[allow(dead_code)]
    pub resources: Option<Value>,
    #[serde(default)]
    #[allow(dead_code)]
    pub prompts: Option<Value>,
}

/// Tool entry from tools/list.
#[derive(Debug, Deserialize)]
struct WireTool {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "inputSchema")]
    input_schema: Option<Value>,
}

/// Parameters for the initialize request.
pub(crate) fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "clientInfo": {
            "name": "toolhub",
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {}
    })
}

/// One-line notification body (no id, no response expected).
pub(crate) fn notification(method: &str, params: Option<Value>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params.unwrap_or_else(|| json!({}))
    })
}

/// Turn a JSON-RPC response into its result value or an error.
pub(crate) fn unwrap_response(response: JsonRpcResponse) -> Result<Value, ClientError> {
    if let Some(err) = response.error {
        return Err(ClientError::Rpc {
            code: err.code,
            message: err.message,
        });
    }

    response
        .result
        .ok_or_else(|| ClientError::Protocol("Missing result in response".to_string()))
}

/// Parse a tools/list result value into domain tools.
pub(crate) fn tools_from_result(result: &Value) -> Result<Vec<Tool>, ClientError> {
    let tools_value = result.get("tools").cloned().unwrap_or_else(|| json!([]));
    let wire_tools: Vec<WireTool> = serde_json::from_value(tools_value)?;

    Ok(wire_tools
        .into_iter()
        .map(|t| Tool {
            name: t.name,
            description: t.description,
            input_schema: t.input_schema,
        })
        .collect())
}

/// Parse a tools/call result value into the tagged call outcome.
///
/// `isError: true` is the remote server reporting an application-level
/// failure; it is carried in the result rather than mapped to a
/// transport error.
pub(crate) fn call_result_from_result(result: &Value) -> ToolCallResult {
    let content = result
        .get("content")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    ToolCallResult { content, is_error }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = JsonRpcRequest::new(1, "tools/list", None);

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"tools/list\""));
        assert!(!json.contains("params")); // Should be omitted when None
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#;
        let response: JsonRpcResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.id, Some(1));
        assert!(response.result.is_some());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_error_parsing() {
        let json =
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"Invalid Request"}}"#;
        let response: JsonRpcResponse = serde_json::from_str(json).unwrap();
        let err = unwrap_response(response).unwrap_err();
        assert!(matches!(err, ClientError::Rpc { code: -32600, .. }));
    }

    #[test]
    fn test_tools_from_result() {
        let result = json!({
            "tools": [
                {"name": "read_file", "description": "Read a file", "inputSchema": {"type": "object"}},
                {"name": "write_file"}
            ]
        });

        let tools = tools_from_result(&result).unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "read_file");
        assert_eq!(tools[0].description.as_deref(), Some("Read a file"));
        assert!(tools[1].description.is_none());
    }

    #[test]
    fn test_call_result_carries_remote_error_flag() {
        let result = json!({
            "content": [{"type": "text", "text": "file not found"}],
            "isError": true
        });

        let outcome = call_result_from_result(&result);
        assert!(outcome.is_error);
        assert_eq!(outcome.first_text(), Some("file not found"));
    }

    #[test]
    fn test_call_result_defaults() {
        let outcome = call_result_from_result(&json!({}));
        assert!(!outcome.is_error);
        assert!(outcome.content.is_empty());
    }
}
