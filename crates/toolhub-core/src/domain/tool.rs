//! Tool and tool-call types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Tool definition discovered from a tool server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (unique within a server).
    pub name: String,

    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for input parameters. Opaque to the hub; only the
    /// remote server validates arguments against it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl Tool {
    /// Create a new tool definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Request to invoke one tool on one server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Target server identifier.
    pub server_id: String,

    /// Name of the tool to invoke.
    pub tool: String,

    /// Tool arguments (string keys, arbitrary JSON values).
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

impl ToolCallRequest {
    /// Create a new tool call request with no arguments.
    pub fn new(server_id: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            tool: tool.into(),
            arguments: HashMap::new(),
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(key.into(), value);
        self
    }
}

/// Application-level outcome of a tool call.
///
/// `is_error = true` means the remote server itself reported a failure
/// for this call. Transport and infrastructure failures surface as a
/// failed `Result` from the client adapter instead, keeping the two
/// failure modes visible to every caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Ordered content blocks returned by the server (text, images, etc.).
    pub content: Vec<Value>,

    /// Whether the remote tool reported an application-level failure.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Create a successful result.
    #[must_use]
    pub const fn success(content: Vec<Value>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// Create a tool-reported error result with a single text block.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": message.into() })],
            is_error: true,
        }
    }

    /// Text of the first text content block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .find_map(|block| block.get("text").and_then(Value::as_str))
    }
}
