//! MCP Types - JSON-RPC 2.0 envelopes used on the stdio side of the bridge
//!
//! The bridge speaks newline-delimited JSON-RPC directly instead of going through
//! a full MCP SDK, so the wire types are kept small and explicit here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol version reported when the client does not send one
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub const JSONRPC_VERSION: &str = "2.0";

/// A request read from one input line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Params as an object, or an empty map when absent or not an object
    pub fn params(&self) -> Map<String, Value> {
        match &self.params {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    pub fn kind(&self) -> Method {
        Method::from(self.method.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(error::codes::PARSE_ERROR, "Parse error").with_data(Value::String(detail.into()))
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(error::codes::INVALID_REQUEST, "Invalid Request")
            .with_data(Value::String(detail.into()))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            error::codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(error::codes::INTERNAL_ERROR, message)
    }
}

/// Tool metadata as listed by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// The closed set of methods the bridge knows how to answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Ping,
    PromptsList,
    ResourcesList,
    ToolsList,
    ToolsCall,
    /// Any method whose name contains "notification"; never answered
    Notification(String),
    Unknown(String),
}

impl Method {
    pub fn expects_response(&self) -> bool {
        !matches!(self, Method::Notification(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Initialize => "initialize",
            Method::Ping => "ping",
            Method::PromptsList => "prompts/list",
            Method::ResourcesList => "resources/list",
            Method::ToolsList => "tools/list",
            Method::ToolsCall => "tools/call",
            Method::Notification(name) | Method::Unknown(name) => name.as_str(),
        }
    }
}

impl From<&str> for Method {
    fn from(name: &str) -> Self {
        match name {
            "initialize" => Method::Initialize,
            "ping" => Method::Ping,
            "prompts/list" => Method::PromptsList,
            "resources/list" => Method::ResourcesList,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            other if other.contains("notification") => Method::Notification(other.to_string()),
            other => Method::Unknown(other.to_string()),
        }
    }
}

// Error handling utilities
pub mod error {
    /// JSON-RPC error codes emitted by the bridge
    pub mod codes {
        pub const PARSE_ERROR: i32 = -32700;
        pub const INVALID_REQUEST: i32 = -32600;
        pub const METHOD_NOT_FOUND: i32 = -32601;
        pub const INVALID_PARAMS: i32 = -32602;
        pub const INTERNAL_ERROR: i32 = -32603;
    }
}
