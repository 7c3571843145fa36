use mcp_client::ClientError;
use mcp_types::{error::codes, JsonRpcError};
use serde_json::{json, Value};
use thiserror::Error;

/// Message shown to the client when the remote server rejects the credential
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed. Check your API key configuration.";

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Remote error: {message}")]
    Remote {
        code: Option<i64>,
        message: String,
        data: Option<Value>,
    },

    #[error("Failed to fetch remote tools: {0}")]
    ToolsFetch(Box<ProxyError>),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ProxyError {
    /// Render as the JSON-RPC error sent back to the client
    pub fn to_rpc_error(&self) -> JsonRpcError {
        match self {
            ProxyError::MethodNotFound(method) => JsonRpcError::method_not_found(method),
            ProxyError::InvalidParams(detail) => {
                JsonRpcError::new(codes::INVALID_PARAMS, format!("Invalid params: {}", detail))
            }
            ProxyError::Client(err) => client_error_to_rpc(err),
            ProxyError::Remote { code, data, .. } => {
                JsonRpcError::internal(self.to_string()).with_data(json!({
                    "code": code,
                    "data": data,
                }))
            }
            ProxyError::ToolsFetch(inner) => {
                let mut error = inner.to_rpc_error();
                error.code = codes::INTERNAL_ERROR;
                error.message = format!("Failed to fetch remote tools: {}", error.message);
                error
            }
            other => JsonRpcError::internal(other.to_string()),
        }
    }
}

fn client_error_to_rpc(err: &ClientError) -> JsonRpcError {
    let error = match err.status() {
        Some(403) => JsonRpcError::internal(AUTH_FAILED_MESSAGE),
        _ => JsonRpcError::internal(err.to_string()),
    };

    match err.body() {
        Some(body) => error.with_data(Value::String(body.to_string())),
        None => error,
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
