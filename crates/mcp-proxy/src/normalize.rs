//! Pull the payload out of whatever shape the remote server answered with
//!
//! Some servers wrap their answer in a JSON-RPC envelope (`{"result": ...}`),
//! others return the bare result object.

use crate::error::{ProxyError, Result};
use serde_json::Value;

/// Logical result of a remote body: `result` if present, otherwise the body itself
pub fn normalize_result(body: Value) -> Result<Value> {
    match body {
        Value::Object(mut map) => {
            if let Some(result) = map.remove("result") {
                return Ok(result);
            }
            if let Some(error) = map.get("error").filter(|e| !e.is_null()) {
                return Err(remote_error(error));
            }
            Ok(Value::Object(map))
        }
        other => Ok(other),
    }
}

/// Tool list from a `tools/list` answer, accepting a top-level `tools` key too
pub fn normalize_tools(body: Value) -> Result<Vec<Value>> {
    if let Some(Value::Array(tools)) = body.get("tools") {
        return Ok(tools.clone());
    }

    match normalize_result(body)? {
        Value::Array(tools) => Ok(tools),
        Value::Object(mut map) => match map.remove("tools") {
            Some(Value::Array(tools)) => Ok(tools),
            _ => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    }
}

fn remote_error(error: &Value) -> ProxyError {
    match error {
        Value::Object(fields) => ProxyError::Remote {
            code: fields.get("code").and_then(Value::as_i64),
            message: fields
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
            data: fields.get("data").cloned(),
        },
        Value::String(message) => ProxyError::Remote {
            code: None,
            message: message.clone(),
            data: None,
        },
        other => ProxyError::Remote {
            code: None,
            message: other.to_string(),
            data: None,
        },
    }
}
