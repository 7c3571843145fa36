//! Line-oriented JSON-RPC over STDIO
//!
//! Reads one request per line, answers it through the dispatcher and writes
//! the response as a single flushed line before reading the next request.

use crate::config::BridgeConfig;
use crate::dispatcher::MethodDispatcher;
use crate::error::{ProxyError, Result};
use futures::FutureExt;
use mcp_types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

pub struct StdioProxy {
    dispatcher: MethodDispatcher,
}

impl StdioProxy {
    pub fn new(config: Arc<BridgeConfig>) -> Result<Self> {
        Ok(Self::with_dispatcher(MethodDispatcher::new(config)?))
    }

    pub fn with_dispatcher(dispatcher: MethodDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Serve stdin/stdout until end of input
    pub async fn start(&self) -> Result<()> {
        info!(
            "Starting STDIO bridge for server: {}",
            self.dispatcher.config().server_url
        );
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.run(reader, writer).await
    }

    /// Request/response loop over any line source and sink
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let bytes_read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| ProxyError::Transport(format!("Failed to read from stdin: {}", e)))?;

            if bytes_read == 0 {
                info!("End of input - shutting down bridge");
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            if let Some(response) = self.handle_line(&line).await {
                write_response(&mut writer, &response).await?;
            }
        }

        info!("STDIO bridge stopped");
        Ok(())
    }

    /// Answer one raw input line; `None` when nothing must be written
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Received request: {}", line);

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse JSON-RPC request: {} - Input: {}", e, line);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
                ));
            }
        };

        if !value.is_object() {
            warn!("JSON-RPC request is not an object: {}", line);
            return Some(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::invalid_request("Request must be a JSON object"),
            ));
        }

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                warn!("Malformed JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(e.to_string()),
                ));
            }
        };

        let expects_response = request.kind().expects_response();
        match AssertUnwindSafe(self.dispatcher.dispatch(&request))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(_) => {
                error!("Handler for {} panicked", request.method);
                expects_response.then(|| {
                    JsonRpcResponse::failure(
                        request.id.clone(),
                        JsonRpcError::internal(format!(
                            "Internal error while handling {}",
                            request.method
                        )),
                    )
                })
            }
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<()> {
    let response_str = serde_json::to_string(response)?;
    debug!("Sending response: {}", response_str);

    writer
        .write_all(response_str.as_bytes())
        .await
        .map_err(|e| ProxyError::Transport(format!("Failed to write to stdout: {}", e)))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| ProxyError::Transport(format!("Failed to write newline: {}", e)))?;
    writer
        .flush()
        .await
        .map_err(|e| ProxyError::Transport(format!("Failed to flush stdout: {}", e)))?;
    Ok(())
}
