//! Maps each JSON-RPC method to a local answer or a remote call

use crate::catalog::{generic_tools, CALL_TOOL_NAME};
use crate::config::BridgeConfig;
use crate::error::{ProxyError, Result};
use crate::normalize::{normalize_result, normalize_tools};
use crate::strategy::ToolsStrategy;
use mcp_client::{EndpointProbe, HttpTransport, RemoteTransport};
use mcp_types::{
    JsonRpcRequest, JsonRpcResponse, Method, DEFAULT_PROTOCOL_VERSION, JSONRPC_VERSION,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = "mcp-remote";

pub struct MethodDispatcher {
    config: Arc<BridgeConfig>,
    probe: EndpointProbe,
}

impl MethodDispatcher {
    pub fn new(config: Arc<BridgeConfig>) -> Result<Self> {
        let transport = HttpTransport::new(&config.client_config())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: Arc<BridgeConfig>, transport: Arc<dyn RemoteTransport>) -> Self {
        let probe = if config.probe_endpoints {
            EndpointProbe::new(transport, config.server_url.clone())
        } else {
            EndpointProbe::direct(transport, config.server_url.clone())
        };

        Self { config, probe }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Answer one request; `None` for notifications
    pub async fn dispatch(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let method = request.kind();
        if !method.expects_response() {
            debug!("Ignoring notification {}", request.method);
            return None;
        }

        let params = request.params();
        let outcome = match &method {
            Method::Initialize => Ok(self.handle_initialize(&params)),
            Method::Ping => Ok(json!({})),
            Method::PromptsList => Ok(json!({ "prompts": [] })),
            Method::ResourcesList => Ok(json!({ "resources": [] })),
            Method::ToolsList => self.handle_list_tools(request).await,
            Method::ToolsCall => self.handle_call_tool(&params).await,
            Method::Notification(_) => return None,
            Method::Unknown(name) => {
                warn!("Unknown method: {}", name);
                Err(ProxyError::MethodNotFound(name.clone()))
            }
        };

        let id = request.id.clone();
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                warn!("{} failed: {}", method.as_str(), e);
                JsonRpcResponse::failure(id, e.to_rpc_error())
            }
        })
    }

    fn handle_initialize(&self, params: &Map<String, Value>) -> Value {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        info!(
            "Initializing session (protocol {}) for {}",
            protocol_version, self.config.server_url
        );

        json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": {},
                "resources": {},
                "prompts": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    async fn handle_list_tools(&self, request: &JsonRpcRequest) -> Result<Value> {
        match self.config.tools_strategy {
            ToolsStrategy::Generic => {
                let tools = generic_tools(&self.config.server_url);
                debug!("Answering tools/list locally with {} tools", tools.len());
                Ok(json!({ "tools": tools }))
            }
            ToolsStrategy::Delegate => {
                let tools = self
                    .fetch_remote_tools(request)
                    .await
                    .map_err(|e| ProxyError::ToolsFetch(Box::new(e)))?;
                info!("Remote server listed {} tools", tools.len());
                Ok(json!({ "tools": tools }))
            }
        }
    }

    async fn fetch_remote_tools(&self, request: &JsonRpcRequest) -> Result<Vec<Value>> {
        let id = if request.id.is_null() {
            json!(1)
        } else {
            request.id.clone()
        };
        let payload = json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": id,
            "method": "tools/list",
            "params": request.params(),
        });

        let body = self.probe.call("tools/list", &payload).await?;
        normalize_tools(body)
    }

    async fn handle_call_tool(&self, params: &Map<String, Value>) -> Result<Value> {
        let payload = forward_payload(params)?;
        info!("Forwarding tools/call for '{}'", payload["tool"].as_str().unwrap_or_default());

        let body = self.probe.call("tools/call", &payload).await?;
        normalize_result(body)
    }
}

/// Body sent to the remote server for a `tools/call`.
///
/// Calls through the `call` wrapper are unwrapped one level; any other tool
/// is forwarded by name with its arguments as inputs.
pub fn forward_payload(params: &Map<String, Value>) -> Result<Value> {
    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => json!({}),
        Some(arguments) => arguments.clone(),
    };

    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ProxyError::InvalidParams("missing tool name".to_string()))?;

    if name != CALL_TOOL_NAME {
        return Ok(json!({ "tool": name, "inputs": arguments }));
    }

    let tool = arguments
        .get("tool")
        .and_then(Value::as_str)
        .ok_or_else(|| ProxyError::InvalidParams("'call' requires arguments.tool".to_string()))?;
    let inputs = match arguments.get("inputs") {
        None | Some(Value::Null) => json!({}),
        Some(inputs) => inputs.clone(),
    };

    Ok(json!({ "tool": tool, "inputs": inputs }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mcp_client::ClientError;
    use mcp_types::error::codes;
    use std::sync::Mutex;

    /// Records every outbound call and answers with a fixed body
    struct RecordingTransport {
        answer: std::result::Result<Value, u16>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingTransport {
        fn answering(body: Value) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(body),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(status),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteTransport for RecordingTransport {
        async fn post_json(&self, url: &str, payload: &Value) -> mcp_client::Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), payload.clone()));
            match &self.answer {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(ClientError::HttpStatus {
                    status: *status,
                    reason: "Error".to_string(),
                    body: None,
                }),
            }
        }
    }

    fn dispatcher(config: BridgeConfig, transport: Arc<RecordingTransport>) -> MethodDispatcher {
        MethodDispatcher::with_transport(Arc::new(config), transport)
    }

    fn request(value: Value) -> JsonRpcRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_echoes_protocol_version() {
        let transport = RecordingTransport::answering(json!({}));
        let dispatcher = dispatcher(BridgeConfig::new("https://x/"), transport.clone());

        let response = dispatcher
            .dispatch(&request(json!({
                "jsonrpc": "2.0", "id": 7, "method": "initialize",
                "params": {"protocolVersion": "2025-03-26"}
            })))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(response.id, json!(7));
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(
            result["capabilities"],
            json!({"tools": {}, "resources": {}, "prompts": {}})
        );
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_default_protocol_version() {
        let dispatcher = dispatcher(
            BridgeConfig::new("https://x/"),
            RecordingTransport::answering(json!({})),
        );
        let response = dispatcher
            .dispatch(&request(json!({"id": "a", "method": "initialize"})))
            .await
            .unwrap();
        assert_eq!(response.id, json!("a"));
        assert_eq!(response.result.unwrap()["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_static_lists_make_no_network_call() {
        let transport = RecordingTransport::answering(json!({}));
        let dispatcher = dispatcher(BridgeConfig::new("https://x/"), transport.clone());

        let prompts = dispatcher
            .dispatch(&request(json!({"id": 1, "method": "prompts/list"})))
            .await
            .unwrap();
        let resources = dispatcher
            .dispatch(&request(json!({"id": 2, "method": "resources/list"})))
            .await
            .unwrap();
        let ping = dispatcher
            .dispatch(&request(json!({"id": 3, "method": "ping"})))
            .await
            .unwrap();

        assert_eq!(prompts.result, Some(json!({"prompts": []})));
        assert_eq!(resources.result, Some(json!({"resources": []})));
        assert_eq!(ping.result, Some(json!({})));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_notifications_never_answered() {
        let transport = RecordingTransport::answering(json!({}));
        let dispatcher = dispatcher(BridgeConfig::new("https://x/"), transport.clone());

        for method in ["notifications/initialized", "notifications/cancelled", "my/notification"] {
            let with_id = request(json!({"id": 9, "method": method}));
            let without_id = request(json!({"method": method}));
            assert!(dispatcher.dispatch(&with_id).await.is_none());
            assert!(dispatcher.dispatch(&without_id).await.is_none());
        }
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let dispatcher = dispatcher(
            BridgeConfig::new("https://x/"),
            RecordingTransport::answering(json!({})),
        );
        let response = dispatcher
            .dispatch(&request(json!({"id": 4, "method": "completion/complete"})))
            .await
            .unwrap();

        let error = response.error.unwrap();
        assert_eq!(response.id, json!(4));
        assert_eq!(error.code, codes::METHOD_NOT_FOUND);
        assert!(error.message.contains("completion/complete"));
    }

    #[tokio::test]
    async fn test_call_wrapper_unwrapped_before_forwarding() {
        let transport = RecordingTransport::answering(json!({"result": {"content": []}}));
        let dispatcher = dispatcher(BridgeConfig::new("https://x/"), transport.clone());

        let response = dispatcher
            .dispatch(&request(json!({
                "id": 5, "method": "tools/call",
                "params": {"name": "call", "arguments": {"tool": "search", "inputs": {"q": "x"}}}
            })))
            .await
            .unwrap();

        assert_eq!(response.result, Some(json!({"content": []})));
        assert_eq!(
            transport.calls(),
            vec![(
                "https://x/".to_string(),
                json!({"tool": "search", "inputs": {"q": "x"}})
            )]
        );
    }

    #[tokio::test]
    async fn test_direct_tool_forwarded_by_name() {
        let transport = RecordingTransport::answering(json!({"content": [{"type": "text", "text": "ok"}]}));
        let dispatcher = dispatcher(BridgeConfig::new("https://x/"), transport.clone());

        let response = dispatcher
            .dispatch(&request(json!({
                "id": 6, "method": "tools/call",
                "params": {"name": "list_tables", "arguments": {"baseId": "app1"}}
            })))
            .await
            .unwrap();

        assert_eq!(
            response.result,
            Some(json!({"content": [{"type": "text", "text": "ok"}]}))
        );
        assert_eq!(
            transport.calls()[0].1,
            json!({"tool": "list_tables", "inputs": {"baseId": "app1"}})
        );
    }

    #[tokio::test]
    async fn test_forbidden_call_renders_auth_hint() {
        let dispatcher = dispatcher(
            BridgeConfig::new("https://x/").with_endpoint_probing(false),
            RecordingTransport::failing(403),
        );
        let response = dispatcher
            .dispatch(&request(json!({
                "id": 8, "method": "tools/call",
                "params": {"name": "search", "arguments": {}}
            })))
            .await
            .unwrap();

        let error = response.error.unwrap();
        assert_eq!(error.code, codes::INTERNAL_ERROR);
        assert_eq!(error.message, crate::error::AUTH_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_tool_name_is_invalid_params() {
        let transport = RecordingTransport::answering(json!({}));
        let dispatcher = dispatcher(BridgeConfig::new("https://x/"), transport.clone());
        let response = dispatcher
            .dispatch(&request(json!({"id": 10, "method": "tools/call", "params": {}})))
            .await
            .unwrap();

        assert_eq!(response.error.unwrap().code, codes::INVALID_PARAMS);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delegated_tools_list() {
        let transport = RecordingTransport::answering(json!({
            "jsonrpc": "2.0", "id": 11,
            "result": {"tools": [{"name": "search", "description": "s", "inputSchema": {}}]}
        }));
        let dispatcher = dispatcher(BridgeConfig::new("https://x/"), transport.clone());

        let response = dispatcher
            .dispatch(&request(json!({"id": 11, "method": "tools/list"})))
            .await
            .unwrap();

        assert_eq!(
            response.result,
            Some(json!({"tools": [{"name": "search", "description": "s", "inputSchema": {}}]}))
        );
        let (_, payload) = &transport.calls()[0];
        assert_eq!(payload["method"], "tools/list");
        assert_eq!(payload["id"], 11);
    }

    #[tokio::test]
    async fn test_delegated_tools_list_failure() {
        let dispatcher = dispatcher(
            BridgeConfig::new("https://x/"),
            RecordingTransport::failing(500),
        );
        let response = dispatcher
            .dispatch(&request(json!({"id": 12, "method": "tools/list"})))
            .await
            .unwrap();

        let error = response.error.unwrap();
        assert_eq!(error.code, codes::INTERNAL_ERROR);
        assert!(error.message.starts_with("Failed to fetch remote tools: HTTP 500"));
    }

    #[tokio::test]
    async fn test_generic_tools_list_is_local() {
        let transport = RecordingTransport::answering(json!({}));
        let dispatcher = dispatcher(
            BridgeConfig::new("https://api.airtable.com/v0/").with_tools_strategy(ToolsStrategy::Generic),
            transport.clone(),
        );

        let response = dispatcher
            .dispatch(&request(json!({"id": 13, "method": "tools/list"})))
            .await
            .unwrap();

        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 3);
        assert_eq!(tools[0]["name"], "call");
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_forward_payload_null_inputs_default_to_empty() {
        let params = json!({"name": "call", "arguments": {"tool": "ping"}});
        let payload = forward_payload(params.as_object().unwrap()).unwrap();
        assert_eq!(payload, json!({"tool": "ping", "inputs": {}}));

        let params = json!({"name": "search"});
        let payload = forward_payload(params.as_object().unwrap()).unwrap();
        assert_eq!(payload, json!({"tool": "search", "inputs": {}}));
    }
}
