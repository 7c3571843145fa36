//! Immutable bridge configuration, resolved once at start-up

use crate::strategy::ToolsStrategy;
use mcp_client::{select_credential, ClientConfig, DEFAULT_TIMEOUT};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Base URL of the remote server, always ending in `/`
    pub server_url: String,
    pub api_key: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout: Duration,
    pub tools_strategy: ToolsStrategy,
    pub probe_endpoints: bool,
}

impl BridgeConfig {
    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: normalize_server_url(server_url),
            api_key: None,
            headers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            tools_strategy: ToolsStrategy::default(),
            probe_endpoints: true,
        }
    }

    /// Build from an environment snapshot, keeping only the API key picked for the URL
    pub fn from_vars(server_url: &str, vars: &HashMap<String, String>) -> Self {
        let mut config = Self::new(server_url);
        config.api_key = select_credential(&config.server_url, vars);
        config
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tools_strategy(mut self, strategy: ToolsStrategy) -> Self {
        self.tools_strategy = strategy;
        self
    }

    pub fn with_endpoint_probing(mut self, enabled: bool) -> Self {
        self.probe_endpoints = enabled;
        self
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            headers: self.headers.clone(),
            api_key: self.api_key.clone(),
            timeout: self.timeout,
            ..ClientConfig::default()
        }
    }
}

pub fn normalize_server_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}
