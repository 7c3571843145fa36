//! MCP Client - outbound HTTP side of the bridge
//!
//! Everything that talks to the remote tool server lives here: the HTTP
//! transport, endpoint probing across the known path conventions, and the
//! choice of API key for a given server URL.

pub mod credentials;
pub mod error;
pub mod probe;
pub mod transport;

pub use credentials::{credential_var, select_credential, API_KEY_HEADER};
pub use error::{ClientError, Result};
pub use probe::{candidate_url, EndpointProbe, ENDPOINT_CANDIDATES};
pub use transport::{HttpTransport, RemoteTransport};

use std::collections::HashMap;
use std::time::Duration;

/// Timeout applied to every outbound call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub headers: HashMap<String, String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: Some(format!("mcp-remote/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl ClientConfig {
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Split a `KEY:VALUE` header argument
pub fn parse_header_arg(arg: &str) -> Result<(String, String)> {
    match arg.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ClientError::InvalidHeader(format!(
            "Expected KEY:VALUE, got '{}'",
            arg
        ))),
    }
}
