//! MCP Proxy - translates stdio JSON-RPC requests into calls on a remote HTTP server

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod normalize;
pub mod stdio_proxy;
pub mod strategy;

pub use config::BridgeConfig;
pub use dispatcher::{forward_payload, MethodDispatcher};
pub use error::{ProxyError, Result};
pub use stdio_proxy::StdioProxy;
pub use strategy::ToolsStrategy;
