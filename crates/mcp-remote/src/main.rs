use clap::{Parser, ValueEnum};
use mcp_client::{credential_var, parse_header_arg};
use mcp_proxy::{BridgeConfig, StdioProxy, ToolsStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "mcp-remote",
    about = "MCP HTTP Bridge - Drive tools on an HTTP server from a stdio MCP client",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    /// Remote server URL
    #[arg(value_name = "URL", env = "MCP_URL")]
    server_url: Option<String>,

    /// API key sent as X-API-Key (default: picked from MCP_API_KEY* by server URL)
    #[arg(long)]
    api_key: Option<String>,

    /// Exit if no API key can be found
    #[arg(long)]
    require_api_key: bool,

    /// How tools/list is answered
    #[arg(long, value_enum, default_value = "delegate")]
    tools_mode: ToolsModeArg,

    /// Send every request to the server URL instead of probing known paths
    #[arg(long)]
    no_probe: bool,

    /// Custom HTTP headers (format: key:value)
    #[arg(long = "header", value_name = "KEY:VALUE")]
    headers: Vec<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Allow HTTP connections (default is HTTPS only)
    #[arg(long)]
    allow_http: bool,

    /// Enable debug logging
    #[arg(long, short)]
    debug: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ToolsModeArg {
    #[value(name = "delegate")]
    Delegate,
    #[value(name = "generic")]
    Generic,
}

impl From<ToolsModeArg> for ToolsStrategy {
    fn from(arg: ToolsModeArg) -> Self {
        match arg {
            ToolsModeArg::Delegate => ToolsStrategy::Delegate,
            ToolsModeArg::Generic => ToolsStrategy::Generic,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let vars: HashMap<String, String> = std::env::vars().collect();
    let config = match build_config(&args, &vars) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    info!("MCP HTTP bridge starting");
    info!("Server URL: {}", config.server_url);
    info!("Tools strategy: {:?}", config.tools_strategy);
    if config.api_key.is_none() {
        warn!("No API key configured, requests will be sent without credentials");
    }
    if !config.probe_endpoints {
        info!("Endpoint probing disabled");
    }

    let proxy = StdioProxy::new(Arc::new(config))?;

    let result = tokio::select! {
        result = proxy.start() => {
            result.map_err(|e| {
                error!("Bridge error: {}", e);
                anyhow::anyhow!("Bridge failed: {}", e)
            })
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt signal, shutting down gracefully");
            Ok(())
        }
    };

    info!("MCP HTTP bridge stopped");
    result
}

/// Logs go to stderr; stdout carries the protocol
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(false),
        )
        .init();
}

fn build_config(args: &Args, vars: &HashMap<String, String>) -> anyhow::Result<BridgeConfig> {
    let server_url = args
        .server_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("No server URL provided (pass URL or set MCP_URL)"))?;
    let server_url = validate_server_url(server_url, args.allow_http)?;

    let headers = args
        .headers
        .iter()
        .map(|arg| parse_header_arg(arg))
        .collect::<Result<HashMap<_, _>, _>>()?;

    let mut config = BridgeConfig::from_vars(&server_url, vars)
        .with_headers(headers)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_tools_strategy(args.tools_mode.into())
        .with_endpoint_probing(!args.no_probe);

    if let Some(api_key) = args.api_key.as_deref().filter(|key| !key.is_empty()) {
        config = config.with_api_key(api_key);
    }

    if args.require_api_key && config.api_key.is_none() {
        anyhow::bail!(
            "No API key found for {} (set {} or pass --api-key)",
            config.server_url,
            credential_var(&config.server_url)
        );
    }

    Ok(config)
}

fn validate_server_url(url: &str, allow_http: bool) -> anyhow::Result<String> {
    use url::Url;

    let url = url.trim();
    let parsed = Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid URL '{}': {}", url, e))?;

    match parsed.scheme() {
        "https" => Ok(mcp_proxy::config::normalize_server_url(url)),
        "http" => {
            if allow_http {
                Ok(mcp_proxy::config::normalize_server_url(url))
            } else {
                anyhow::bail!(
                    "HTTP URLs are not allowed by default. Use --allow-http flag for trusted networks."
                );
            }
        }
        scheme => {
            anyhow::bail!("Unsupported URL scheme '{}'. Use http:// or https://", scheme);
        }
    }
}
