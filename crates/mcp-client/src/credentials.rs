//! API key selection based on the target server URL

use std::collections::HashMap;

/// Header carrying the credential on outbound calls
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Variable used when no service hint matches the URL
pub const GENERIC_API_KEY_VAR: &str = "MCP_API_KEY";

/// Service hints checked in order against the server URL
pub const SERVICE_KEY_VARS: &[(&str, &str)] = &[
    ("supabase", "MCP_API_KEY_SUPABASE"),
    ("airtable", "MCP_API_KEY_AIRTABLE"),
    ("aws", "MCP_API_KEY_AWS"),
    ("notion", "MCP_API_KEY_NOTION"),
];

/// Name of the environment variable that holds the key for `server_url`
pub fn credential_var(server_url: &str) -> &'static str {
    let url = server_url.to_ascii_lowercase();
    SERVICE_KEY_VARS
        .iter()
        .find(|(hint, _)| url.contains(hint))
        .map(|(_, var)| *var)
        .unwrap_or(GENERIC_API_KEY_VAR)
}

/// Pick the credential for `server_url` out of `env`.
///
/// A matching service hint never falls back to the generic key: if the
/// service variable is unset (or empty) no credential is attached.
pub fn select_credential(server_url: &str, env: &HashMap<String, String>) -> Option<String> {
    env.get(credential_var(server_url))
        .filter(|key| !key.is_empty())
        .cloned()
}
