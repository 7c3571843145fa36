//! Locally synthesized tool definitions for the `generic` tools strategy

use mcp_types::ToolDefinition;
use serde_json::json;

/// Name of the wrapper tool whose arguments are `{tool, inputs}`
pub const CALL_TOOL_NAME: &str = "call";

pub fn call_tool() -> ToolDefinition {
    ToolDefinition::new(
        CALL_TOOL_NAME,
        "Call any tool on the HTTP MCP server",
        json!({
            "type": "object",
            "properties": {
                "tool": {"type": "string", "description": "Tool name to call"},
                "inputs": {"type": "object", "description": "Tool inputs"}
            },
            "required": ["tool", "inputs"]
        }),
    )
}

/// The `call` wrapper followed by the first service catalog whose hint is in the URL
pub fn generic_tools(server_url: &str) -> Vec<ToolDefinition> {
    let url = server_url.to_ascii_lowercase();
    let mut tools = vec![call_tool()];

    if url.contains("airtable") {
        tools.extend(airtable_tools());
    } else if url.contains("supabase") {
        tools.extend(supabase_tools());
    }

    tools
}

fn airtable_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "list_tables",
            "List tables in Airtable base",
            json!({
                "type": "object",
                "properties": {"baseId": {"type": "string"}},
                "required": ["baseId"]
            }),
        ),
        ToolDefinition::new(
            "list_records",
            "List records from table",
            json!({
                "type": "object",
                "properties": {
                    "baseId": {"type": "string"},
                    "tableId": {"type": "string"}
                },
                "required": ["baseId", "tableId"]
            }),
        ),
    ]
}

fn supabase_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "list_tables",
            "List database tables",
            json!({"type": "object"}),
        ),
        ToolDefinition::new(
            "query_table",
            "Query records from a table",
            json!({
                "type": "object",
                "properties": {
                    "table": {"type": "string"},
                    "limit": {"type": "number"}
                },
                "required": ["table"]
            }),
        ),
        ToolDefinition::new(
            "insert_record",
            "Insert a record into a table",
            json!({
                "type": "object",
                "properties": {
                    "table": {"type": "string"},
                    "record": {"type": "object"}
                },
                "required": ["table", "record"]
            }),
        ),
        ToolDefinition::new(
            "update_record",
            "Update records in a table",
            json!({
                "type": "object",
                "properties": {
                    "table": {"type": "string"},
                    "updates": {"type": "object"},
                    "match": {"type": "object"}
                },
                "required": ["table", "updates", "match"]
            }),
        ),
        ToolDefinition::new(
            "delete_record",
            "Delete records from a table",
            json!({
                "type": "object",
                "properties": {
                    "table": {"type": "string"},
                    "match": {"type": "object"}
                },
                "required": ["table", "match"]
            }),
        ),
    ]
}
