//! MCP JSON-RPC dispatch
//!
//! Stateless: every POST carries one request and gets one response, so
//! `notifications/initialized` is answered with an empty result.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::protocol::{
    methods, InitializeResult, McpError, McpRequest, McpResponse, ServerCapabilities, ServerInfo,
    ToolDefinition, ToolsCallParams, ToolsCallResult, ToolsCapability, ToolsListResult,
    MCP_PROTOCOL_VERSION, SERVER_VERSION,
};
use super::search::{format_hits, search_markdown};
use super::McpAuth;

lazy_static! {
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z])([A-Z])").expect("Invalid regex");
    static ref SEPARATORS: Regex = Regex::new(r"[\s\-]+").expect("Invalid regex");
    static ref NON_IDENT: Regex = Regex::new(r"(?i)[^a-z0-9_]").expect("Invalid regex");
}

const TOOL_DESCRIPTION: &str = "Search documentation and return relevant pages as markdown";

/// "My Project" / "my-project" / "myProject" -> "my_project"
pub fn to_snake_case(s: &str) -> String {
    let s = CAMEL_BOUNDARY.replace_all(s, "${1}_${2}");
    let s = SEPARATORS.replace_all(&s, "_");
    NON_IDENT.replace_all(&s, "").to_lowercase()
}

pub fn tool_name(server_id: &str) -> String {
    format!("query_docs_{}", to_snake_case(server_id))
}

/// Everything a request may look at.
pub struct McpContext<'a> {
    pub server_name: &'a str,
    pub server_id: &'a str,
    pub markdown: &'a BTreeMap<String, String>,
    pub titles: &'a BTreeMap<String, String>,
    pub auth: &'a dyn McpAuth,
}

pub fn handle_request(request: McpRequest, ctx: &McpContext) -> McpResponse {
    let id = request.id.clone();
    debug!("MCP request {}", request.method);

    let result = match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(ctx),
        methods::INITIALIZED | methods::PING => Ok(json!({})),
        methods::TOOLS_LIST => handle_tools_list(ctx),
        methods::TOOLS_CALL => handle_tools_call(&request, ctx),
        other => Err(McpError::MethodNotFound(other.to_string())),
    };

    match result {
        Ok(value) => McpResponse::success(id, value),
        Err(error) => McpResponse::error(id, error),
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}

fn handle_initialize(ctx: &McpContext) -> Result<Value, McpError> {
    to_value(InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        server_info: ServerInfo {
            name: ctx.server_name.to_string(),
            version: SERVER_VERSION.to_string(),
        },
        capabilities: ServerCapabilities {
            tools: ToolsCapability::default(),
        },
    })
}

pub fn tool_definition(server_id: &str) -> ToolDefinition {
    ToolDefinition {
        name: tool_name(server_id),
        description: TOOL_DESCRIPTION.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query, keywords or phrase to find in documentation"
                },
                "topic": {
                    "type": "string",
                    "description": "Optional path prefix to narrow results (e.g. '/api', '/guides')"
                }
            },
            "required": ["query"]
        }),
    }
}

fn handle_tools_list(ctx: &McpContext) -> Result<Value, McpError> {
    to_value(ToolsListResult {
        tools: vec![tool_definition(ctx.server_id)],
    })
}

fn handle_tools_call(request: &McpRequest, ctx: &McpContext) -> Result<Value, McpError> {
    let params: ToolsCallParams = request
        .params
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .unwrap_or_default();

    let name = params.name.unwrap_or_default();
    if name != tool_name(ctx.server_id) {
        return Err(McpError::InvalidParams(format!("Unknown tool: {}", name)));
    }

    let arguments = params.arguments.unwrap_or_else(|| json!({}));
    let query = match arguments.get("query").and_then(Value::as_str) {
        Some(q) if !q.trim().is_empty() => q,
        _ => {
            return Err(McpError::InvalidParams(
                "Missing or empty 'query' parameter".to_string(),
            ))
        }
    };
    let topic = arguments
        .get("topic")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty());

    let hits = search_markdown(query, topic, ctx.markdown, ctx.titles, ctx.auth);
    debug!("MCP search {:?} (topic {:?}): {} hits", query, topic, hits.len());
    to_value(ToolsCallResult::text(format_hits(&hits)))
}
