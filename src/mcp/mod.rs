//! MCP (Model Context Protocol) endpoint
//!
//! Exposes the documentation to LLM clients as a single search tool,
//! `query_docs_<id>`, over JSON-RPC on `POST /mcp`.
//!
//! - Auth: LLM token as `Authorization: Bearer`, or primary authentication
//! - Results: raw markdown of matching pages the caller may read

mod auth;
mod handler;
mod info_page;
pub mod protocol;
mod routes;
mod search;

pub use auth::{authenticate, extract_bearer_token, DocsAccess, McpAuth};
pub use handler::{handle_request, to_snake_case, tool_definition, tool_name, McpContext};
pub use info_page::{escape_html, mcp_info_page};
pub use protocol::{McpError, McpRequest, McpResponse};
pub use routes::make_mcp_routes;
pub use search::{format_hits, search_markdown, SearchHit, MAX_RESULTS};

/// MCP endpoint settings.
#[derive(Debug, Clone)]
pub struct McpConfig {
    /// Display name shown to MCP clients.
    pub name: String,
    /// Short identifier used in the tool name.
    pub id: String,
    /// Serve connection instructions at `GET /mcp`.
    pub info_page: bool,
    /// Extra HTML appended to the info page.
    pub info_extra: Option<String>,
}
