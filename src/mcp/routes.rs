use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tracing::{debug, info};

use super::auth::authenticate;
use super::handler::{handle_request, McpContext};
use super::info_page::mcp_info_page;
use super::protocol::{McpError, McpRequest, McpResponse};
use crate::content::title_map;
use crate::server::{request_origin, state::ServerState};

fn rpc_error(status: StatusCode, error: McpError) -> Response {
    (status, Json(McpResponse::error(None, error))).into_response()
}

async fn post_mcp(State(state): State<ServerState>, headers: HeaderMap, body: Bytes) -> Response {
    let (Some(rt), Some(config)) = (&state.llm, &state.mcp) else {
        return rpc_error(StatusCode::UNAUTHORIZED, McpError::Unauthorized);
    };

    let Some(auth) = authenticate(rt, &headers).await else {
        debug!("MCP request without valid credentials");
        return rpc_error(StatusCode::UNAUTHORIZED, McpError::Unauthorized);
    };

    let body: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => return rpc_error(StatusCode::BAD_REQUEST, McpError::ParseError),
    };
    if !body.get("method").is_some_and(Value::is_string) {
        return rpc_error(StatusCode::BAD_REQUEST, McpError::InvalidRequest);
    }
    let request: McpRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(_) => return rpc_error(StatusCode::BAD_REQUEST, McpError::InvalidRequest),
    };

    let data = state.content.snapshot();
    let titles = title_map(&data.content_index);
    let ctx = McpContext {
        server_name: &config.name,
        server_id: &config.id,
        markdown: &data.markdown,
        titles: &titles,
        auth: &auth,
    };

    Json(handle_request(request, &ctx)).into_response()
}

async fn get_mcp_info(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    match &state.mcp {
        Some(config) => {
            let endpoint = format!("{}/mcp", request_origin(&headers));
            Html(mcp_info_page(
                &config.name,
                &endpoint,
                config.info_extra.as_deref(),
            ))
            .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `POST /mcp`, plus the `GET /mcp` info page when enabled. `None` when MCP
/// is not configured.
pub fn make_mcp_routes(state: ServerState) -> Option<Router> {
    let config = state.mcp.clone()?;
    if state.llm.is_none() {
        return None;
    }
    info!(
        "MCP endpoint enabled at /mcp (tool {})",
        super::tool_name(&config.id)
    );

    let route = if config.info_page {
        post(post_mcp).get(get_mcp_info)
    } else {
        post(post_mcp)
    };
    Some(Router::new().route("/mcp", route).with_state(state))
}
