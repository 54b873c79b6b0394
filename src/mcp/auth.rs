use axum::http::{header, HeaderMap};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use crate::llm_tokens::{
    can_access_route, is_protected_route, verify_active_token, LlmTokenRuntime, TokenData,
};

lazy_static! {
    static ref BEARER: Regex = Regex::new(r"(?i)^Bearer\s+(.+)$").expect("Invalid bearer regex");
}

/// Per-request read permission on documentation pages.
pub trait McpAuth: Send + Sync {
    fn can_access(&self, path: &str) -> bool;
}

/// What an authenticated MCP caller may read.
#[derive(Debug, Clone)]
pub enum DocsAccess {
    /// Primary authentication: every page.
    Full,
    /// LLM token: public pages plus the protected ones the token grants.
    Token {
        rt: Arc<LlmTokenRuntime>,
        data: TokenData,
    },
}

impl McpAuth for DocsAccess {
    fn can_access(&self, path: &str) -> bool {
        match self {
            DocsAccess::Full => true,
            DocsAccess::Token { rt, data } => {
                !is_protected_route(rt, path) || can_access_route(rt, data, path)
            }
        }
    }
}

/// Token part of an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    BEARER
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// There is no anonymous access: callers need primary authentication or a
/// valid, unexpired LLM token as bearer.
pub async fn authenticate(rt: &Arc<LlmTokenRuntime>, headers: &HeaderMap) -> Option<DocsAccess> {
    if let Some(token) = extract_bearer_token(headers) {
        match verify_active_token(rt, &token).await {
            Ok(data) => {
                return Some(DocsAccess::Token {
                    rt: rt.clone(),
                    data,
                })
            }
            Err(rejection) => debug!("MCP bearer token rejected: {:?}", rejection),
        }
    }

    if rt.is_primary_authenticated(headers).await {
        return Some(DocsAccess::Full);
    }
    None
}
