use super::state::ServerState;
use crate::llm_tokens::PrimaryAuth;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::debug;

pub const DEFAULT_SESSION_COOKIE: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

/// Primary authentication against a shared secret, presented either as the
/// session cookie or as the `Authorization` header (optionally `Bearer `-prefixed).
pub struct SharedSecretAuth {
    cookie_name: String,
    secret: String,
}

impl SharedSecretAuth {
    pub fn new(cookie_name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for SharedSecretAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretAuth")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

fn extract_session_token_from_cookies(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(Cookie::value)
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(HEADER_SESSION_TOKEN_KEY)?.to_str().ok()?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };
    Some(token.to_string())
}

#[async_trait]
impl PrimaryAuth for SharedSecretAuth {
    async fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        let candidates = [
            extract_session_token_from_cookies(headers, &self.cookie_name),
            extract_session_token_from_headers(headers),
        ];
        let authenticated = candidates
            .iter()
            .flatten()
            .any(|token| bool::from(token.as_bytes().ct_eq(self.secret.as_bytes())));
        debug!("Primary authentication: {}", authenticated);
        authenticated
    }
}

/// A request that passed primary authentication.
#[derive(Debug)]
pub struct PrimarySession;

#[derive(Debug)]
pub struct NotAuthenticated;

impl IntoResponse for NotAuthenticated {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Not authenticated" })),
        )
            .into_response()
    }
}

impl FromRequestParts<ServerState> for PrimarySession {
    type Rejection = NotAuthenticated;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        match &ctx.llm {
            Some(rt) if rt.is_primary_authenticated(&parts.headers).await => Ok(PrimarySession),
            _ => Err(NotAuthenticated),
        }
    }
}
