//! LLM token issuance and access checks for protected pages

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::session::PrimarySession;
use super::state::{OptionalLlmRuntime, ServerState};
use crate::llm_tokens::{
    can_access_route, create_token, is_protected_route, llm_footer, resolve_all_permissions,
    verify_active_token, LlmTokenRuntime,
};

pub const LLM_COOKIE: &str = "llm_s";

/// `<proto>://<host>` as seen by the client, honoring `x-forwarded-proto`.
pub fn request_origin(headers: &HeaderMap) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}", proto, host)
}

fn is_https(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto == "https")
}

/// Outcome of the access check for a page, in either its `.md` or HTML form.
#[derive(Debug)]
pub enum PageAccess {
    /// Not under any protected prefix.
    Public,
    /// Protected, passed primary authentication.
    Private,
    /// Protected, granted by an LLM token. `footer` and `cookie` are set when
    /// the token was passed as `?llm=`.
    Token {
        footer: Option<String>,
        cookie: Option<Cookie<'static>>,
    },
    Denied,
}

impl PageAccess {
    pub fn cache_control(&self) -> &'static str {
        match self {
            PageAccess::Public => "public, no-cache",
            _ => "private, no-cache",
        }
    }
}

fn token_cookie(token: &str, max_age_sec: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((LLM_COOKIE, token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age_sec.max(0)))
        .build()
}

/// Decides whether the request may read `page_path`. Protected pages need
/// primary authentication or an LLM token covering the path.
///
/// A token in the query string wins over the cookie, even when it is invalid.
pub async fn authorize_page(
    rt: Option<&LlmTokenRuntime>,
    headers: &HeaderMap,
    query_token: Option<&str>,
    page_path: &str,
) -> PageAccess {
    let Some(rt) = rt else {
        return PageAccess::Public;
    };
    if !is_protected_route(rt, page_path) {
        return PageAccess::Public;
    }
    if rt.is_primary_authenticated(headers).await {
        return PageAccess::Private;
    }

    let from_query = query_token.filter(|t| !t.is_empty());
    let token = match from_query {
        Some(token) => token.to_string(),
        None => match CookieJar::from_headers(headers).get(LLM_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => return PageAccess::Denied,
        },
    };

    let data = match verify_active_token(rt, &token).await {
        Ok(data) => data,
        Err(rejection) => {
            debug!("Rejected LLM token for {}: {:?}", page_path, rejection);
            return PageAccess::Denied;
        }
    };
    if !can_access_route(rt, &data, page_path) {
        debug!("LLM token does not grant {}", page_path);
        return PageAccess::Denied;
    }

    match from_query {
        Some(token) => {
            let max_age_sec = data.remaining_hours(rt, Utc::now()) * 3600;
            PageAccess::Token {
                footer: Some(llm_footer(token)),
                cookie: Some(token_cookie(token, max_age_sec, is_https(headers))),
            }
        }
        None => PageAccess::Token {
            footer: None,
            cookie: None,
        },
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct IssueTokenQuery {
    path: Option<String>,
}

#[derive(Serialize, Debug)]
struct TokenUsage {
    curl: String,
    hint: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct IssuedToken {
    token: String,
    expires_in: String,
    usage: TokenUsage,
}

async fn post_llm_token(
    _session: PrimarySession,
    State(llm): State<OptionalLlmRuntime>,
    Query(query): Query<IssueTokenQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(rt) = llm else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let permissions = resolve_all_permissions(&rt);
    let token = match create_token(&rt, permissions.group_bits, permissions.entry_bits).await {
        Ok(token) => token,
        Err(err) => {
            error!("Error with LLM token generation: {}", err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Token generation failed" })),
            )
                .into_response();
        }
    };

    let origin = request_origin(&headers);
    let path = query
        .path
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "/".to_string());
    info!("Issued LLM token {}... for {}", &token[..4], path);

    Json(IssuedToken {
        expires_in: format!("{}h", rt.expires_in_hours()),
        usage: TokenUsage {
            curl: format!("curl -s \"{}{}?llm={}\"", origin, path, token),
            hint: format!("Append ?llm={} to every link you follow on {}", token, origin),
        },
        token,
    })
    .into_response()
}

/// `POST /api/llm-token`, when LLM tokens are configured.
pub fn make_llm_token_routes(state: ServerState) -> Option<Router> {
    if state.llm.is_none() {
        return None;
    }
    Some(
        Router::new()
            .route("/api/llm-token", post(post_llm_token))
            .with_state(state),
    )
}
