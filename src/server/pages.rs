//! Catch-all page routes: `<path>.md` serves raw markdown, anything else the
//! rendered HTML page. Both forms of a protected page need credentials.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Cookie;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error};

use super::llm_routes::{authorize_page, PageAccess};
use super::state::ServerState;
use super::templates::LAYOUT_TEMPLATE;
use crate::content::{ContentNode, PageMeta, TocItem};
use crate::llm_tokens::llm_401_response;

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
const TEXT_HTML_UTF8: &str = "text/html; charset=utf-8";
const FALLBACK_TITLE: &str = "Documentation";

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Quoted FNV-1a (32 bit) of the body's UTF-16 code units, in base 36.
pub fn compute_etag(body: &str) -> String {
    let hash = body.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ unit as u32).wrapping_mul(FNV_PRIME)
    });
    format!("\"{}\"", to_base36(hash))
}

fn push_navigation(nodes: &[ContentNode], lines: &mut Vec<String>, depth: usize) {
    let indent = "  ".repeat(depth);
    for node in nodes.iter().filter(|n| !n.hidden()) {
        match node {
            ContentNode::Dir(dir) => {
                match &dir.index_path {
                    Some(index_path) => {
                        lines.push(format!("{}- [{}]({}.md)", indent, dir.title, index_path))
                    }
                    None => lines.push(format!("{}- {}", indent, dir.title)),
                }
                push_navigation(&dir.children, lines, depth + 1);
            }
            ContentNode::File(file) => {
                lines.push(format!("{}- [{}]({}.md)", indent, file.title, file.path))
            }
        }
    }
}

/// Markdown list of every visible page, linking to the `.md` routes so
/// agents can keep walking the site.
pub fn render_navigation(nodes: &[ContentNode]) -> String {
    let mut lines: Vec<String> = ["", "", "---", "", "## Pages"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    push_navigation(nodes, &mut lines, 0);
    lines.join("\n")
}

fn not_found(path: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("Not found: {}", path)).into_response()
}

fn if_none_match(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
}

/// 304 when the client already has `body`, otherwise 200 with `content_type`.
fn respond_with_etag(
    request_headers: &HeaderMap,
    body: String,
    content_type: &'static str,
    cache_control: &'static str,
) -> Response {
    let etag = compute_etag(&body);
    let not_modified = if_none_match(request_headers) == Some(etag.as_str());

    let mut builder = Response::builder()
        .header(header::CACHE_CONTROL, cache_control)
        .header(header::ETAG, etag);
    let body = if not_modified {
        builder = builder.status(StatusCode::NOT_MODIFIED);
        Body::empty()
    } else {
        builder = builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type);
        Body::from(body)
    };

    builder
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)],
        llm_401_response(),
    )
        .into_response()
}

fn with_cookie(mut response: Response, cookie: Option<Cookie<'static>>) -> Response {
    if let Some(cookie) = cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct PageQuery {
    llm: Option<String>,
}

async fn serve_markdown(
    state: &ServerState,
    headers: &HeaderMap,
    query: &PageQuery,
    pathname: &str,
) -> Response {
    let page_path = pathname.strip_suffix(".md").unwrap_or(pathname);
    let data = state.content.snapshot();
    let Some(markdown) = data.markdown.get(page_path).filter(|md| !md.is_empty()) else {
        return not_found(pathname);
    };
    let mut body = format!("{}{}", markdown, render_navigation(&data.content_index));

    let access = authorize_page(
        state.llm.as_deref(),
        headers,
        query.llm.as_deref(),
        pathname,
    )
    .await;
    let cache_control = access.cache_control();

    match access {
        PageAccess::Denied => unauthorized(),
        PageAccess::Token { footer, cookie } => {
            if let Some(footer) = footer {
                body.push_str(&footer);
            }
            let response = respond_with_etag(headers, body, TEXT_PLAIN_UTF8, cache_control);
            with_cookie(response, cookie)
        }
        PageAccess::Public | PageAccess::Private => {
            respond_with_etag(headers, body, TEXT_PLAIN_UTF8, cache_control)
        }
    }
}

/// Variables available to `layout.html`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutContext<'a> {
    title: &'a str,
    site_title: &'a str,
    content_tree: &'a [ContentNode],
    current_path: &'a str,
    content: &'a str,
    toc: &'a [TocItem],
    meta: &'a PageMeta,
    file_hashes: &'a BTreeMap<String, String>,
    year: i32,
    version: &'a str,
}

fn layout_context(ctx: &LayoutContext, globals: &BTreeMap<String, Value>) -> Value {
    let mut value =
        serde_json::to_value(ctx).unwrap_or_else(|_| Value::Object(Default::default()));
    if let Value::Object(map) = &mut value {
        for (key, global) in globals {
            map.insert(key.clone(), global.clone());
        }
    }
    value
}

/// Rendered page. Protected pages go through the same check as their `.md`
/// form, without the footer.
async fn serve_html(
    state: &ServerState,
    headers: &HeaderMap,
    query: &PageQuery,
    pathname: &str,
) -> Response {
    let data = state.content.snapshot();
    let Some(page) = data.pages.get(pathname) else {
        return not_found(pathname);
    };

    let access = authorize_page(
        state.llm.as_deref(),
        headers,
        query.llm.as_deref(),
        pathname,
    )
    .await;
    let cache_control = access.cache_control();
    let cookie = match access {
        PageAccess::Denied => return unauthorized(),
        PageAccess::Token { cookie, .. } => cookie,
        PageAccess::Public | PageAccess::Private => None,
    };

    let ctx = LayoutContext {
        title: page.meta.title.as_deref().unwrap_or(FALLBACK_TITLE),
        site_title: &state.config.site_title,
        content_tree: &data.content_index,
        current_path: pathname,
        content: &page.html,
        toc: &page.toc,
        meta: &page.meta,
        file_hashes: &state.file_hashes,
        year: chrono::Utc::now().year(),
        version: &state.config.version,
    };
    let html = match state
        .templates
        .render(LAYOUT_TEMPLATE, layout_context(&ctx, &state.config.template_globals))
    {
        Ok(html) => html,
        Err(err) => {
            error!("Failed to render {}: {}", pathname, err);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };

    debug!("Rendered {}", pathname);
    with_cookie(
        respond_with_etag(headers, html, TEXT_HTML_UTF8, cache_control),
        cookie,
    )
}

/// Fallback for every path no other router claims.
pub async fn serve_page(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let pathname = uri.path();
    if pathname.ends_with(".md") {
        serve_markdown(&state, &headers, &query, pathname).await
    } else {
        serve_html(&state, &headers, &query, pathname).await
    }
}
