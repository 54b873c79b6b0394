//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per docsite endpoint.
//! When routes or request formats change, update only this file.

use super::constants::*;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Anonymous client with a cookie store, so an `llm_s` cookie set by the
    /// server is sent back on later requests.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Client carrying the primary session cookie on every request
    pub fn primary(base_url: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, SESSION_SECRET))
                .expect("Invalid cookie header"),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// GET <path> (rendered HTML)
    pub async fn get_page(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Page request failed")
    }

    /// GET <path>.md
    pub async fn get_markdown(&self, path: &str) -> Response {
        self.client
            .get(self.url(&format!("{}.md", path)))
            .send()
            .await
            .expect("Markdown request failed")
    }

    /// GET <path>.md?llm=<token>
    pub async fn get_markdown_with_token(&self, path: &str, token: &str) -> Response {
        self.client
            .get(self.url(&format!("{}.md", path)))
            .query(&[("llm", token)])
            .send()
            .await
            .expect("Markdown request failed")
    }

    /// GET <path>.md with If-None-Match
    pub async fn get_markdown_if_none_match(&self, path: &str, etag: &str) -> Response {
        self.client
            .get(self.url(&format!("{}.md", path)))
            .header(reqwest::header::IF_NONE_MATCH, etag)
            .send()
            .await
            .expect("Markdown request failed")
    }

    /// GET /static/<file>
    pub async fn get_static(&self, file: &str) -> Response {
        self.client
            .get(self.url(&format!("/static/{}", file)))
            .send()
            .await
            .expect("Static request failed")
    }

    // ========================================================================
    // LLM Tokens
    // ========================================================================

    /// POST /api/llm-token?path=<path>
    pub async fn issue_token(&self, path: &str) -> Response {
        self.client
            .post(self.url("/api/llm-token"))
            .query(&[("path", path)])
            .send()
            .await
            .expect("Token request failed")
    }

    /// Issues a token and returns it.
    ///
    /// # Panics
    ///
    /// Panics unless the client is primary-authenticated.
    pub async fn issue_token_string(&self, path: &str) -> String {
        let response = self.issue_token(path).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Token issuance failed"
        );
        let body: Value = response.json().await.expect("Invalid token response");
        body["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }

    // ========================================================================
    // MCP
    // ========================================================================

    /// POST /mcp with a raw JSON-RPC body and optional bearer token
    pub async fn mcp(&self, body: Value, bearer: Option<&str>) -> Response {
        let mut request = self.client.post(self.url("/mcp")).json(&body);
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        request.send().await.expect("MCP request failed")
    }

    /// tools/call on the docs search tool
    pub async fn mcp_search(&self, query: &str, bearer: Option<&str>) -> Response {
        self.mcp(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": MCP_TOOL, "arguments": {"query": query}}
            }),
            bearer,
        )
        .await
    }

    /// GET /mcp
    pub async fn mcp_info(&self) -> Response {
        self.client
            .get(self.url("/mcp"))
            .send()
            .await
            .expect("MCP info request failed")
    }
}
