//! Cache headers for static assets

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::IntoResponse,
};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "avif"];
const IMAGE_MAX_AGE_SEC: usize = 14400;

#[derive(Debug, Clone, Copy)]
pub struct StaticCachePolicy {
    pub max_age_sec: usize,
    /// Scripts and stylesheets are never cached while developing.
    pub dev: bool,
}

impl StaticCachePolicy {
    pub fn cache_control(&self, path: &str) -> String {
        let extension = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if self.dev && (extension == "js" || extension == "css") {
            "no-store".to_string()
        } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            format!("public, max-age={}", IMAGE_MAX_AGE_SEC)
        } else {
            format!("public, max-age={}", self.max_age_sec)
        }
    }
}

pub async fn http_cache(
    State(policy): State<StaticCachePolicy>,
    request: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    let cache_control = policy.cache_control(request.uri().path());
    let response = next.run(request).await.into_response();

    let (mut parts, body) = response.into_parts();
    if parts.status.is_success() {
        if let Ok(value) = HeaderValue::from_str(&cache_control) {
            parts.headers.insert(header::CACHE_CONTROL, value);
        }
    }

    axum::http::Response::from_parts(parts, body)
}
