use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use axum::{middleware, Router};

use super::assets::{build_file_hashes, make_static_routes};
use super::llm_routes::make_llm_token_routes;
use super::pages::serve_page;
use super::state::ServerState;
use super::templates::Templates;
use super::{log_requests, ServerConfig, StaticCachePolicy};
#[cfg(feature = "slowdown")]
use super::slowdown_request;
use crate::content::ContentCache;
use crate::llm_tokens::LlmTokenRuntime;
use crate::mcp::{make_mcp_routes, McpConfig};

impl ServerState {
    fn new(
        config: ServerConfig,
        content: ContentCache,
        templates: Templates,
        file_hashes: BTreeMap<String, String>,
        llm: Option<LlmTokenRuntime>,
        mcp: Option<McpConfig>,
    ) -> ServerState {
        ServerState {
            config,
            content,
            templates: Arc::new(templates),
            file_hashes: Arc::new(file_hashes),
            llm: llm.map(Arc::new),
            mcp: mcp.map(Arc::new),
        }
    }
}

/// Assembles every route. `content` is expected to be built already; the
/// router only ever reads snapshots of it.
pub fn make_app(
    config: ServerConfig,
    content: ContentCache,
    templates: Templates,
    llm: Option<LlmTokenRuntime>,
    mcp: Option<McpConfig>,
) -> Result<Router> {
    let file_hashes = match &config.static_dir {
        Some(static_dir) => {
            if !static_dir.is_dir() {
                bail!("Static directory {:?} does not exist", static_dir);
            }
            build_file_hashes(static_dir, &config.hash_files)
        }
        None => BTreeMap::new(),
    };
    let state = ServerState::new(config.clone(), content, templates, file_hashes, llm, mcp);

    let mut app: Router = Router::new();

    if let Some(static_dir) = &config.static_dir {
        let policy = StaticCachePolicy {
            max_age_sec: config.static_cache_age_sec,
            dev: config.dev,
        };
        app = app.merge(make_static_routes(static_dir, policy));
    }

    if let Some(llm_token_routes) = make_llm_token_routes(state.clone()) {
        app = app.merge(llm_token_routes);
    }

    if let Some(mcp_routes) = make_mcp_routes(state.clone()) {
        app = app.merge(mcp_routes);
    }

    let page_routes: Router = Router::new().fallback(serve_page).with_state(state.clone());
    app = app.merge(page_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(err) => error!("Failed to listen for Ctrl+C: {}", err),
    }
}

pub async fn run_server(
    config: ServerConfig,
    content: ContentCache,
    templates: Templates,
    llm: Option<LlmTokenRuntime>,
    mcp: Option<McpConfig>,
) -> Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let app = make_app(config, content, templates, llm, mcp)?;

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);

    Ok(axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?)
}
