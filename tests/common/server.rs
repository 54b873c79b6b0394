//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own content directory.

use super::constants::*;
use super::fixtures::{create_test_site, test_runtime};
use docsite::content::ContentCache;
use docsite::mcp::McpConfig;
use docsite::server::{make_app, RequestsLoggingLevel, ServerConfig, Templates};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated site
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Content directory, for tests that edit pages
    pub content_dir: PathBuf,

    /// Shared with the router; tests can rebuild it after editing pages
    pub content: ContentCache,

    // Private fields - keep resources alive until drop
    _temp_site_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server with LLM tokens, primary auth and MCP enabled
    pub async fn spawn() -> Self {
        Self::spawn_with(true).await
    }

    /// Spawns a server without an `[llm]` section: every page is public
    pub async fn spawn_public() -> Self {
        Self::spawn_with(false).await
    }

    /// # Panics
    ///
    /// Panics if:
    /// - Site creation or the content build fails
    /// - Port binding fails
    /// - Server doesn't become ready within timeout
    async fn spawn_with(with_llm: bool) -> Self {
        let (temp_site_dir, paths) = create_test_site().expect("Failed to create test site");

        let content = ContentCache::new(paths.content_dir.clone());
        content.build().expect("Failed to build test content");
        let templates = Templates::bundled(&paths.templates_dir).expect("Failed to load templates");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            site_title: SITE_TITLE.to_string(),
            static_dir: Some(paths.static_dir.clone()),
            static_cache_age_sec: 60,
            ..Default::default()
        };

        let (llm, mcp) = if with_llm {
            let mcp = McpConfig {
                name: SITE_TITLE.to_string(),
                id: MCP_ID.to_string(),
                info_page: true,
                info_extra: None,
            };
            (Some(test_runtime(true)), Some(mcp))
        } else {
            (None, None)
        };

        let app = make_app(config, content.clone(), templates, llm, mcp)
            .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            content_dir: paths.content_dir,
            content,
            _temp_site_dir: temp_site_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home page
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
