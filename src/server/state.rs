use axum::extract::FromRef;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::templates::Templates;
use super::ServerConfig;
use crate::content::ContentCache;
use crate::llm_tokens::LlmTokenRuntime;
use crate::mcp::McpConfig;

pub type GuardedTemplates = Arc<Templates>;
pub type GuardedFileHashes = Arc<BTreeMap<String, String>>;
pub type OptionalLlmRuntime = Option<Arc<LlmTokenRuntime>>;
pub type OptionalMcpConfig = Option<Arc<McpConfig>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub content: ContentCache,
    pub templates: GuardedTemplates,
    pub file_hashes: GuardedFileHashes,
    pub llm: OptionalLlmRuntime,
    pub mcp: OptionalMcpConfig,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for ContentCache {
    fn from_ref(input: &ServerState) -> Self {
        input.content.clone()
    }
}

impl FromRef<ServerState> for GuardedTemplates {
    fn from_ref(input: &ServerState) -> Self {
        input.templates.clone()
    }
}

impl FromRef<ServerState> for OptionalLlmRuntime {
    fn from_ref(input: &ServerState) -> Self {
        input.llm.clone()
    }
}
