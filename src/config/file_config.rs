use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::llm_tokens::PermissionGroup;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub content_dir: Option<String>,
    pub templates_dir: Option<String>,
    pub static_dir: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub site_title: Option<String>,
    pub version: Option<String>,
    pub static_cache_age_sec: Option<usize>,
    pub dev: Option<bool>,

    // Feature configs
    pub llm: Option<LlmConfig>,
    pub auth: Option<AuthConfig>,
    pub mcp: Option<McpFileConfig>,
    pub assets: Option<AssetsConfig>,
    /// Free-form values merged into every template render.
    pub globals: Option<toml::Table>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// Standard base64 HMAC key, see `cli-token gen-key`.
    pub key: Option<String>,
    /// Environment variable holding the key when `key` is not set.
    pub key_env: Option<String>,
    pub expires_in_hours: Option<u32>,
    /// `[["/internal", "/ops"], ["/partners"]]`: up to 8 groups of up to 24 prefixes.
    pub groups: Vec<PermissionGroup>,
}

#[derive(Deserialize, Default, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub session_cookie: Option<String>,
    pub secret: Option<String>,
    pub secret_env: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_cookie", &self.session_cookie)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("secret_env", &self.secret_env)
            .finish()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct McpFileConfig {
    /// Defaults to the site title.
    pub name: Option<String>,
    pub id: Option<String>,
    pub info_page: Option<bool>,
    pub info_extra: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AssetsConfig {
    pub hash_files: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
