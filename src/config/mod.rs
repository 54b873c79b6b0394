mod file_config;

pub use file_config::{AssetsConfig, AuthConfig, FileConfig, LlmConfig, McpFileConfig};

use crate::llm_tokens::{HmacSha256Key, LlmTokenRuntime, PermissionGroup, PrimaryAuth};
use crate::mcp::McpConfig;
use crate::server::{
    assets::DEFAULT_HASH_FILES, RequestsLoggingLevel, ServerConfig, SharedSecretAuth,
    DEFAULT_SESSION_COOKIE,
};
use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_LLM_KEY_ENV: &str = "DOCSITE_LLM_KEY";
pub const DEFAULT_AUTH_SECRET_ENV: &str = "DOCSITE_AUTH_SECRET";
const DEFAULT_MCP_ID: &str = "docs";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub content_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub site_title: Option<String>,
    pub static_cache_age_sec: usize,
    pub dev: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub content_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub site_title: String,
    pub version: String,
    pub static_cache_age_sec: usize,
    pub dev: bool,
    pub hash_files: Vec<String>,
    pub template_globals: BTreeMap<String, serde_json::Value>,

    // Feature configs
    pub llm: Option<LlmSettings>,
    pub auth: Option<AuthSettings>,
    pub mcp: Option<McpConfig>,
}

#[derive(Clone)]
pub struct LlmSettings {
    /// Base64 HMAC key.
    pub key: String,
    pub expires_in_hours: Option<u32>,
    pub groups: Vec<PermissionGroup>,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("key", &"<redacted>")
            .field("expires_in_hours", &self.expires_in_hours)
            .field("groups", &self.groups)
            .finish()
    }
}

#[derive(Clone)]
pub struct AuthSettings {
    pub session_cookie: String,
    pub secret: String,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("session_cookie", &self.session_cookie)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl LlmSettings {
    /// Resolves the key from the `[llm]` section or its environment variable.
    pub fn from_file(llm: LlmConfig) -> Result<Self> {
        let env_name = llm.key_env.as_deref().unwrap_or(DEFAULT_LLM_KEY_ENV);
        Ok(LlmSettings {
            key: secret_value(llm.key, env_name, "LLM token key")?,
            expires_in_hours: llm.expires_in_hours,
            groups: llm.groups,
        })
    }

    pub fn build_runtime(
        &self,
        primary_auth: Option<Arc<dyn PrimaryAuth>>,
    ) -> Result<LlmTokenRuntime> {
        let key = HmacSha256Key::from_base64(&self.key).context("Invalid [llm] key")?;
        Ok(LlmTokenRuntime::new(
            self.groups.clone(),
            Arc::new(key),
            self.expires_in_hours,
            primary_auth,
        )?)
    }
}

fn existing_dir(path: PathBuf, what: &str) -> Result<PathBuf> {
    if !path.exists() {
        bail!("{} does not exist: {:?}", what, path);
    }
    if !path.is_dir() {
        bail!("{} is not a directory: {:?}", what, path);
    }
    Ok(path)
}

/// Inline value first, then the named environment variable.
fn secret_value(inline: Option<String>, env_name: &str, what: &str) -> Result<String> {
    if let Some(value) = inline.filter(|v| !v.is_empty()) {
        return Ok(value);
    }
    std::env::var(env_name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{} missing: set it in the config file or in ${}", what, env_name))
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let content_dir = file
            .content_dir
            .map(PathBuf::from)
            .or_else(|| cli.content_dir.clone())
            .ok_or_else(|| {
                anyhow!("content_dir must be specified as an argument or in config file")
            })?;
        let content_dir = existing_dir(content_dir, "Content directory")?;

        let templates_dir = file
            .templates_dir
            .map(PathBuf::from)
            .or_else(|| cli.templates_dir.clone())
            .unwrap_or_else(|| PathBuf::from("templates"));
        let templates_dir = existing_dir(templates_dir, "Templates directory")?;

        let static_dir = match file.static_dir.map(PathBuf::from).or_else(|| cli.static_dir.clone()) {
            Some(dir) => Some(existing_dir(dir, "Static directory")?),
            None => None,
        };

        let host = file.host.unwrap_or_else(|| cli.host.clone());
        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let site_title = file
            .site_title
            .or_else(|| cli.site_title.clone())
            .unwrap_or_else(|| "Documentation".to_string());
        let version = file.version.unwrap_or_else(|| "dev".to_string());
        let static_cache_age_sec = file
            .static_cache_age_sec
            .unwrap_or(cli.static_cache_age_sec);
        let dev = file.dev.unwrap_or(cli.dev);

        let hash_files = file
            .assets
            .and_then(|a| a.hash_files)
            .unwrap_or_else(|| DEFAULT_HASH_FILES.iter().map(|f| f.to_string()).collect());

        let template_globals = match file.globals {
            Some(table) => table
                .into_iter()
                .map(|(key, value)| Ok((key, serde_json::to_value(value)?)))
                .collect::<Result<BTreeMap<_, _>, serde_json::Error>>()
                .context("Invalid [globals] value")?,
            None => BTreeMap::new(),
        };

        let llm = file.llm.map(LlmSettings::from_file).transpose()?;

        let auth = match file.auth {
            Some(auth) => {
                let env_name = auth.secret_env.as_deref().unwrap_or(DEFAULT_AUTH_SECRET_ENV);
                Some(AuthSettings {
                    session_cookie: auth
                        .session_cookie
                        .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string()),
                    secret: secret_value(auth.secret, env_name, "Session secret")?,
                })
            }
            None => None,
        };

        let mcp = match file.mcp {
            Some(_) if llm.is_none() => {
                bail!("[mcp] requires an [llm] section: MCP clients authenticate with LLM tokens")
            }
            Some(mcp) => Some(McpConfig {
                name: mcp.name.unwrap_or_else(|| site_title.clone()),
                id: mcp.id.unwrap_or_else(|| DEFAULT_MCP_ID.to_string()),
                info_page: mcp.info_page.unwrap_or(false),
                info_extra: mcp.info_extra,
            }),
            None => None,
        };

        Ok(Self {
            content_dir,
            templates_dir,
            static_dir,
            host,
            port,
            logging_level,
            site_title,
            version,
            static_cache_age_sec,
            dev,
            hash_files,
            template_globals,
            llm,
            auth,
            mcp,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            host: self.host.clone(),
            port: self.port,
            site_title: self.site_title.clone(),
            version: self.version.clone(),
            static_dir: self.static_dir.clone(),
            static_cache_age_sec: self.static_cache_age_sec,
            hash_files: self.hash_files.clone(),
            dev: self.dev,
            template_globals: self.template_globals.clone(),
        }
    }

    /// Token runtime for the `[llm]` section, with `[auth]` as the primary
    /// authentication predicate.
    pub fn build_llm_runtime(&self) -> Result<Option<LlmTokenRuntime>> {
        let Some(llm) = &self.llm else {
            return Ok(None);
        };

        let primary_auth: Option<Arc<dyn PrimaryAuth>> = match &self.auth {
            Some(auth) => Some(Arc::new(SharedSecretAuth::new(
                auth.session_cookie.clone(),
                auth.secret.clone(),
            ))),
            None => {
                warn!("No [auth] section: protected pages need LLM tokens and POST /api/llm-token is disabled");
                None
            }
        };

        Ok(Some(llm.build_runtime(primary_auth)?))
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEST_KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";

    struct Dirs {
        content: TempDir,
        templates: TempDir,
    }

    fn make_dirs() -> Dirs {
        Dirs {
            content: TempDir::new().unwrap(),
            templates: TempDir::new().unwrap(),
        }
    }

    fn cli_for(dirs: &Dirs) -> CliConfig {
        CliConfig {
            content_dir: Some(dirs.content.path().to_path_buf()),
            templates_dir: Some(dirs.templates.path().to_path_buf()),
            host: "127.0.0.1".to_string(),
            port: 3000,
            logging_level: RequestsLoggingLevel::Path,
            static_cache_age_sec: 3600,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("path"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(matches!(
            parse_logging_level("headers"),
            Some(RequestsLoggingLevel::Headers)
        ));
        assert!(matches!(
            parse_logging_level("body"),
            Some(RequestsLoggingLevel::Body)
        ));
        // Case insensitive
        assert!(matches!(
            parse_logging_level("PATH"),
            Some(RequestsLoggingLevel::Path)
        ));
        // Invalid
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let dirs = make_dirs();
        let cli = CliConfig {
            site_title: Some("Acme".to_string()),
            dev: true,
            ..cli_for(&dirs)
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.content_dir, dirs.content.path());
        assert_eq!(config.templates_dir(), dirs.templates.path());
        assert_eq!(config.port, 3000);
        assert_eq!(config.site_title, "Acme");
        assert_eq!(config.version, "dev");
        assert_eq!(config.hash_files, vec!["output.css", "main.js"]);
        assert!(config.dev);
        assert!(config.llm.is_none());
        assert!(config.mcp.is_none());
        assert!(config.build_llm_runtime().unwrap().is_none());
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let dirs = make_dirs();
        let cli = CliConfig {
            content_dir: Some(PathBuf::from("/should/be/overridden")),
            ..cli_for(&dirs)
        };

        let file_config = FileConfig {
            content_dir: Some(dirs.content.path().to_string_lossy().to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            version: Some("1.2.3".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.content_dir, dirs.content.path());
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.version, "1.2.3");
        // CLI value used when TOML doesn't specify
        assert_eq!(config.static_cache_age_sec, 3600);
        assert_eq!(config.server_config().host, "127.0.0.1");
    }

    #[test]
    fn test_resolve_missing_content_dir_error() {
        let cli = CliConfig::default();
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("content_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_templates_dir_error() {
        let dirs = make_dirs();
        let cli = CliConfig {
            templates_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            ..cli_for(&dirs)
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_llm_and_mcp_sections() {
        let dirs = make_dirs();
        let file_config: FileConfig = toml::from_str(&format!(
            r#"
            site_title = "Acme Docs"

            [llm]
            key = "{}"
            groups = [["/internal"], ["/partners", "/beta"]]

            [auth]
            secret = "primary-secret"

            [mcp]
            info_page = true

            [globals]
            support_email = "help@example.com"
            "#,
            TEST_KEY
        ))
        .unwrap();

        let config = AppConfig::resolve(&cli_for(&dirs), Some(file_config)).unwrap();

        let mcp = config.mcp.as_ref().unwrap();
        assert_eq!(mcp.name, "Acme Docs");
        assert_eq!(mcp.id, "docs");
        assert!(mcp.info_page);
        assert_eq!(config.auth.as_ref().unwrap().session_cookie, "session_token");
        assert_eq!(
            config.template_globals["support_email"],
            serde_json::json!("help@example.com")
        );
        assert!(!format!("{:?}", config).contains("primary-secret"));

        let runtime = config.build_llm_runtime().unwrap().unwrap();
        assert_eq!(runtime.groups().len(), 2);
        assert_eq!(runtime.expires_in_hours(), 8);
        assert!(runtime.primary_auth().is_some());
    }

    #[test]
    fn test_resolve_mcp_without_llm_error() {
        let dirs = make_dirs();
        let file_config = FileConfig {
            mcp: Some(McpFileConfig::default()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli_for(&dirs), Some(file_config));
        assert!(result.unwrap_err().to_string().contains("[mcp] requires an [llm] section"));
    }

    #[test]
    fn test_resolve_llm_key_from_env() {
        let dirs = make_dirs();
        let env_name = "DOCSITE_TEST_LLM_KEY_FROM_ENV";
        std::env::set_var(env_name, TEST_KEY);
        let file_config = FileConfig {
            llm: Some(LlmConfig {
                key_env: Some(env_name.to_string()),
                groups: vec![vec!["/internal".into()]],
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli_for(&dirs), Some(file_config)).unwrap();
        std::env::remove_var(env_name);

        assert_eq!(config.llm.as_ref().unwrap().key, TEST_KEY);
        assert!(config.build_llm_runtime().unwrap().is_some());
    }

    #[test]
    fn test_resolve_llm_key_missing_error() {
        let dirs = make_dirs();
        let file_config = FileConfig {
            llm: Some(LlmConfig {
                key_env: Some("DOCSITE_TEST_UNSET_KEY_VARIABLE".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli_for(&dirs), Some(file_config));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("LLM token key missing"));
    }

    #[test]
    fn test_invalid_group_config_fails_runtime() {
        let dirs = make_dirs();
        let file_config = FileConfig {
            llm: Some(LlmConfig {
                key: Some(TEST_KEY.to_string()),
                groups: (0..9).map(|i| vec![format!("/g{}", i).into()]).collect(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli_for(&dirs), Some(file_config)).unwrap();
        let err = config.build_llm_runtime().unwrap_err();
        assert!(err.to_string().contains("8 groups"));
    }
}
