use super::assets::DEFAULT_HASH_FILES;
use super::RequestsLoggingLevel;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub host: String,
    pub port: u16,
    pub site_title: String,
    /// Shown by templates, "dev" unless configured.
    pub version: String,
    pub static_dir: Option<PathBuf>,
    pub static_cache_age_sec: usize,
    /// Static files whose content hash is exposed to templates as `fileHashes`.
    pub hash_files: Vec<String>,
    /// Reload templates on every render and never cache scripts or styles.
    pub dev: bool,
    /// Extra variables for every template render.
    pub template_globals: BTreeMap<String, serde_json::Value>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            host: "127.0.0.1".to_string(),
            port: 3000,
            site_title: "Documentation".to_string(),
            version: "dev".to_string(),
            static_dir: None,
            static_cache_age_sec: 3600,
            hash_files: DEFAULT_HASH_FILES.iter().map(|f| f.to_string()).collect(),
            dev: false,
            template_globals: BTreeMap::new(),
        }
    }
}
