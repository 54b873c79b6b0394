use anyhow::{Context, Result};
use clap::Parser;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docsite::cli_style::get_styles;
use docsite::config;
use docsite::content::ContentCache;
use docsite::dev::start_content_watcher;
use docsite::server::{run_server, RequestsLoggingLevel, Templates};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles(), version = env!("APP_VERSION"))]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing the markdown pages.
    /// Can also be specified in config file.
    #[clap(value_parser = parse_path)]
    pub content_dir: Option<PathBuf>,

    /// Directory containing layout.html. Defaults to ./templates.
    #[clap(long, value_parser = parse_path)]
    pub templates_dir: Option<PathBuf>,

    /// Directory to be statically served under /static.
    #[clap(long, value_parser = parse_path)]
    pub static_dir: Option<PathBuf>,

    /// The address to bind.
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Site title shown in page titles and the MCP server name.
    #[clap(long)]
    pub site_title: Option<String>,

    /// The maximum age of static files in the browser cache in seconds.
    #[clap(long, default_value_t = 3600)]
    pub static_cache_age_sec: usize,

    /// Watch the content directory and reload templates on every request.
    #[clap(long)]
    pub dev: bool,

    /// Compile every page, report problems and exit.
    #[clap(long)]
    pub check_only: bool,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            content_dir: args.content_dir.clone(),
            templates_dir: args.templates_dir.clone(),
            static_dir: args.static_dir.clone(),
            host: args.host.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            site_title: args.site_title.clone(),
            static_cache_age_sec: args.static_cache_age_sec,
            dev: args.dev,
        }
    }
}

fn check_content(content: &ContentCache) -> Result<()> {
    match content.build() {
        Ok(()) => {
            let data = content.snapshot();
            println!("Content checked, no issues found.");
            println!(
                "Content has:\n{} pages\n{} top-level items",
                data.pages.len(),
                data.content_index.len()
            );
            Ok(())
        }
        Err(err) => {
            println!("Check the problems above, the content could not be built.");
            Err(err.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  content_dir: {:?}", app_config.content_dir);
    info!("  templates_dir: {:?}", app_config.templates_dir());
    info!("  static_dir: {:?}", app_config.static_dir);
    info!("  dev: {}", app_config.dev);

    let content = ContentCache::new(app_config.content_dir.clone());
    if cli_args.check_only {
        return check_content(&content);
    }
    content.build().context("Initial content build failed")?;

    let templates = if app_config.dev {
        Templates::filesystem(app_config.templates_dir())
    } else {
        Templates::bundled(app_config.templates_dir())?
    };

    let llm = app_config.build_llm_runtime()?;
    match &llm {
        Some(rt) => info!(
            "LLM tokens enabled: {} permission groups, {}h expiry",
            rt.groups().len(),
            rt.expires_in_hours()
        ),
        None => info!("LLM tokens disabled, every page is public"),
    }
    if let Some(mcp) = &app_config.mcp {
        info!("MCP endpoint enabled as {:?}", mcp.name);
    }

    // Kept alive until the server stops.
    let _watcher = if app_config.dev {
        Some(start_content_watcher(content.clone())?)
    } else {
        None
    };

    info!("Ready to serve at port {}!", app_config.port);
    run_server(
        app_config.server_config(),
        content,
        templates,
        llm,
        app_config.mcp.clone(),
    )
    .await
}
