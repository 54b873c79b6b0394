//! Test site creation

use super::constants::*;
use anyhow::Result;
use docsite::llm_tokens::{GroupEntry, HmacSha256Key, LlmTokenRuntime, PrimaryAuth};
use docsite::server::SharedSecretAuth;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// The layout shipped with the repository.
const LAYOUT_HTML: &str = include_str!("../../templates/layout.html");
const MAIN_JS: &str = include_str!("../../static/main.js");
const OUTPUT_CSS: &str = include_str!("../../static/output.css");

pub struct SitePaths {
    pub content_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
}

fn write(root: &Path, relative: &str, contents: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Creates a temporary site with public, internal and partner pages.
/// Returns (temp_dir, paths)
pub fn create_test_site() -> Result<(TempDir, SitePaths)> {
    let dir = TempDir::new()?;
    let paths = SitePaths {
        content_dir: dir.path().join("content"),
        templates_dir: dir.path().join("templates"),
        static_dir: dir.path().join("static"),
    };

    let content = &paths.content_dir;
    write(
        content,
        "index.md",
        "---\ntitle: Home\n---\n# Welcome\n\nStart with the guides.\n",
    )?;
    write(
        content,
        "guides/index.md",
        "---\ntitle: Guides\norder: 1\n---\n# Guides\n",
    )?;
    write(
        content,
        "guides/setup.md",
        "---\ntitle: Setup\norder: 1\n---\n# Setup\n\n## Install\n\nInstall the ingest binary.\n",
    )?;
    write(
        content,
        "internal/runbook.md",
        "---\ntitle: Runbook\norder: 2\n---\n# Runbook\n\nRestart the ingest workers one at a time.\n",
    )?;
    write(
        content,
        "partners/pricing.md",
        "---\ntitle: Pricing\norder: 3\n---\n# Pricing\n\nVolume discounts start at ten seats.\n",
    )?;

    write(&paths.templates_dir, "layout.html", LAYOUT_HTML)?;
    write(&paths.static_dir, "main.js", MAIN_JS)?;
    write(&paths.static_dir, "output.css", OUTPUT_CSS)?;

    Ok((dir, paths))
}

/// Token runtime matching the test server: group 0 is `/internal`,
/// group 1 is `/partners`.
pub fn test_runtime(primary_auth: bool) -> LlmTokenRuntime {
    let key = HmacSha256Key::from_base64(TEST_LLM_KEY).expect("Invalid test key");
    let auth: Option<Arc<dyn PrimaryAuth>> = if primary_auth {
        Some(Arc::new(SharedSecretAuth::new(SESSION_COOKIE, SESSION_SECRET)))
    } else {
        None
    };
    LlmTokenRuntime::new(
        vec![
            vec![GroupEntry::new("/internal")],
            vec![GroupEntry::new("/partners")],
        ],
        Arc::new(key),
        None,
        auth,
    )
    .expect("Invalid test runtime")
}
