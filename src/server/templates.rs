//! Page templates
//!
//! Pages are rendered through `layout.html` with minijinja. In production every
//! `*.html` under the templates directory is read once at startup; in dev mode
//! templates are loaded from disk on every render so edits show up on reload.

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

pub const LAYOUT_TEMPLATE: &str = "layout.html";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to load templates from {path:?}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Template error: {0}")]
    Render(#[from] minijinja::Error),
}

enum TemplateSource {
    Bundled(Environment<'static>),
    Filesystem(PathBuf),
}

pub struct Templates {
    source: TemplateSource,
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            TemplateSource::Bundled(_) => f.write_str("Templates::Bundled"),
            TemplateSource::Filesystem(dir) => write!(f, "Templates::Filesystem({:?})", dir),
        }
    }
}

fn configure(env: &mut Environment<'static>) {
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.set_undefined_behavior(UndefinedBehavior::Lenient);
}

impl Templates {
    /// Reads every `*.html` under `dir`, keyed by its path relative to `dir`.
    pub fn bundled(dir: &Path) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        configure(&mut env);

        let load_error = |message: String| TemplateError::Load {
            path: dir.to_path_buf(),
            message,
        };

        let mut count = 0usize;
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| load_error(e.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("html")
            {
                continue;
            }
            let name = path
                .strip_prefix(dir)
                .map_err(|e| load_error(e.to_string()))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let source =
                std::fs::read_to_string(path).map_err(|e| load_error(format!("{:?}: {}", path, e)))?;
            debug!("Bundling template {}", name);
            env.add_template_owned(name, source)?;
            count += 1;
        }

        if env.get_template(LAYOUT_TEMPLATE).is_err() {
            return Err(load_error(format!("missing {}", LAYOUT_TEMPLATE)));
        }

        info!("Loaded {} templates from {:?}", count, dir);
        Ok(Self {
            source: TemplateSource::Bundled(env),
        })
    }

    /// Templates read from disk on every render.
    pub fn filesystem(dir: &Path) -> Self {
        Self {
            source: TemplateSource::Filesystem(dir.to_path_buf()),
        }
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, TemplateError> {
        match &self.source {
            TemplateSource::Bundled(env) => Ok(env.get_template(name)?.render(ctx)?),
            TemplateSource::Filesystem(dir) => {
                let mut env = Environment::new();
                configure(&mut env);
                env.set_loader(minijinja::path_loader(dir));
                Ok(env.get_template(name)?.render(ctx)?)
            }
        }
    }
}
