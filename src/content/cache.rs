use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{error, info};

use super::discovery::{build_content_index, flatten_for_sidebar};
use super::render::{extract_toc, parse_frontmatter, render_markdown};
use super::types::{CachedPage, ContentNode};
use super::ContentError;

/// Everything the routes serve from memory.
#[derive(Debug, Clone, Default)]
pub struct ContentData {
    pub content_index: Vec<ContentNode>,
    /// Compiled HTML pages keyed by page path.
    pub pages: BTreeMap<String, CachedPage>,
    /// Raw markdown files (frontmatter included) keyed by page path.
    pub markdown: BTreeMap<String, String>,
}

/// Compiled content for one directory. Cloning shares the same data.
///
/// Readers take cheap [`ContentCache::snapshot`]s; rebuilds compile into a new
/// [`ContentData`] and swap it in, so a request never sees a half built site.
#[derive(Debug, Clone)]
pub struct ContentCache {
    content_dir: PathBuf,
    data: Arc<RwLock<Arc<ContentData>>>,
}

impl ContentCache {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            data: Arc::new(RwLock::new(Arc::new(ContentData::default()))),
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn snapshot(&self) -> Arc<ContentData> {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, next: ContentData) {
        let next = Arc::new(next);
        match self.data.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Discovers and compiles every page. Fails if any page fails, leaving the
    /// previous content in place.
    pub fn build(&self) -> Result<(), ContentError> {
        info!("Building content index...");
        let content_index = build_content_index(&self.content_dir)?;
        info!("Found {} top-level items", content_index.len());

        let data = self.compile_all(content_index)?;
        self.replace(data);
        Ok(())
    }

    pub fn rebuild(&self) -> Result<(), ContentError> {
        let content_index = build_content_index(&self.content_dir)?;
        let data = self.compile_all(content_index)?;
        self.replace(data);
        Ok(())
    }

    fn compile_all(&self, content_index: Vec<ContentNode>) -> Result<ContentData, ContentError> {
        info!("Building page cache...");
        let mut data = ContentData {
            content_index,
            ..Default::default()
        };

        let mut failed = 0usize;
        for entry in flatten_for_sidebar(&data.content_index, None) {
            match self.compile_page(&entry.path) {
                Ok((raw, page)) => {
                    info!("  ok {}", entry.path);
                    data.markdown.insert(entry.path.clone(), raw);
                    data.pages.insert(entry.path, page);
                }
                Err(err) => {
                    error!("  x {}: {}", entry.path, err);
                    failed += 1;
                }
            }
        }

        info!(
            "Page cache built: {} pages compiled, {} errors",
            data.pages.len(),
            failed
        );

        if failed > 0 {
            return Err(ContentError::Build { failed });
        }
        Ok(data)
    }

    fn compile_page(&self, page_path: &str) -> Result<(String, CachedPage), ContentError> {
        let file = self
            .find_file(page_path)
            .ok_or_else(|| ContentError::NotFound(page_path.to_string()))?;
        let raw = std::fs::read_to_string(&file).map_err(|e| ContentError::Io {
            path: file.clone(),
            source: e,
        })?;

        let (meta, body) = parse_frontmatter(&raw).map_err(|e| e.in_file(&file))?;
        let rendered = render_markdown(body);
        let toc = extract_toc(&rendered);
        let page = CachedPage {
            html: rendered.html,
            toc,
            meta,
        };
        Ok((raw, page))
    }

    /// Recompiles one page in place. A page whose file is gone is dropped.
    pub fn update_page(&self, page_path: &str) -> Result<(), ContentError> {
        let mut next = (*self.snapshot()).clone();
        match self.compile_page(page_path) {
            Ok((raw, page)) => {
                next.markdown.insert(page_path.to_string(), raw);
                next.pages.insert(page_path.to_string(), page);
            }
            Err(ContentError::NotFound(_)) => {
                next.markdown.remove(page_path);
                next.pages.remove(page_path);
            }
            Err(err) => return Err(err),
        }
        self.replace(next);
        Ok(())
    }

    /// Rebuilds the navigation tree without recompiling pages.
    pub fn rebuild_index(&self) -> Result<(), ContentError> {
        let content_index = build_content_index(&self.content_dir)?;
        let mut next = (*self.snapshot()).clone();
        next.content_index = content_index;
        self.replace(next);
        Ok(())
    }

    /// `<dir>/<path>/index.md`, then `<dir>/<path>.md`.
    pub fn find_file(&self, page_path: &str) -> Option<PathBuf> {
        let relative = page_path.trim_start_matches('/');
        if relative.split('/').any(|segment| segment == "..") {
            return None;
        }

        let base = if relative.is_empty() {
            self.content_dir.clone()
        } else {
            self.content_dir.join(relative)
        };

        let index = base.join("index.md");
        if index.is_file() {
            return Some(index);
        }
        let mut flat = base.into_os_string();
        flat.push(".md");
        let flat = PathBuf::from(flat);
        flat.is_file().then_some(flat)
    }
}
