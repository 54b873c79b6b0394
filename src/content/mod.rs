//! Markdown content: discovery, rendering and the in-memory page cache.

mod cache;
mod discovery;
mod render;
mod types;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use cache::{ContentCache, ContentData};
pub use discovery::{
    build_content_index, build_tree, capital_case, discover_pages, flatten_for_sidebar,
    page_path_for_file, title_map, DiscoveredPage,
};
pub use render::{extract_toc, parse_frontmatter, render_markdown, RenderedMarkdown};
pub use types::{
    CachedPage, ContentDir, ContentFile, ContentNode, PageMeta, SidebarEntry, TocItem,
    DEFAULT_ORDER,
};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Invalid frontmatter: {0}")]
    Frontmatter(String),

    #[error("Failed to walk content directory: {0}")]
    Walk(String),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?}: {message}")]
    InFile { path: PathBuf, message: String },

    #[error("File not found for {0}")]
    NotFound(String),

    #[error("Failed to compile {failed} page(s)")]
    Build { failed: usize },
}

impl ContentError {
    /// Attaches the offending file to an error that does not carry one yet.
    pub fn in_file(self, path: &Path) -> ContentError {
        match self {
            ContentError::Io { .. } | ContentError::InFile { .. } => self,
            other => ContentError::InFile {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        }
    }
}
