//! Content tree discovery
//!
//! Walks the content directory, maps markdown files to page paths and builds
//! the navigation tree used by the sidebar, the `.md` page index and search.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use super::render::parse_frontmatter;
use super::types::{ContentDir, ContentFile, ContentNode, PageMeta, SidebarEntry, DEFAULT_ORDER};
use super::ContentError;

/// One markdown file found on disk.
#[derive(Debug, Clone)]
pub struct DiscoveredPage {
    pub path: String,
    pub meta: PageMeta,
    pub has_content: bool,
}

/// Maps a file under `content_dir` to its page path:
/// `index.md` is `/`, `a/index.md` is `/a`, `a/b.md` is `/a/b`.
/// Returns `None` for anything that is not a markdown file inside the directory.
pub fn page_path_for_file(content_dir: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(content_dir).ok()?;
    if relative.extension().and_then(|e| e.to_str()) != Some("md") {
        return None;
    }

    let mut parts: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if parts.last().map(String::as_str) == Some("index") {
        parts.pop();
    }
    Some(format!("/{}", parts.join("/")))
}

/// "quick-start" -> "Quick Start", "apiReference" -> "Api Reference".
pub fn capital_case(segment: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower_or_digit = false;

    for c in segment.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower_or_digit = false;
            continue;
        }
        if c.is_uppercase() && prev_lower_or_digit && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower_or_digit = c.is_lowercase() || c.is_numeric();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads every `*.md` under `content_dir` with its frontmatter.
pub fn discover_pages(content_dir: &Path) -> Result<Vec<DiscoveredPage>, ContentError> {
    let mut pages = Vec::new();

    for entry in WalkDir::new(content_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ContentError::Walk(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = page_path_for_file(content_dir, entry.path()) else {
            continue;
        };

        let raw = std::fs::read_to_string(entry.path()).map_err(|e| ContentError::Io {
            path: entry.path().to_path_buf(),
            source: e,
        })?;
        let (meta, body) = parse_frontmatter(&raw).map_err(|e| e.in_file(entry.path()))?;

        debug!("Discovered {} ({:?})", path, entry.path());
        pages.push(DiscoveredPage {
            path,
            meta,
            has_content: !body.trim().is_empty(),
        });
    }

    Ok(pages)
}

pub fn build_content_index(content_dir: &Path) -> Result<Vec<ContentNode>, ContentError> {
    Ok(build_tree(discover_pages(content_dir)?))
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|p| !p.is_empty()).collect()
}

fn parent_path(parts: &[&str]) -> String {
    format!("/{}", parts[..parts.len() - 1].join("/"))
}

/// Assembles the navigation tree. Folders are implied by file paths; a
/// folder's `index.md` only contributes its title, order and visibility.
pub fn build_tree(pages: Vec<DiscoveredPage>) -> Vec<ContentNode> {
    let mut tree: Vec<ContentNode> = Vec::new();
    let mut folders: BTreeMap<String, ContentDir> = BTreeMap::new();

    for page in &pages {
        let parts = segments(&page.path);
        for i in 0..parts.len().saturating_sub(1) {
            let folder_path = format!("/{}", parts[..=i].join("/"));
            folders.entry(folder_path.clone()).or_insert_with(|| ContentDir {
                path: folder_path,
                title: capital_case(parts[i]),
                order: DEFAULT_ORDER,
                children: Vec::new(),
                index_path: None,
                hidden: false,
            });
        }
    }

    for page in pages {
        let parts = segments(&page.path);
        let hidden = page.meta.is_hidden();
        let order = page.meta.order.unwrap_or(DEFAULT_ORDER);

        if page.path == "/" {
            if page.has_content {
                tree.push(ContentNode::File(ContentFile {
                    path: page.path,
                    title: page.meta.title.clone().unwrap_or_else(|| "Index".to_string()),
                    order,
                    visibility: page.meta.visibility_tags(),
                    hidden,
                    meta: page.meta,
                }));
            }
            continue;
        }

        if let Some(folder) = folders.get_mut(&page.path) {
            if let Some(title) = &page.meta.title {
                folder.title = title.clone();
            }
            folder.order = order;
            folder.hidden = hidden;
            if page.has_content {
                folder.index_path = Some(page.path.clone());
            }
            continue;
        }

        if !page.has_content {
            continue;
        }

        let title = match &page.meta.title {
            Some(title) => title.clone(),
            None => capital_case(parts.last().copied().unwrap_or_default()),
        };
        let node = ContentNode::File(ContentFile {
            path: page.path.clone(),
            title,
            order,
            visibility: page.meta.visibility_tags(),
            hidden,
            meta: page.meta,
        });

        if parts.len() > 1 {
            if let Some(parent) = folders.get_mut(&parent_path(&parts)) {
                parent.children.push(node);
                continue;
            }
        }
        tree.push(node);
    }

    // Deepest folders first so every parent is still in the map.
    let mut folder_paths: Vec<String> = folders.keys().cloned().collect();
    folder_paths.sort_by_key(|p| std::cmp::Reverse(segments(p).len()));

    for path in folder_paths {
        let Some(folder) = folders.remove(&path) else {
            continue;
        };
        let parts = segments(&path);
        if parts.len() == 1 {
            tree.push(ContentNode::Dir(folder));
        } else if let Some(parent) = folders.get_mut(&parent_path(&parts)) {
            parent.children.push(ContentNode::Dir(folder));
        }
    }

    sort_nodes(&mut tree);
    tree
}

fn sort_nodes(nodes: &mut [ContentNode]) {
    nodes.sort_by(|a, b| {
        a.order()
            .cmp(&b.order())
            .then_with(|| a.title().to_lowercase().cmp(&b.title().to_lowercase()))
            .then_with(|| a.title().cmp(b.title()))
    });
    for node in nodes.iter_mut() {
        if let ContentNode::Dir(dir) = node {
            sort_nodes(&mut dir.children);
        }
    }
}

/// Pages in navigation order. With a `filter`, files carrying visibility tags
/// are kept only when one of their tags is in the filter.
pub fn flatten_for_sidebar(nodes: &[ContentNode], filter: Option<&[String]>) -> Vec<SidebarEntry> {
    let mut result = Vec::new();
    flatten_into(nodes, filter, &mut result);
    result
}

fn flatten_into(nodes: &[ContentNode], filter: Option<&[String]>, out: &mut Vec<SidebarEntry>) {
    for node in nodes {
        match node {
            ContentNode::Dir(dir) => {
                if let Some(index_path) = &dir.index_path {
                    out.push(SidebarEntry {
                        path: index_path.clone(),
                        title: dir.title.clone(),
                    });
                }
                flatten_into(&dir.children, filter, out);
            }
            ContentNode::File(file) => {
                if let Some(filter) = filter {
                    if !file.visibility.is_empty()
                        && !file.visibility.iter().any(|v| filter.contains(v))
                    {
                        continue;
                    }
                }
                out.push(SidebarEntry {
                    path: file.path.clone(),
                    title: file.title.clone(),
                });
            }
        }
    }
}

/// Flat page path to title map, used for search result headers.
pub fn title_map(nodes: &[ContentNode]) -> BTreeMap<String, String> {
    flatten_for_sidebar(nodes, None)
        .into_iter()
        .map(|entry| (entry.path, entry.title))
        .collect()
}
