use std::collections::BTreeMap;

use super::McpAuth;

pub const MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub path: &'a str,
    pub title: &'a str,
    pub markdown: &'a str,
}

/// Pages whose markdown contains every whitespace-separated word of `query`
/// (case-insensitive), optionally under `topic`, that `auth` may read.
/// Pages are scanned in path order and at most [`MAX_RESULTS`] are returned.
pub fn search_markdown<'a>(
    query: &str,
    topic: Option<&str>,
    markdown: &'a BTreeMap<String, String>,
    titles: &'a BTreeMap<String, String>,
    auth: &dyn McpAuth,
) -> Vec<SearchHit<'a>> {
    let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for (path, md) in markdown {
        if let Some(topic) = topic {
            if !path.starts_with(topic) {
                continue;
            }
        }
        if !auth.can_access(path) {
            continue;
        }

        let haystack = md.to_lowercase();
        if words.iter().all(|w| haystack.contains(w.as_str())) {
            hits.push(SearchHit {
                path,
                title: titles.get(path).map(String::as_str).unwrap_or(path),
                markdown: md,
            });
        }

        if hits.len() >= MAX_RESULTS {
            break;
        }
    }
    hits
}

pub const NO_RESULTS: &str = "No matching documentation found.";

pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter()
        .map(|hit| format!("# {} — {}\n\n{}", hit.path, hit.title, hit.markdown))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
