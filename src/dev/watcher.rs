//! Content watcher
//!
//! Recompiles pages while the server runs. Edits to existing files recompile
//! just those pages; anything that changes the set of files (create, remove,
//! rename) rebuilds the whole site.

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::content::{page_path_for_file, ContentCache, ContentError};

/// Quiet period before a burst of events is applied.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

fn is_watched_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md") && !path.to_string_lossy().contains(".git")
}

/// Changes collected during one debounce window.
#[derive(Debug, Default, PartialEq)]
struct ChangeBatch {
    paths: BTreeSet<PathBuf>,
    /// Files were added, removed or renamed.
    structural: bool,
}

impl ChangeBatch {
    fn add(&mut self, event: &Event) {
        // Our own reads show up as access events.
        if matches!(event.kind, EventKind::Access(_)) {
            return;
        }
        let paths: Vec<&PathBuf> = event.paths.iter().filter(|p| is_watched_path(p)).collect();
        if paths.is_empty() {
            return;
        }

        let edit = matches!(&event.kind, EventKind::Modify(kind) if !matches!(kind, ModifyKind::Name(_)));
        if !edit {
            self.structural = true;
        }
        self.paths.extend(paths.into_iter().cloned());
    }

    fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn apply_changes(
    cache: &ContentCache,
    content_dir: &Path,
    batch: &ChangeBatch,
) -> Result<(), ContentError> {
    if batch.structural {
        info!("Rebuilding content index...");
        return cache.rebuild();
    }

    for path in &batch.paths {
        if let Some(page_path) = page_path_for_file(content_dir, path) {
            info!("Updating {}...", page_path);
            cache.update_page(&page_path)?;
        }
    }
    cache.rebuild_index()
}

async fn watch_loop(mut rx: UnboundedReceiver<Event>, cache: ContentCache, content_dir: PathBuf) {
    while let Some(event) = rx.recv().await {
        let mut batch = ChangeBatch::default();
        batch.add(&event);
        if batch.is_empty() {
            continue;
        }

        // Keep collecting until the directory has been quiet for DEBOUNCE.
        while let Ok(Some(event)) = tokio::time::timeout(DEBOUNCE, rx.recv()).await {
            batch.add(&event);
        }

        let cache = cache.clone();
        let content_dir = content_dir.clone();
        let outcome =
            tokio::task::spawn_blocking(move || apply_changes(&cache, &content_dir, &batch)).await;
        match outcome {
            Ok(Ok(())) => info!("OK: Content rebuilt"),
            Ok(Err(err)) => error!("FAILED: Rebuild failed: {}", err),
            Err(err) => error!("FAILED: Rebuild task failed: {}", err),
        }
    }
}

/// Running watcher. Dropping it stops watching.
pub struct ContentWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for ContentWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Watches the cache's content directory and keeps the cache up to date.
/// Must be called from within a tokio runtime.
pub fn start_content_watcher(cache: ContentCache) -> Result<ContentWatcher> {
    info!("Starting markdown file watcher...");
    let content_dir = cache
        .content_dir()
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", cache.content_dir().display()))?;

    let (tx, rx) = unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let _ = tx.send(event);
        }
        Err(err) => warn!("Watch error: {}", err),
    })
    .context("Failed to create file watcher")?;
    watcher
        .watch(&content_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", content_dir.display()))?;

    let task = tokio::spawn(watch_loop(rx, cache, content_dir));
    Ok(ContentWatcher {
        _watcher: watcher,
        task,
    })
}
