//! Development mode helpers

mod watcher;

pub use watcher::{start_content_watcher, ContentWatcher, DEBOUNCE};
