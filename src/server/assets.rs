//! Static assets and cache-busting hashes

use axum::{middleware, Router};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use tower_http::services::ServeDir;
use tracing::{debug, warn};

use super::{http_cache, StaticCachePolicy};

pub const DEFAULT_HASH_FILES: &[&str] = &["output.css", "main.js"];

const HASH_CHARS: usize = 10;

/// First 10 hex characters of the file's SHA-256.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    let mut hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex.truncate(HASH_CHARS);
    Ok(hex)
}

/// `/static/<file>` to content hash. Files that cannot be read are skipped.
pub fn build_file_hashes(static_dir: &Path, files: &[String]) -> BTreeMap<String, String> {
    let mut hashes = BTreeMap::new();
    for file in files {
        match hash_file(&static_dir.join(file)) {
            Ok(hash) => {
                debug!("Hashed /static/{} = {}", file, hash);
                hashes.insert(format!("/static/{}", file), hash);
            }
            Err(err) => warn!("Skipping hash of {}: {}", file, err),
        }
    }
    hashes
}

/// Router serving `static_dir` under `/static`.
pub fn make_static_routes(static_dir: &Path, policy: StaticCachePolicy) -> Router {
    Router::new()
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(policy, http_cache))
}
