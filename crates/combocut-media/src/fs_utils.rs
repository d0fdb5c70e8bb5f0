//! Filesystem helpers for render working directories.
//!
//! Removal helpers treat "already gone" as success and only log other
//! failures: cleanup runs on error paths where the original error is the one
//! worth reporting.

use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::MediaResult;

/// Create `dir` and all missing parents.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    fs::create_dir_all(dir.as_ref()).await?;
    Ok(())
}

/// Remove a file. Returns `true` if a file was deleted.
pub async fn remove_file_quietly(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed {}", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Failed to remove {}: {}", path.display(), e);
            false
        }
    }
}

/// Remove a directory tree. Returns `true` if a directory was deleted.
pub async fn remove_dir_quietly(dir: impl AsRef<Path>) -> bool {
    let dir = dir.as_ref();
    match fs::remove_dir_all(dir).await {
        Ok(()) => {
            debug!("Removed directory {}", dir.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Failed to remove directory {}: {}", dir.display(), e);
            false
        }
    }
}

/// Whether `path` is an existing, non-empty regular file.
pub async fn is_nonempty_file(path: impl AsRef<Path>) -> bool {
    match fs::metadata(path.as_ref()).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}
