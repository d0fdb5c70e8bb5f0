//! Object store capability.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

/// Stores local files under remote keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `local_path` to `key`, replacing any existing object.
    async fn store(&self, local_path: &Path, key: &str) -> StorageResult<()>;
}

/// Content type for an upload, by file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mp3") => "audio/mpeg",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Reject keys that object stores treat inconsistently.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part.is_empty() || part == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("/tmp/promo_combo_0.mp4")), "video/mp4");
        assert_eq!(content_type_for(Path::new("clip.MP4")), "video/mp4");
        assert_eq!(content_type_for(Path::new("clip.webm")), "video/webm");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("promo/promo_combo_0.mp4").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/promo/a.mp4").is_err());
        assert!(validate_key("promo//a.mp4").is_err());
        assert!(validate_key("promo/../a.mp4").is_err());
    }
}
