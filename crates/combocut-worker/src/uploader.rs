//! Upload of rendered combinations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use combocut_media::fs_utils::remove_file_quietly;
use combocut_storage::{ObjectStore, StorageResult};

/// An exported file and the key it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutput {
    pub local_path: PathBuf,
    pub remote_key: String,
}

/// Publishes rendered outputs to object storage.
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Upload `output`, then delete the local file whatever the outcome.
    ///
    /// A failed upload loses the artifact; the caller records the failure.
    pub async fn upload(&self, output: &RenderedOutput) -> StorageResult<()> {
        let start = Instant::now();
        let result = self.store.store(&output.local_path, &output.remote_key).await;
        remove_file_quietly(&output.local_path).await;

        if result.is_ok() {
            crate::metrics::record_upload_duration(start.elapsed().as_secs_f64());
            info!(
                "Uploaded {} in {:.2}s",
                output.remote_key,
                start.elapsed().as_secs_f64()
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use tempfile::TempDir;

    async fn rendered(dir: &TempDir, name: &str) -> RenderedOutput {
        let local_path = dir.path().join(name);
        tokio::fs::write(&local_path, b"fake mp4").await.unwrap();
        RenderedOutput {
            local_path,
            remote_key: format!("promo/{name}"),
        }
    }

    #[tokio::test]
    async fn test_successful_upload_removes_local_file() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::default());
        let output = rendered(&dir, "promo_combo_0.mp4").await;

        Uploader::new(store.clone()).upload(&output).await.unwrap();

        assert_eq!(store.keys(), vec!["promo/promo_combo_0.mp4".to_string()]);
        assert!(!output.local_path.exists());
    }

    #[tokio::test]
    async fn test_failed_upload_still_removes_local_file() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::failing_on(&["promo/promo_combo_1.mp4"]));
        let output = rendered(&dir, "promo_combo_1.mp4").await;

        let err = Uploader::new(store.clone()).upload(&output).await.unwrap_err();

        assert!(err.to_string().contains("503"));
        assert!(store.keys().is_empty());
        assert!(!output.local_path.exists());
    }
}
