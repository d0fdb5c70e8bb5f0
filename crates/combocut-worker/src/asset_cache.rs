//! Job-scoped cache of downloaded assets.
//!
//! Every URL is downloaded at most once per job. Files land in
//! `<root>/<subfolder>/<last URL path segment>`, and that path is the cache
//! key: two different URLs ending in the same segment resolve to whichever
//! was downloaded first. The collision is logged, not resolved.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use combocut_media::fs_utils::is_nonempty_file;
use combocut_media::{derive_file_name, MediaResult, RemoteFetcher};

#[derive(Debug)]
struct CacheEntry {
    /// URL that first claimed this path
    url: String,
    path: OnceCell<PathBuf>,
}

/// Download-once cache rooted at a job working directory.
pub struct AssetCache {
    root: PathBuf,
    fetcher: Arc<dyn RemoteFetcher>,
    entries: Mutex<HashMap<PathBuf, Arc<CacheEntry>>>,
    downloads: AtomicUsize,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        Self {
            root: root.into(),
            fetcher,
            entries: Mutex::new(HashMap::new()),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of downloads this cache has started.
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::Relaxed)
    }

    /// Local path for `url`, downloading it into `subfolder` on first use.
    ///
    /// Concurrent callers for the same path share one download. A failed
    /// download is not remembered, so a later call tries again.
    pub async fn resolve(&self, url: &str, subfolder: &str) -> MediaResult<PathBuf> {
        let file_name = derive_file_name(url)?;
        let dest = self.root.join(subfolder).join(file_name);

        let entry = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(dest.clone()).or_insert_with(|| {
                Arc::new(CacheEntry {
                    url: url.to_string(),
                    path: OnceCell::new(),
                })
            }))
        };

        if entry.url != url {
            warn!(
                "Cache key collision: {} resolves to {} already claimed by {}",
                url,
                dest.display(),
                entry.url
            );
        }

        let path = entry
            .path
            .get_or_try_init(|| async {
                // Leftover from an earlier attempt in this working directory
                if is_nonempty_file(&dest).await {
                    debug!("Reusing existing {}", dest.display());
                    return Ok(dest.clone());
                }
                self.downloads.fetch_add(1, Ordering::Relaxed);
                self.fetcher.fetch(url, &dest).await?;
                Ok::<_, combocut_media::MediaError>(dest.clone())
            })
            .await?;

        Ok(path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use combocut_media::MediaError;
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    /// Writes the URL as file content and counts calls.
    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
        fail_first: AtomicBool,
    }

    #[async_trait]
    impl RemoteFetcher for CountingFetcher {
        async fn fetch(&self, url: &str, dest: &Path) -> MediaResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Give concurrent callers a chance to pile up
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            if self.fail_first.swap(false, Ordering::SeqCst) {
                return Err(MediaError::HttpStatus {
                    url: url.to_string(),
                    status: 502,
                });
            }
            tokio::fs::create_dir_all(dest.parent().unwrap()).await?;
            tokio::fs::write(dest, url.as_bytes()).await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_same_url_downloads_once() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = AssetCache::new(dir.path(), fetcher.clone());

        let first = cache.resolve("https://cdn.example.com/v/a1.mp4", "videos").await.unwrap();
        let second = cache.resolve("https://cdn.example.com/v/a1.mp4", "videos").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("videos").join("a1.mp4"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.download_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_download() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = Arc::new(AssetCache::new(dir.path(), fetcher.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.resolve("https://cdn.example.com/a/track.mp3", "audio").await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_download_is_retried() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher {
            fail_first: AtomicBool::new(true),
            ..Default::default()
        });
        let cache = AssetCache::new(dir.path(), fetcher.clone());
        let url = "https://cdn.example.com/v/b1.mp4";

        assert!(cache.resolve(url, "videos").await.is_err());
        let path = cache.resolve(url, "videos").await.unwrap();

        assert!(path.exists());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_same_segment_collision_short_circuits() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = AssetCache::new(dir.path(), fetcher.clone());

        let a = cache.resolve("https://one.example.com/intro.mp4", "videos").await.unwrap();
        let b = cache.resolve("https://two.example.com/intro.mp4", "videos").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        let content = tokio::fs::read_to_string(&a).await.unwrap();
        assert_eq!(content, "https://one.example.com/intro.mp4");
    }

    #[tokio::test]
    async fn test_subfolders_are_separate_keys() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = AssetCache::new(dir.path(), fetcher.clone());

        cache.resolve("https://cdn.example.com/x/clip.mp4", "videos").await.unwrap();
        cache.resolve("https://cdn.example.com/x/clip.mp4", "audio").await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unnamed_url_is_fetch_error() {
        let dir = TempDir::new().unwrap();
        let cache = AssetCache::new(dir.path(), Arc::new(CountingFetcher::default()));
        let err = cache.resolve("https://cdn.example.com/", "videos").await.unwrap_err();
        assert!(err.is_fetch_error());
    }
}
