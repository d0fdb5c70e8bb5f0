//! Remote asset download over HTTP(S).
//!
//! Assets are streamed to a `.part` file next to the destination and renamed
//! into place once the body is complete, so a file at the destination path is
//! always a finished download.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{ensure_dir, remove_file_quietly};

/// Default connect timeout for asset downloads.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default overall timeout for one asset download.
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Derive the local file name for a URL: its last non-empty path segment.
///
/// Query strings and fragments are ignored.
pub fn derive_file_name(url: &str) -> MediaResult<String> {
    let parsed = Url::parse(url).map_err(|_| MediaError::UnnamedUrl(url.to_string()))?;

    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .filter(|name| *name != "." && *name != "..")
        .map(ToString::to_string)
        .ok_or_else(|| MediaError::UnnamedUrl(url.to_string()))
}

/// Fetches a remote asset to a local path.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Download `url` to `dest`, overwriting any existing file.
    async fn fetch(&self, url: &str, dest: &Path) -> MediaResult<()>;
}

/// [`RemoteFetcher`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with default timeouts.
    pub fn new() -> MediaResult<Self> {
        Self::with_timeout(DEFAULT_DOWNLOAD_TIMEOUT)
    }

    /// Create a fetcher with a custom per-download timeout.
    pub fn with_timeout(timeout: Duration) -> MediaResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::download_failed("<client>", e.to_string()))?;

        Ok(Self { http })
    }

    /// Wrap an existing client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn stream_to(&self, url: &str, part: &Path) -> MediaResult<u64> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::download_failed(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = fs::File::create(part).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| MediaError::download_failed(url, e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        Ok(written)
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> MediaResult<()> {
        if let Some(parent) = dest.parent() {
            ensure_dir(parent).await?;
        }

        let part = part_path(dest);
        debug!("Downloading {} -> {}", url, part.display());

        match self.stream_to(url, &part).await {
            Ok(bytes) => {
                fs::rename(&part, dest).await?;
                info!("Downloaded {} ({} bytes)", url, bytes);
                Ok(())
            }
            Err(e) => {
                remove_file_quietly(&part).await;
                Err(e)
            }
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_derive_file_name() {
        assert_eq!(
            derive_file_name("https://cdn.example.com/videos/intro.mp4").unwrap(),
            "intro.mp4"
        );
        assert_eq!(
            derive_file_name("https://cdn.example.com/a/b/track.mp3?sig=abc#t=1").unwrap(),
            "track.mp3"
        );
        assert_eq!(
            derive_file_name("https://cdn.example.com/clips/outro.mp4/").unwrap(),
            "outro.mp4"
        );
    }

    #[test]
    fn test_derive_file_name_rejects_bare_host() {
        assert!(matches!(
            derive_file_name("https://cdn.example.com/"),
            Err(MediaError::UnnamedUrl(_))
        ));
        assert!(derive_file_name("not a url").is_err());
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/tmp/job/videos/a.mp4")),
            PathBuf::from("/tmp/job/videos/a.mp4.part")
        );
    }

    #[tokio::test]
    async fn test_fetch_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v/a.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-mp4".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("videos").join("a.mp4");
        let fetcher = HttpFetcher::new().unwrap();

        fetcher
            .fetch(&format!("{}/v/a.mp4", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(fs::read(&dest).await.unwrap(), b"fake-mp4");
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_fetch_http_error_leaves_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("missing.mp4");
        let fetcher = HttpFetcher::new().unwrap();

        let err = fetcher
            .fetch(&format!("{}/missing.mp4", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::HttpStatus { status: 404, .. }));
        assert!(err.is_fetch_error());
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }
}
