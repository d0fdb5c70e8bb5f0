//! Capability stubs shared by the worker unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use combocut_media::{
    ComposedClip, ExportOptions, MediaError, MediaInfo, MediaResult, MediaToolkit, RemoteFetcher,
};
use combocut_storage::{ObjectStore, StorageError, StorageResult};
use combocut_tts::{SpeechSynthesizer, TtsError, TtsResult};

/// Writes the URL as file content. URLs in `failing` answer 404.
#[derive(Default)]
pub struct WritingFetcher {
    calls: Mutex<HashMap<String, usize>>,
    failing: HashSet<String>,
}

impl WritingFetcher {
    pub fn failing_on(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl RemoteFetcher for WritingFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> MediaResult<()> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        if self.failing.contains(url) {
            return Err(MediaError::HttpStatus {
                url: url.to_string(),
                status: 404,
            });
        }
        tokio::fs::create_dir_all(dest.parent().unwrap()).await?;
        tokio::fs::write(dest, url.as_bytes()).await?;
        Ok(())
    }
}

/// Counts synthesis calls and either returns fake MP3 bytes or a 500.
pub struct RecordingSynthesizer {
    fail: bool,
    calls: AtomicUsize,
}

impl RecordingSynthesizer {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynthesizer {
    async fn synthesize(&self, _text: &str, _voice: &str) -> TtsResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TtsError::RequestFailed {
                status: 500,
                body: "voice service unavailable".to_string(),
            });
        }
        Ok(b"ID3-fake-voice".to_vec())
    }
}

/// Probes every file as a 1080x1920 video of a fixed length and "exports"
/// by writing a placeholder file.
pub struct FakeMedia {
    duration: f64,
    failing_outputs: HashSet<String>,
    exports: Mutex<Vec<ComposedClip>>,
}

impl FakeMedia {
    pub fn with_default_duration(duration: f64) -> Self {
        Self {
            duration,
            failing_outputs: HashSet::new(),
            exports: Mutex::new(Vec::new()),
        }
    }

    /// Fail exports whose output file name is listed.
    pub fn failing_exports(mut self, file_names: &[&str]) -> Self {
        self.failing_outputs = file_names.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn exported(&self) -> Vec<ComposedClip> {
        self.exports.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaToolkit for FakeMedia {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        Ok(MediaInfo {
            duration: self.duration,
            width: 1080,
            height: 1920,
            fps: 30.0,
            has_video: true,
            has_audio: true,
        })
    }

    async fn export(
        &self,
        clip: &ComposedClip,
        output: &Path,
        _options: &ExportOptions,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<()> {
        if cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(MediaError::Cancelled);
        }
        let name = output.file_name().unwrap().to_string_lossy().to_string();
        if self.failing_outputs.contains(&name) {
            return Err(MediaError::ffmpeg_failed("encoder exploded", None, Some(1)));
        }
        tokio::fs::create_dir_all(output.parent().unwrap()).await?;
        tokio::fs::write(output, b"fake mp4").await?;
        self.exports.lock().unwrap().push(clip.clone());
        Ok(())
    }
}

/// Records uploaded keys. Keys in `failing` are rejected.
#[derive(Default)]
pub struct MemoryStore {
    failing: HashSet<String>,
    stored: Mutex<Vec<(String, PathBuf, bool)>>,
    /// Raised after the first successful upload
    cancel_after_first: Option<watch::Sender<bool>>,
}

impl MemoryStore {
    pub fn failing_on(keys: &[&str]) -> Self {
        Self {
            failing: keys.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn cancelling_after_first(cancel: watch::Sender<bool>) -> Self {
        Self {
            cancel_after_first: Some(cancel),
            ..Default::default()
        }
    }

    /// Keys whose upload succeeded, in upload order.
    pub fn keys(&self) -> Vec<String> {
        self.stored
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, _, ok)| *ok)
            .map(|(key, _, _)| key.clone())
            .collect()
    }

    /// Local paths handed to the store, successful or not.
    pub fn local_paths(&self) -> Vec<PathBuf> {
        self.stored
            .lock()
            .unwrap()
            .iter()
            .map(|(_, path, _)| path.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn store(&self, local_path: &Path, key: &str) -> StorageResult<()> {
        assert!(local_path.exists(), "upload source {} missing", local_path.display());
        let ok = !self.failing.contains(key);
        self.stored
            .lock()
            .unwrap()
            .push((key.to_string(), local_path.to_path_buf(), ok));
        if !ok {
            return Err(StorageError::upload_failed("503 Slow Down"));
        }
        if let Some(cancel) = &self.cancel_after_first {
            let _ = cancel.send(true);
        }
        Ok(())
    }
}
