//! Worker error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use combocut_media::MediaError;
use combocut_storage::StorageError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Job-level failures. Per-combination failures are [`ComboError`]s and
/// never surface here.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid job: {0}")]
    InvalidJob(#[from] combocut_models::ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("TTS error: {0}")]
    Tts(#[from] combocut_tts::TtsError),

    #[error("Queue error: {0}")]
    Queue(#[from] combocut_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if error is retryable. A malformed job fails the same way on
    /// every attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, WorkerError::InvalidJob(_) | WorkerError::ConfigError(_))
    }
}

/// Pipeline stage of one combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboStage {
    Pending,
    AssetsResolving,
    Composing,
    Exporting,
    Uploading,
}

impl ComboStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComboStage::Pending => "pending",
            ComboStage::AssetsResolving => "assets_resolving",
            ComboStage::Composing => "composing",
            ComboStage::Exporting => "exporting",
            ComboStage::Uploading => "uploading",
        }
    }
}

impl fmt::Display for ComboStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single combination failed.
#[derive(Debug, Error)]
pub enum ComboError {
    #[error("fetch failed: {0}")]
    Fetch(#[source] MediaError),

    #[error("composition failed: {0}")]
    Composition(#[source] MediaError),

    #[error("export failed: {0}")]
    Export(#[source] MediaError),

    #[error("upload failed: {0}")]
    Upload(#[source] StorageError),

    #[error("cancelled")]
    Cancelled,
}

impl ComboError {
    /// Classify a media error raised while assembling a combination.
    pub fn from_composing(err: MediaError) -> Self {
        match err {
            MediaError::Cancelled => ComboError::Cancelled,
            e if e.is_fetch_error() => ComboError::Fetch(e),
            e => ComboError::Composition(e),
        }
    }

    /// Classify a media error raised by the exporter.
    pub fn from_export(err: MediaError) -> Self {
        match err {
            MediaError::Cancelled => ComboError::Cancelled,
            e => ComboError::Export(e),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ComboError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composing_errors_are_classified() {
        let fetch = ComboError::from_composing(MediaError::HttpStatus {
            url: "https://cdn/a.mp3".to_string(),
            status: 404,
        });
        assert!(matches!(fetch, ComboError::Fetch(_)));

        let probe = ComboError::from_composing(MediaError::invalid_media("no streams"));
        assert!(matches!(probe, ComboError::Composition(_)));

        assert!(ComboError::from_export(MediaError::Cancelled).is_cancelled());
    }

    #[test]
    fn test_retryable() {
        let io = WorkerError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert!(io.is_retryable());
        let invalid = WorkerError::InvalidJob(combocut_models::ValidationError::NoVoiceLines);
        assert!(!invalid.is_retryable());
    }

    #[test]
    fn test_reason_text() {
        let err = ComboError::Upload(StorageError::upload_failed("503 Slow Down"));
        assert_eq!(err.to_string(), "upload failed: Upload failed: 503 Slow Down");
        assert_eq!(ComboStage::AssetsResolving.to_string(), "assets_resolving");
    }
}
