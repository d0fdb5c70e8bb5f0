//! TTS client error types.

use thiserror::Error;

pub type TtsResult<T> = Result<T, TtsError>;

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("TTS is not configured: {0}")]
    NotConfigured(String),

    #[error("TTS request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("TTS returned no audio")]
    EmptyAudio,

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid voice map entry: {0}")]
    InvalidVoiceMap(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl TtsError {
    pub fn is_retryable(&self) -> bool {
        match self {
            TtsError::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            TtsError::Network(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let status = |status| TtsError::RequestFailed {
            status,
            body: String::new(),
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!TtsError::EmptyAudio.is_retryable());
    }
}
