//! ElevenLabs HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::error::{TtsError, TtsResult};
use crate::synthesizer::SpeechSynthesizer;
use crate::types::{SpeechRequest, VoiceMap};

/// Default ElevenLabs API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Configuration for the ElevenLabs client.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub api_key: String,
    pub base_url: String,
    /// Model override; the provider default is used when unset
    pub model_id: Option<String>,
    pub voices: VoiceMap,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for 429/5xx/network failures
    pub max_retries: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model_id: None,
            voices: VoiceMap::default(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl TtsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> TtsResult<Self> {
        let voices = match std::env::var("ELEVENLABS_VOICE_MAP") {
            Ok(raw) => VoiceMap::parse(&raw)?,
            Err(_) => VoiceMap::default(),
        };

        Ok(Self {
            api_key: std::env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
            base_url: std::env::var("ELEVENLABS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model_id: std::env::var("ELEVENLABS_MODEL_ID")
                .ok()
                .filter(|m| !m.trim().is_empty()),
            voices,
            timeout: Duration::from_secs(
                std::env::var("ELEVENLABS_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("ELEVENLABS_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        })
    }
}

/// Client for the ElevenLabs text-to-speech API.
pub struct ElevenLabsClient {
    http: Client,
    config: TtsConfig,
}

impl ElevenLabsClient {
    /// Create a new client.
    pub fn new(config: TtsConfig) -> TtsResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TtsError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> TtsResult<Self> {
        Self::new(TtsConfig::from_env()?)
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    pub fn voices(&self) -> &VoiceMap {
        &self.config.voices
    }

    /// Endpoint for a voice. The voice ID is one escaped path segment.
    fn speech_url(&self, voice_id: &str) -> TtsResult<Url> {
        let base = &self.config.base_url;
        let mut url = Url::parse(base)
            .map_err(|e| TtsError::InvalidBaseUrl(format!("{}: {}", base, e)))?;

        url.path_segments_mut()
            .map_err(|_| TtsError::InvalidBaseUrl(base.clone()))?
            .pop_if_empty()
            .extend(["v1", "text-to-speech", voice_id]);

        Ok(url)
    }

    async fn request_speech(&self, url: &Url, body: &SpeechRequest) -> TtsResult<Vec<u8>> {
        let response = self
            .http
            .post(url.clone())
            .header("xi-api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(TtsError::EmptyAudio);
        }
        Ok(bytes.to_vec())
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> TtsResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = TtsResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "TTS request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice: &str) -> TtsResult<Vec<u8>> {
        if !self.is_configured() {
            return Err(TtsError::NotConfigured("ELEVENLABS_API_KEY is empty".to_string()));
        }

        let voice_id = self.config.voices.resolve(voice);
        let url = self.speech_url(voice_id)?;
        let body = SpeechRequest {
            text: text.to_string(),
            model_id: self.config.model_id.clone(),
        };

        debug!("Requesting speech for voice {} ({} chars)", voice_id, text.len());

        self.with_retry(|| self.request_speech(&url, &body)).await
    }
}
