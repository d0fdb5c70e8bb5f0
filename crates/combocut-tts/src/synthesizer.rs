//! Speech synthesis capability.

use async_trait::async_trait;

use crate::error::TtsResult;

/// Turns text into encoded audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice` (a display name or provider voice ID).
    ///
    /// Returns the encoded audio bytes (MP3 for ElevenLabs).
    async fn synthesize(&self, text: &str, voice: &str) -> TtsResult<Vec<u8>>;
}
