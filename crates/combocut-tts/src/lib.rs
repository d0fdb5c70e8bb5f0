//! Text-to-speech client for voice-over layers.
//!
//! The render pipeline depends only on [`SpeechSynthesizer`]; the ElevenLabs
//! client is the production implementation. Request voices are display names
//! ("Sarah") that a [`VoiceMap`] resolves to provider voice IDs.

pub mod client;
pub mod error;
pub mod synthesizer;
pub mod types;

pub use client::{ElevenLabsClient, TtsConfig};
pub use error::{TtsError, TtsResult};
pub use synthesizer::SpeechSynthesizer;
pub use types::{SpeechRequest, VoiceMap};
