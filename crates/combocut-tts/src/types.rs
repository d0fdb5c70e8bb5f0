//! TTS request types and voice mapping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{TtsError, TtsResult};

/// Body of a text-to-speech request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

/// Display-name to provider voice ID table.
///
/// Lookups are case-insensitive. Names without an entry are used as voice
/// IDs unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceMap {
    entries: HashMap<String, String>,
}

impl VoiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `Name=voice_id` pairs separated by commas.
    pub fn parse(raw: &str) -> TtsResult<Self> {
        let mut map = Self::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, id) = entry
                .split_once('=')
                .map(|(n, i)| (n.trim(), i.trim()))
                .filter(|(n, i)| !n.is_empty() && !i.is_empty())
                .ok_or_else(|| TtsError::InvalidVoiceMap(entry.to_string()))?;
            map = map.with_voice(name, id);
        }
        Ok(map)
    }

    pub fn with_voice(mut self, name: impl AsRef<str>, voice_id: impl Into<String>) -> Self {
        self.entries
            .insert(name.as_ref().to_lowercase(), voice_id.into());
        self
    }

    /// Provider voice ID for a display name.
    pub fn resolve<'a>(&'a self, voice: &'a str) -> &'a str {
        self.entries
            .get(&voice.trim().to_lowercase())
            .map(String::as_str)
            .unwrap_or(voice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_resolve() {
        let map = VoiceMap::parse("Sarah=EXAVITQu4vr4xnSDxMaL, Adam = pNInz6obpgDQGcFmaJgB,").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("Sarah"), "EXAVITQu4vr4xnSDxMaL");
        assert_eq!(map.resolve("adam"), "pNInz6obpgDQGcFmaJgB");
    }

    #[test]
    fn test_unmapped_voice_passes_through() {
        let map = VoiceMap::new();
        assert!(map.is_empty());
        assert_eq!(map.resolve("21m00Tcm4TlvDq8ikWAM"), "21m00Tcm4TlvDq8ikWAM");
    }

    #[test]
    fn test_parse_rejects_malformed_entries() {
        assert!(matches!(
            VoiceMap::parse("Sarah"),
            Err(TtsError::InvalidVoiceMap(_))
        ));
        assert!(VoiceMap::parse("=abc").is_err());
        assert!(VoiceMap::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_request_omits_missing_model() {
        let body = serde_json::to_value(SpeechRequest {
            text: "hi".to_string(),
            model_id: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"text": "hi"}));
    }
}
