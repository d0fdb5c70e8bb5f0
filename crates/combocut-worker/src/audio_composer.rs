//! Background and voice-over composition for one combination.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::Rng;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use combocut_media::fs_utils::{is_nonempty_file, remove_file_quietly};
use combocut_media::{ComposedAudio, MediaToolkit};
use combocut_models::VoiceLine;
use combocut_tts::SpeechSynthesizer;

use crate::asset_cache::AssetCache;
use crate::error::ComboError;

/// Subfolder for background tracks inside the job working directory.
pub const AUDIO_SUBFOLDER: &str = "audio";

/// Random picks for one combination, made before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSelection {
    pub background_url: String,
    pub voice: VoiceLine,
}

/// Builds the soundtrack of a combination.
pub struct AudioComposer {
    cache: Arc<AssetCache>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    media: Arc<dyn MediaToolkit>,
    tts_dir: PathBuf,
    background_volume: f64,
    /// One slot per TTS file name, shared by every combination of the job
    voices: Mutex<HashMap<String, Arc<OnceCell<PathBuf>>>>,
}

impl AudioComposer {
    pub fn new(
        cache: Arc<AssetCache>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        media: Arc<dyn MediaToolkit>,
        tts_dir: impl Into<PathBuf>,
        background_volume: f64,
    ) -> Self {
        Self {
            cache,
            synthesizer,
            media,
            tts_dir: tts_dir.into(),
            background_volume,
            voices: Mutex::new(HashMap::new()),
        }
    }

    /// Pick a background track and a voice line uniformly at random.
    ///
    /// Returns `None` if either candidate list is empty.
    pub fn select<R: Rng + ?Sized>(
        rng: &mut R,
        backgrounds: &[String],
        voice_lines: &[VoiceLine],
    ) -> Option<AudioSelection> {
        let background_url = backgrounds.choose(rng)?.clone();
        let voice = voice_lines.choose(rng)?.clone();
        Some(AudioSelection {
            background_url,
            voice,
        })
    }

    /// Compose a soundtrack lasting exactly `target_duration` seconds.
    ///
    /// A failed voice synthesis leaves a background-only soundtrack.
    pub async fn compose(
        &self,
        selection: &AudioSelection,
        target_duration: f64,
    ) -> Result<ComposedAudio, ComboError> {
        let background = self
            .cache
            .resolve(&selection.background_url, AUDIO_SUBFOLDER)
            .await
            .map_err(ComboError::from_composing)?;

        let natural = self
            .media
            .duration(&background)
            .await
            .map_err(ComboError::Composition)?;

        let audio = ComposedAudio::with_background(
            target_duration,
            &background,
            natural,
            self.background_volume,
        )
        .map_err(ComboError::Composition)?;

        debug!(
            "Background {} ({:.2}s) fitted as {:?}",
            selection.background_url,
            natural,
            audio.background_fit()
        );

        match self.synthesize_voice(&selection.voice).await {
            Some(voice) => Ok(audio.add_voice(voice)),
            None => Ok(audio),
        }
    }

    /// Synthesize a voice line into the TTS folder.
    ///
    /// Identical lines within a job share one file, and concurrent requests
    /// for the same line wait on a single synthesis. A failure is not
    /// remembered, so a later combination tries again.
    async fn synthesize_voice(&self, line: &VoiceLine) -> Option<PathBuf> {
        let file_name = tts_file_name(line);
        let slot = {
            let mut voices = self.voices.lock().await;
            Arc::clone(voices.entry(file_name.clone()).or_default())
        };
        let path = self.tts_dir.join(&file_name);

        let stored = slot
            .get_or_try_init(|| async {
                // Left by an earlier attempt in this working directory
                if is_nonempty_file(&path).await {
                    return Ok(path.clone());
                }

                let bytes = self
                    .synthesizer
                    .synthesize(&line.text, &line.voice)
                    .await
                    .map_err(|e| {
                        warn!(
                            voice = %line.voice,
                            "Voice-over synthesis failed, continuing with background only: {}", e
                        );
                    })?;

                write_atomically(&path, &bytes).await.map_err(|e| {
                    warn!(
                        "Failed to store voice-over at {}, continuing with background only: {}",
                        path.display(),
                        e
                    );
                })?;

                Ok::<_, ()>(path.clone())
            })
            .await;

        stored.ok().cloned()
    }
}

/// Stable file name for a synthesized line.
fn tts_file_name(line: &VoiceLine) -> String {
    let mut hasher = DefaultHasher::new();
    line.voice.hash(&mut hasher);
    line.text.hash(&mut hasher);
    format!("tts_{:016x}.mp3", hasher.finish())
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Unique staging name so concurrent writers never interleave
    let staging = path.with_extension(format!("{}.part", uuid::Uuid::new_v4().simple()));
    if let Err(e) = tokio::fs::write(&staging, bytes).await {
        remove_file_quietly(&staging).await;
        return Err(e);
    }
    tokio::fs::rename(&staging, path).await
}
