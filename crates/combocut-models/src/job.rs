//! Render job definitions.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::combo::{combination_count, ComboGenerator};
use crate::error::{ValidationError, ValidationResult};
use crate::request::{validate_combination_count, validate_task_name};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A voice-over line: text plus the voice that should speak it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VoiceLine {
    /// Text to synthesize
    pub text: String,
    /// Voice name or provider voice ID
    pub voice: String,
}

impl VoiceLine {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
        }
    }
}

/// A validated render job.
///
/// Every video block holds at least one URL, and the audio pool and voice
/// lines are non-empty. The job is immutable once built and is owned by a
/// single batch run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID (logging and queue bookkeeping)
    pub job_id: JobId,

    /// Job name, used for output file names and remote keys
    pub name: String,

    /// Named video blocks, each an ordered list of alternative source URLs
    pub video_blocks: BTreeMap<String, Vec<String>>,

    /// Background audio candidates, flattened from the named audio blocks
    pub audio_pool: Vec<String>,

    /// Voice-over candidates
    pub voice_lines: Vec<VoiceLine>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a job from already-flattened parts.
    pub fn new(
        name: impl Into<String>,
        video_blocks: BTreeMap<String, Vec<String>>,
        audio_pool: Vec<String>,
        voice_lines: Vec<VoiceLine>,
    ) -> Self {
        Self {
            job_id: JobId::new(),
            name: name.into(),
            video_blocks,
            audio_pool,
            voice_lines,
            created_at: Utc::now(),
        }
    }

    /// Check the structural invariants the render pipeline relies on.
    ///
    /// Jobs arriving through the queue were validated at the ingestion
    /// boundary, but a worker re-checks before touching the filesystem.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_task_name(self.name.trim())?;
        if self.video_blocks.is_empty() {
            return Err(ValidationError::NoBlocks("video_blocks"));
        }
        if let Some((name, _)) = self.video_blocks.iter().find(|(_, urls)| urls.is_empty()) {
            return Err(ValidationError::EmptyBlock(name.clone()));
        }
        validate_combination_count(&self.video_blocks)?;
        if self.audio_pool.is_empty() {
            return Err(ValidationError::NoBlocks("audio_blocks"));
        }
        if self.voice_lines.is_empty() {
            return Err(ValidationError::NoVoiceLines);
        }
        Ok(())
    }

    /// Combination generator over this job's video blocks.
    pub fn combinations(&self) -> ComboGenerator {
        ComboGenerator::new(self.video_blocks.clone())
    }

    /// Total number of combinations this job renders.
    ///
    /// Saturates at `usize::MAX`; [`validate`](Self::validate) rejects
    /// anything above [`MAX_COMBINATIONS`](crate::combo::MAX_COMBINATIONS).
    pub fn total_combinations(&self) -> usize {
        combination_count(self.video_blocks.values().map(Vec::len)).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combo::MAX_COMBINATIONS;

    fn sample_job() -> Job {
        let mut blocks = BTreeMap::new();
        blocks.insert("block1".to_string(), vec!["https://cdn/a1.mp4".to_string(), "https://cdn/a2.mp4".to_string()]);
        blocks.insert("block2".to_string(), vec!["https://cdn/b1.mp4".to_string()]);
        Job::new(
            "promo",
            blocks,
            vec!["https://cdn/music.mp3".to_string()],
            vec![VoiceLine::new("Hello there", "Sarah")],
        )
    }

    #[test]
    fn test_job_validates() {
        let job = sample_job();
        assert!(job.validate().is_ok());
        assert_eq!(job.total_combinations(), 2);
    }

    #[test]
    fn test_job_rejects_empty_block() {
        let mut job = sample_job();
        job.video_blocks.insert("block3".to_string(), Vec::new());
        assert_eq!(
            job.validate(),
            Err(ValidationError::EmptyBlock("block3".to_string()))
        );
    }

    #[test]
    fn test_job_rejects_oversized_product() {
        let mut job = sample_job();
        job.video_blocks = (0..20)
            .map(|b| (format!("block{:02}", b), vec!["https://cdn/x.mp4".to_string(); 10]))
            .collect();

        assert_eq!(job.total_combinations(), usize::MAX);
        assert_eq!(
            job.validate(),
            Err(ValidationError::TooManyCombinations {
                max: MAX_COMBINATIONS
            })
        );
    }

    #[test]
    fn test_job_rejects_dot_name() {
        let mut job = sample_job();
        job.name = "..".to_string();
        assert_eq!(
            job.validate(),
            Err(ValidationError::ReservedTaskName("..".to_string()))
        );
    }

    #[test]
    fn test_job_rejects_missing_voice_lines() {
        let mut job = sample_job();
        job.voice_lines.clear();
        assert_eq!(job.validate(), Err(ValidationError::NoVoiceLines));
    }

    #[test]
    fn test_job_serde_roundtrip_keeps_block_order() {
        let job = sample_job();
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        let names: Vec<_> = back.video_blocks.keys().cloned().collect();
        assert_eq!(names, vec!["block1", "block2"]);
        assert_eq!(back.job_id, job.job_id);
    }
}
