//! Inbound `process_media` request schema.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::combo::{combination_count, MAX_COMBINATIONS};
use crate::error::{ValidationError, ValidationResult};
use crate::job::{Job, VoiceLine};

/// Request body accepted by the ingestion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessMediaRequest {
    /// Job name; becomes the output file prefix and remote folder
    pub task_name: String,

    /// Named video blocks
    pub video_blocks: BTreeMap<String, Vec<String>>,

    /// Named background audio blocks
    pub audio_blocks: BTreeMap<String, Vec<String>>,

    /// Voice-over candidates
    pub text_to_speech: Vec<VoiceLine>,
}

impl ProcessMediaRequest {
    /// Validate the request.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_task_name(self.task_name.trim())?;

        validate_blocks("video_blocks", &self.video_blocks)?;
        validate_blocks("audio_blocks", &self.audio_blocks)?;
        validate_combination_count(&self.video_blocks)?;

        if self.text_to_speech.is_empty() {
            return Err(ValidationError::NoVoiceLines);
        }
        if let Some(i) = self
            .text_to_speech
            .iter()
            .position(|line| line.text.trim().is_empty())
        {
            return Err(ValidationError::EmptyVoiceText(i));
        }

        Ok(())
    }

    /// Validate and convert into a render job.
    ///
    /// Audio blocks are flattened in ascending block-name order, keeping the
    /// list order inside each block.
    pub fn into_job(self) -> ValidationResult<Job> {
        self.validate()?;

        let audio_pool = self.audio_blocks.into_values().flatten().collect();

        Ok(Job::new(
            self.task_name.trim(),
            self.video_blocks,
            audio_pool,
            self.text_to_speech,
        ))
    }
}

/// The name is used verbatim as a key prefix and in local file names.
pub(crate) fn validate_task_name(name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::EmptyTaskName);
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, '/' | '\\') || c.is_control())
    {
        return Err(ValidationError::InvalidTaskName(c));
    }
    if matches!(name, "." | "..") {
        return Err(ValidationError::ReservedTaskName(name.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_combination_count(
    blocks: &BTreeMap<String, Vec<String>>,
) -> ValidationResult<()> {
    match combination_count(blocks.values().map(Vec::len)) {
        Some(total) if total <= MAX_COMBINATIONS => Ok(()),
        _ => Err(ValidationError::TooManyCombinations {
            max: MAX_COMBINATIONS,
        }),
    }
}

fn validate_blocks(field: &'static str, blocks: &BTreeMap<String, Vec<String>>) -> ValidationResult<()> {
    if blocks.is_empty() {
        return Err(ValidationError::NoBlocks(field));
    }

    for (name, urls) in blocks {
        if urls.is_empty() {
            return Err(ValidationError::EmptyBlock(name.clone()));
        }
        for url in urls {
            if !is_http_url(url) {
                return Err(ValidationError::InvalidUrl {
                    block: name.clone(),
                    url: url.clone(),
                });
            }
        }
    }

    Ok(())
}

fn is_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
