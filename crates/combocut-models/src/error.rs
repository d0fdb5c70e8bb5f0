//! Validation error types.

use thiserror::Error;

/// Result type for job description validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reasons a job description is rejected before it reaches the worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("task name must not be empty")]
    EmptyTaskName,

    #[error("task name contains invalid character: {0:?}")]
    InvalidTaskName(char),

    #[error("task name {0:?} cannot be used in an object key")]
    ReservedTaskName(String),

    #[error("video_blocks produce more than {max} combinations")]
    TooManyCombinations { max: usize },

    #[error("{0} cannot be empty")]
    NoBlocks(&'static str),

    #[error("block {0} cannot be empty")]
    EmptyBlock(String),

    #[error("invalid URL in block {block}: {url}")]
    InvalidUrl { block: String, url: String },

    #[error("text_to_speech cannot be empty")]
    NoVoiceLines,

    #[error("voice line {0} has empty text")]
    EmptyVoiceText(usize),
}
