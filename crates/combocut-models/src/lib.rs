//! Shared data models for the combocut render pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Render jobs and voice-over lines
//! - The inbound `process_media` request schema and its validation
//! - Combination enumeration over video blocks
//! - Encoding configuration

pub mod combo;
pub mod encoding;
pub mod error;
pub mod job;
pub mod request;

// Re-export common types
pub use combo::{
    combination_count, output_file_name, remote_key, Combination, ComboGenerator, Combinations,
    MAX_COMBINATIONS,
};
pub use encoding::EncodingConfig;
pub use error::{ValidationError, ValidationResult};
pub use job::{Job, JobId, VoiceLine};
pub use request::ProcessMediaRequest;
