//! Combination render worker.
//!
//! This crate provides:
//! - Job-scoped asset cache with download sharing
//! - Background and voice-over composition
//! - Batch orchestration with per-combination failure isolation
//! - Upload of rendered outputs
//! - Queue executor with retry, DLQ and graceful shutdown

pub mod asset_cache;
pub mod audio_composer;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod uploader;

#[cfg(test)]
mod test_support;

pub use asset_cache::AssetCache;
pub use audio_composer::{AudioComposer, AudioSelection};
pub use config::WorkerConfig;
pub use error::{ComboError, ComboStage, WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use orchestrator::{BatchConfig, BatchOrchestrator, BatchResult, ComboFailure};
pub use uploader::{RenderedOutput, Uploader};
