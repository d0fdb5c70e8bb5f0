//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use combocut_media::{ExportOptions, DEFAULT_BACKGROUND_VOLUME, DEFAULT_EXPORT_TIMEOUT_SECS};
use combocut_models::EncodingConfig;

use crate::orchestrator::BatchConfig;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Combinations rendered in parallel within one job (1 = sequential)
    pub combo_concurrency: usize,
    /// Work directory for per-job scratch space
    pub work_dir: PathBuf,
    /// Per-export FFmpeg timeout
    pub export_timeout: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// How often the worker should scan for orphaned pending jobs
    pub claim_interval: Duration,
    /// Minimum idle time before a pending job can be claimed (crash recovery)
    pub claim_min_idle: Duration,
    /// Background track gain
    pub background_volume: f64,
    pub encoding: EncodingConfig,
    /// Output container extension
    pub output_extension: String,
    /// Fixed random seed; random per job when unset
    pub random_seed: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 1,
            combo_concurrency: 1,
            work_dir: PathBuf::from("/tmp/combocut"),
            export_timeout: Duration::from_secs(DEFAULT_EXPORT_TIMEOUT_SECS),
            shutdown_timeout: Duration::from_secs(60),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(1800), // 30 minutes
            background_volume: DEFAULT_BACKGROUND_VOLUME,
            encoding: EncodingConfig::default(),
            output_extension: "mp4".to_string(),
            random_seed: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let frame_rate = env_parse("WORKER_FRAME_RATE").unwrap_or(defaults.encoding.frame_rate);
        let crf = env_parse("WORKER_CRF").unwrap_or(defaults.encoding.crf);

        Self {
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS")
                .unwrap_or(defaults.max_concurrent_jobs)
                .max(1),
            combo_concurrency: env_parse("WORKER_COMBO_CONCURRENCY")
                .unwrap_or(defaults.combo_concurrency)
                .max(1),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            export_timeout: env_parse("WORKER_EXPORT_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.export_timeout),
            shutdown_timeout: env_parse("WORKER_SHUTDOWN_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
            claim_interval: env_parse("WORKER_CLAIM_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_interval),
            claim_min_idle: env_parse("WORKER_CLAIM_MIN_IDLE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_min_idle),
            background_volume: env_parse::<f64>("WORKER_BACKGROUND_VOLUME")
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.background_volume),
            encoding: defaults.encoding.with_frame_rate(frame_rate).with_crf(crf),
            output_extension: std::env::var("WORKER_OUTPUT_EXTENSION")
                .map(|ext| ext.trim_start_matches('.').to_string())
                .ok()
                .filter(|ext| !ext.is_empty())
                .unwrap_or(defaults.output_extension),
            random_seed: env_parse("WORKER_RANDOM_SEED"),
        }
    }

    /// Settings handed to the batch orchestrator.
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            work_dir: self.work_dir.clone(),
            concurrency: self.combo_concurrency,
            background_volume: self.background_volume,
            export: ExportOptions::new(self.encoding.clone())
                .with_timeout(Some(self.export_timeout.as_secs())),
            output_extension: self.output_extension.clone(),
            seed: self.random_seed,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_render_sequentially() {
        let config = WorkerConfig::default();
        assert_eq!(config.combo_concurrency, 1);
        assert_eq!(config.encoding.frame_rate, 24);
        assert!((config.background_volume - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.output_extension, "mp4");
    }

    #[test]
    fn test_batch_config_carries_export_settings() {
        let config = WorkerConfig {
            export_timeout: Duration::from_secs(90),
            random_seed: Some(7),
            ..Default::default()
        };

        let batch = config.batch_config();
        assert_eq!(batch.export.timeout_secs, Some(90));
        assert_eq!(batch.export.encoding.codec, "libx264");
        assert_eq!(batch.seed, Some(7));
        assert_eq!(batch.work_dir, PathBuf::from("/tmp/combocut"));
    }
}
