//! Batch rendering of every combination of a job.
//!
//! Each combination moves through `Pending -> AssetsResolving -> Composing
//! -> Exporting -> Uploading` and either completes or fails in place. A
//! failure is recorded with its index and reason and the batch moves on.
//! Combinations are dispatched in enumeration order onto at most
//! `concurrency` render slots; with a single slot the batch is strictly
//! sequential and a combination's rendered file is gone before the next one
//! starts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, Instrument};

use combocut_media::fs_utils::{ensure_dir, remove_dir_quietly, remove_file_quietly};
use combocut_media::{
    ExportOptions, MediaError, MediaToolkit, RemoteFetcher, DEFAULT_BACKGROUND_VOLUME,
};
use combocut_models::{remote_key, Combination, ComboGenerator, EncodingConfig, Job, JobId};
use combocut_storage::ObjectStore;
use combocut_tts::SpeechSynthesizer;

use crate::asset_cache::AssetCache;
use crate::audio_composer::{AudioComposer, AudioSelection};
use crate::error::{ComboError, ComboStage, WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::uploader::{RenderedOutput, Uploader};

/// Subfolder for downloaded video sources inside the job working directory.
pub const VIDEO_SUBFOLDER: &str = "videos";
const TTS_SUBFOLDER: &str = "tts";
const RENDERS_SUBFOLDER: &str = "renders";

/// Settings for one orchestrator.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Parent of the per-job working directories
    pub work_dir: PathBuf,
    /// Render slots (1 = sequential)
    pub concurrency: usize,
    pub background_volume: f64,
    pub export: ExportOptions,
    pub output_extension: String,
    /// Base seed for background and voice selection; random per job when unset
    pub seed: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/combocut"),
            concurrency: 1,
            background_volume: DEFAULT_BACKGROUND_VOLUME,
            export: ExportOptions::new(EncodingConfig::default()),
            output_extension: "mp4".to_string(),
            seed: None,
        }
    }
}

/// A combination that did not reach storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboFailure {
    pub index: usize,
    /// Stage the combination was in when it failed
    pub stage: ComboStage,
    pub reason: String,
}

impl ComboFailure {
    fn new(index: usize, stage: ComboStage, err: &ComboError) -> Self {
        Self {
            index,
            stage,
            reason: err.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason == ComboError::Cancelled.to_string()
    }
}

/// Summary of one job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub job_id: JobId,
    pub job_name: String,
    /// Number of combinations enumerated
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
    /// Failed combinations in index order
    pub failures: Vec<ComboFailure>,
}

impl BatchResult {
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_secs)
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }

    /// Combinations skipped or aborted by cancellation.
    pub fn cancelled(&self) -> usize {
        self.failures.iter().filter(|f| f.is_cancelled()).count()
    }
}

/// Renders jobs against a fixed set of capabilities.
pub struct BatchOrchestrator {
    config: BatchConfig,
    fetcher: Arc<dyn RemoteFetcher>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    store: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaToolkit>,
}

impl BatchOrchestrator {
    pub fn new(
        config: BatchConfig,
        fetcher: Arc<dyn RemoteFetcher>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        store: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaToolkit>,
    ) -> Self {
        Self {
            config,
            fetcher,
            synthesizer,
            store,
            media,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Render every combination of `job`.
    pub async fn run_job(&self, job: &Job) -> WorkerResult<BatchResult> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_job_with_cancel(job, cancel_rx).await
    }

    /// Render every combination of `job` until `cancel` turns `true`.
    ///
    /// Combinations not finished at cancellation are reported as failed with
    /// reason `cancelled`. Only setup failures are returned as errors; the
    /// job working directory is removed on every path.
    pub async fn run_job_with_cancel(
        &self,
        job: &Job,
        cancel: watch::Receiver<bool>,
    ) -> WorkerResult<BatchResult> {
        job.validate()?;

        let logger = JobLogger::new(&job.job_id, &job.name, "render_combos");
        let span = logger.create_span();
        self.run_batch(job, cancel, &logger).instrument(span).await
    }

    async fn run_batch(
        &self,
        job: &Job,
        cancel: watch::Receiver<bool>,
        logger: &JobLogger,
    ) -> WorkerResult<BatchResult> {
        let started = Instant::now();
        let generator = job.combinations();
        let total = generator.total();

        logger.log_start(&format!(
            "{} combinations over blocks [{}], concurrency {}",
            total,
            generator.block_names().join(", "),
            self.config.concurrency.max(1)
        ));

        let workspace = JobWorkspace::create(&self.config.work_dir, &job.job_id).await?;
        let renderer = Arc::new(self.renderer_for(job, &workspace));

        let outcome = self
            .dispatch(job, &generator, Arc::clone(&renderer), cancel, logger)
            .await;

        debug!(
            "Downloaded {} assets for job {}",
            renderer.cache.download_count(),
            job.job_id
        );
        workspace.remove().await;
        let tally = outcome?;

        let result = BatchResult {
            job_id: job.job_id.clone(),
            job_name: job.name.clone(),
            total,
            succeeded: tally.succeeded,
            failed: tally.failures.len(),
            elapsed_secs: started.elapsed().as_secs_f64(),
            failures: tally.failures,
        };

        logger.log_completion(&format!(
            "{} succeeded, {} failed of {} in {:.1}s",
            result.succeeded, result.failed, result.total, result.elapsed_secs
        ));

        Ok(result)
    }

    fn renderer_for(&self, job: &Job, workspace: &JobWorkspace) -> ComboRenderer {
        let cache = Arc::new(AssetCache::new(
            workspace.root.clone(),
            Arc::clone(&self.fetcher),
        ));
        let audio = AudioComposer::new(
            Arc::clone(&cache),
            Arc::clone(&self.synthesizer),
            Arc::clone(&self.media),
            workspace.tts_dir(),
            self.config.background_volume,
        );

        ComboRenderer {
            job_name: job.name.clone(),
            extension: self.config.output_extension.clone(),
            renders_dir: workspace.renders_dir(),
            export: self.config.export.clone(),
            cache,
            audio,
            media: Arc::clone(&self.media),
            uploader: Uploader::new(Arc::clone(&self.store)),
        }
    }

    async fn dispatch(
        &self,
        job: &Job,
        generator: &ComboGenerator,
        renderer: Arc<ComboRenderer>,
        cancel: watch::Receiver<bool>,
        logger: &JobLogger,
    ) -> WorkerResult<Tally> {
        let slots = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let base_seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let mut tasks = JoinSet::new();
        let mut tally = Tally::default();

        for combo in generator.iter() {
            let permit = Arc::clone(&slots)
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::job_failed("Render slots closed"))?;

            while let Some(joined) = tasks.try_join_next() {
                tally.absorb(joined, logger);
            }

            // Checked between combinations; a running export watches the same channel
            if *cancel.borrow() {
                tally.fail(
                    ComboFailure::new(combo.index, ComboStage::Pending, &ComboError::Cancelled),
                    logger,
                );
                continue;
            }

            // Picks are made here, in enumeration order, so a fixed seed
            // gives the same soundtrack per index at any concurrency
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(combo.index as u64));
            let Some(selection) =
                AudioComposer::select(&mut rng, &job.audio_pool, &job.voice_lines)
            else {
                let err = ComboError::Composition(MediaError::composition(
                    "no background track or voice line to choose from",
                ));
                tally.fail(ComboFailure::new(combo.index, ComboStage::Composing, &err), logger);
                continue;
            };

            let renderer = Arc::clone(&renderer);
            let cancel = cancel.clone();
            let span = logger.combo_span(combo.index);
            tally.in_flight.insert(combo.index);

            tasks.spawn(
                async move {
                    let _permit = permit;
                    let started = Instant::now();
                    let outcome = renderer.render(&combo, &selection, &cancel).await;
                    (combo.index, outcome, started.elapsed())
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            tally.absorb(joined, logger);
        }

        tally.finish(logger);
        Ok(tally)
    }
}

type RenderOutcome = (usize, Result<(), (ComboStage, ComboError)>, Duration);

/// Running count of finished combinations.
#[derive(Default)]
struct Tally {
    succeeded: usize,
    failures: Vec<ComboFailure>,
    in_flight: BTreeSet<usize>,
}

impl Tally {
    fn absorb(&mut self, joined: Result<RenderOutcome, JoinError>, logger: &JobLogger) {
        let (index, outcome, elapsed) = match joined {
            Ok(done) => done,
            Err(e) => {
                // Index is recovered in finish()
                logger.log_error(&format!("Render task aborted: {}", e));
                return;
            }
        };
        self.in_flight.remove(&index);

        match outcome {
            Ok(()) => {
                self.succeeded += 1;
                metrics::record_combo_rendered(elapsed.as_secs_f64());
            }
            Err((stage, err)) => self.fail(ComboFailure::new(index, stage, &err), logger),
        }
    }

    fn fail(&mut self, failure: ComboFailure, logger: &JobLogger) {
        if failure.is_cancelled() {
            logger.log_warning(&format!("Combination {} cancelled", failure.index));
        } else {
            logger.log_combo_failure(failure.index, failure.stage.as_str(), &failure.reason);
        }
        metrics::record_combo_failed(failure.stage);
        self.failures.push(failure);
    }

    /// Account for tasks that never reported back and order failures.
    fn finish(&mut self, logger: &JobLogger) {
        for index in std::mem::take(&mut self.in_flight) {
            self.fail(
                ComboFailure {
                    index,
                    stage: ComboStage::Pending,
                    reason: "render task aborted".to_string(),
                },
                logger,
            );
        }
        self.failures.sort_by_key(|f| f.index);
    }
}

/// Scratch space `<work_dir>/<job_id>` for one job.
struct JobWorkspace {
    root: PathBuf,
}

impl JobWorkspace {
    async fn create(work_dir: &Path, job_id: &JobId) -> WorkerResult<Self> {
        let root = work_dir.join(job_id.as_str());
        ensure_dir(root.join(TTS_SUBFOLDER)).await?;
        ensure_dir(root.join(RENDERS_SUBFOLDER)).await?;
        Ok(Self { root })
    }

    fn tts_dir(&self) -> PathBuf {
        self.root.join(TTS_SUBFOLDER)
    }

    fn renders_dir(&self) -> PathBuf {
        self.root.join(RENDERS_SUBFOLDER)
    }

    async fn remove(self) {
        remove_dir_quietly(&self.root).await;
    }
}

/// Everything a render task needs, shared across the tasks of one job.
struct ComboRenderer {
    job_name: String,
    extension: String,
    renders_dir: PathBuf,
    export: ExportOptions,
    cache: Arc<AssetCache>,
    audio: AudioComposer,
    media: Arc<dyn MediaToolkit>,
    uploader: Uploader,
}

impl ComboRenderer {
    async fn render(
        &self,
        combo: &Combination,
        selection: &AudioSelection,
        cancel: &watch::Receiver<bool>,
    ) -> Result<(), (ComboStage, ComboError)> {
        let file_name = combo.file_name(&self.job_name, &self.extension);
        let output = self.renders_dir.join(&file_name);

        let mut stage = ComboStage::Pending;
        let result = self
            .run_stages(combo, selection, &file_name, &output, cancel, &mut stage)
            .await;

        // The rendered file never outlives its combination
        remove_file_quietly(&output).await;
        result.map_err(|err| (stage, err))
    }

    async fn run_stages(
        &self,
        combo: &Combination,
        selection: &AudioSelection,
        file_name: &str,
        output: &Path,
        cancel: &watch::Receiver<bool>,
        stage: &mut ComboStage,
    ) -> Result<(), ComboError> {
        *stage = ComboStage::AssetsResolving;
        let mut sources = Vec::with_capacity(combo.urls.len());
        for url in &combo.urls {
            let path = self
                .cache
                .resolve(url, VIDEO_SUBFOLDER)
                .await
                .map_err(ComboError::from_composing)?;
            sources.push(path);
        }

        *stage = ComboStage::Composing;
        let clip = self
            .media
            .concatenate(&sources)
            .await
            .map_err(ComboError::from_composing)?;
        let audio = self.audio.compose(selection, clip.duration()).await?;
        let clip = clip.attach_audio(audio).map_err(ComboError::Composition)?;
        debug!(
            "Composed {:.2}s clip from {} sources, voice-over: {}",
            clip.duration(),
            sources.len(),
            clip.audio().is_some_and(|a| a.has_voice())
        );

        if *cancel.borrow() {
            return Err(ComboError::Cancelled);
        }

        *stage = ComboStage::Exporting;
        self.media
            .export(&clip, output, &self.export, Some(cancel.clone()))
            .await
            .map_err(ComboError::from_export)?;

        *stage = ComboStage::Uploading;
        let rendered = RenderedOutput {
            local_path: output.to_path_buf(),
            remote_key: remote_key(&self.job_name, file_name),
        };
        self.uploader
            .upload(&rendered)
            .await
            .map_err(ComboError::Upload)?;

        info!("Combination {} published as {}", combo.index, rendered.remote_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeMedia, MemoryStore, RecordingSynthesizer, WritingFetcher};
    use combocut_models::VoiceLine;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct Harness {
        dir: TempDir,
        fetcher: Arc<WritingFetcher>,
        synthesizer: Arc<RecordingSynthesizer>,
        store: Arc<MemoryStore>,
        media: Arc<FakeMedia>,
        concurrency: usize,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                fetcher: Arc::new(WritingFetcher::default()),
                synthesizer: Arc::new(RecordingSynthesizer::succeeding()),
                store: Arc::new(MemoryStore::default()),
                media: Arc::new(FakeMedia::with_default_duration(4.0)),
                concurrency: 1,
            }
        }

        fn orchestrator(&self) -> BatchOrchestrator {
            let config = BatchConfig {
                work_dir: self.dir.path().to_path_buf(),
                concurrency: self.concurrency,
                seed: Some(11),
                ..Default::default()
            };
            BatchOrchestrator::new(
                config,
                self.fetcher.clone(),
                self.synthesizer.clone(),
                self.store.clone(),
                self.media.clone(),
            )
        }
    }

    fn job(blocks: &[(&str, &[&str])]) -> Job {
        let video_blocks: BTreeMap<String, Vec<String>> = blocks
            .iter()
            .map(|(name, urls)| {
                (
                    name.to_string(),
                    urls.iter().map(|u| format!("https://cdn.example.com/v/{u}.mp4")).collect(),
                )
            })
            .collect();
        Job::new(
            "promo",
            video_blocks,
            vec!["https://cdn.example.com/a/music.mp3".to_string()],
            vec![VoiceLine::new("Only this week!", "Sarah")],
        )
    }

    fn file_names(clip: &combocut_media::ComposedClip) -> Vec<String> {
        clip.sources()
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_two_blocks_render_in_enumeration_order() {
        let h = Harness::new();
        let job = job(&[("B", &["b1"]), ("A", &["a1", "a2"])]);

        let result = h.orchestrator().run_job(&job).await.unwrap();

        assert_eq!(result.total, 2);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 0);
        assert!(result.is_complete_success());
        assert_eq!(
            h.store.keys(),
            vec![
                "promo/promo_combo_0.mp4".to_string(),
                "promo/promo_combo_1.mp4".to_string()
            ]
        );

        let exported = h.media.exported();
        assert_eq!(file_names(&exported[0]), vec!["a1.mp4", "b1.mp4"]);
        assert_eq!(file_names(&exported[1]), vec!["a2.mp4", "b1.mp4"]);
        assert_eq!(exported[0].duration(), 8.0);
        assert_eq!(exported[0].audio().unwrap().duration(), 8.0);
    }

    #[tokio::test]
    async fn test_shared_urls_download_once() {
        let h = Harness::new();
        let job = job(&[("A", &["a1", "a2", "a3"]), ("B", &["b1"])]);

        let result = h.orchestrator().run_job(&job).await.unwrap();

        assert_eq!(result.succeeded, 3);
        assert_eq!(h.fetcher.calls_for("https://cdn.example.com/v/b1.mp4"), 1);
        assert_eq!(h.fetcher.calls_for("https://cdn.example.com/a/music.mp3"), 1);
        // 3 + 1 videos and one background track
        assert_eq!(h.fetcher.total_calls(), 5);
        // One voice line, synthesized once per job
        assert_eq!(h.synthesizer.calls(), 1);
    }

    #[tokio::test]
    async fn test_synthesis_failure_still_renders() {
        let mut h = Harness::new();
        h.synthesizer = Arc::new(RecordingSynthesizer::failing());
        let job = job(&[("A", &["a1", "a2"])]);

        let result = h.orchestrator().run_job(&job).await.unwrap();

        assert_eq!(result.succeeded, 2);
        assert_eq!(h.store.keys().len(), 2);
        for clip in h.media.exported() {
            let audio = clip.audio().unwrap();
            assert!(!audio.has_voice());
            assert_eq!(audio.layers().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_export_failure_does_not_stop_batch() {
        let mut h = Harness::new();
        h.media = Arc::new(FakeMedia::with_default_duration(4.0).failing_exports(&["promo_combo_0.mp4"]));
        let job = job(&[("A", &["a1", "a2"])]);

        let result = h.orchestrator().run_job(&job).await.unwrap();

        assert_eq!((result.total, result.succeeded, result.failed), (2, 1, 1));
        assert_eq!(result.failures[0].index, 0);
        assert_eq!(result.failures[0].stage, ComboStage::Exporting);
        assert!(result.failures[0].reason.starts_with("export failed"));
        assert_eq!(h.store.keys(), vec!["promo/promo_combo_1.mp4".to_string()]);
    }

    #[tokio::test]
    async fn test_upload_failure_counts_and_removes_file() {
        let mut h = Harness::new();
        h.store = Arc::new(MemoryStore::failing_on(&["promo/promo_combo_1.mp4"]));
        let job = job(&[("A", &["a1", "a2", "a3"])]);

        let result = h.orchestrator().run_job(&job).await.unwrap();

        assert_eq!((result.total, result.succeeded, result.failed), (3, 2, 1));
        assert_eq!(result.failures[0].index, 1);
        assert_eq!(result.failures[0].stage, ComboStage::Uploading);

        let paths = h.store.local_paths();
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let mut h = Harness::new();
        h.fetcher = Arc::new(WritingFetcher::failing_on(&["https://cdn.example.com/v/a2.mp4"]));
        let job = job(&[("A", &["a1", "a2", "a3"])]);

        let result = h.orchestrator().run_job(&job).await.unwrap();

        assert_eq!((result.succeeded, result.failed), (2, 1));
        let failure = &result.failures[0];
        assert_eq!(failure.index, 1);
        assert_eq!(failure.stage, ComboStage::AssetsResolving);
        assert!(failure.reason.starts_with("fetch failed"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_renders_nothing() {
        let h = Harness::new();
        let job = job(&[("A", &["a1", "a2"]), ("B", &["b1", "b2"])]);
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let result = h.orchestrator().run_job_with_cancel(&job, rx).await.unwrap();

        assert_eq!((result.total, result.succeeded, result.failed), (4, 0, 4));
        assert_eq!(result.cancelled(), 4);
        assert!(result.failures.iter().all(|f| f.reason == "cancelled"));
        assert!(h.store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_between_combinations() {
        let mut h = Harness::new();
        let (tx, rx) = watch::channel(false);
        h.store = Arc::new(MemoryStore::cancelling_after_first(tx));
        let job = job(&[("A", &["a1", "a2", "a3"])]);

        let result = h.orchestrator().run_job_with_cancel(&job, rx).await.unwrap();

        assert_eq!((result.succeeded, result.failed), (1, 2));
        assert_eq!(result.cancelled(), 2);
        assert_eq!(
            result.failures.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(h.store.keys(), vec!["promo/promo_combo_0.mp4".to_string()]);
    }

    #[tokio::test]
    async fn test_parallel_slots_render_everything() {
        let mut h = Harness::new();
        h.concurrency = 3;
        let job = job(&[("A", &["a1", "a2"]), ("B", &["b1", "b2", "b3"])]);

        let result = h.orchestrator().run_job(&job).await.unwrap();

        assert_eq!((result.total, result.succeeded), (6, 6));
        let mut keys = h.store.keys();
        keys.sort();
        let mut expected: Vec<String> = (0..6).map(|i| format!("promo/promo_combo_{i}.mp4")).collect();
        expected.sort();
        assert_eq!(keys, expected);
        // Shared sources are still fetched once with parallel slots
        assert_eq!(h.fetcher.total_calls(), 6);
    }

    #[tokio::test]
    async fn test_workspace_is_removed() {
        let mut h = Harness::new();
        h.store = Arc::new(MemoryStore::failing_on(&["promo/promo_combo_0.mp4"]));
        let job = job(&[("A", &["a1"])]);

        h.orchestrator().run_job(&job).await.unwrap();

        assert!(!h.dir.path().join(job.job_id.as_str()).exists());
    }

    #[tokio::test]
    async fn test_invalid_job_is_rejected() {
        let h = Harness::new();
        let mut job = job(&[("A", &["a1"])]);
        job.voice_lines.clear();

        let err = h.orchestrator().run_job(&job).await.unwrap_err();
        assert!(matches!(err, WorkerError::InvalidJob(_)));
        assert!(!h.dir.path().join(job.job_id.as_str()).exists());
    }

    #[test]
    fn test_batch_result_serializes_failures() {
        let result = BatchResult {
            job_id: JobId::from_string("job-1"),
            job_name: "promo".to_string(),
            total: 3,
            succeeded: 2,
            failed: 1,
            elapsed_secs: 1.5,
            failures: vec![ComboFailure::new(
                1,
                ComboStage::Uploading,
                &ComboError::Upload(combocut_storage::StorageError::upload_failed("boom")),
            )],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["failures"][0]["stage"], "uploading");
        assert_eq!(json["failures"][0]["index"], 1);
        assert_eq!(result.elapsed(), Duration::from_millis(1500));
        assert_eq!(result.cancelled(), 0);
    }
}
