//! Job executor.
//!
//! Pulls render jobs from the queue, runs each through the
//! [`BatchOrchestrator`] and settles the stream entry. A job whose
//! combinations failed individually still counts as handled and is
//! acknowledged; only job-level errors go through retry and the DLQ.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use combocut_queue::{JobQueue, RenderCombosJob};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::orchestrator::{BatchOrchestrator, BatchResult};

/// Grace period for in-flight jobs after they are told to cancel.
const CANCEL_GRACE: Duration = Duration::from_secs(15);

/// What to do with a stream entry once its job returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Ack,
    /// Leave pending so another worker re-renders it after claim_min_idle
    Redeliver,
}

fn settle(result: &BatchResult) -> Settlement {
    if result.cancelled() > 0 {
        Settlement::Redeliver
    } else {
        Settlement::Ack
    }
}

/// Job executor that processes jobs from the queue.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    orchestrator: Arc<BatchOrchestrator>,
    job_semaphore: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
    cancel: watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    pub fn new(config: WorkerConfig, queue: JobQueue, orchestrator: BatchOrchestrator) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = watch::channel(false);
        let (cancel, _) = watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Self {
            config,
            queue: Arc::new(queue),
            orchestrator: Arc::new(orchestrator),
            job_semaphore,
            shutdown,
            cancel,
            consumer_name,
        }
    }

    /// Run until [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor '{}' with {} max concurrent jobs, {} render slots per job",
            self.consumer_name, self.config.max_concurrent_jobs, self.config.combo_concurrency
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();
        let claim_task = self.spawn_claim_loop();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs() => {
                    if let Err(e) = result {
                        error!("Error consuming jobs: {}", e);
                        // Back off on error
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight jobs to complete...");
        if tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs())
            .await
            .is_err()
        {
            warn!(
                "In-flight jobs still running after {:?}, cancelling remaining combinations",
                self.config.shutdown_timeout
            );
            let _ = self.cancel.send(true);
            let _ = tokio::time::timeout(CANCEL_GRACE, self.wait_for_jobs()).await;
        }

        info!("Job executor stopped");
        Ok(())
    }

    fn spawn_claim_loop(&self) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let orchestrator = Arc::clone(&self.orchestrator);
        let semaphore = Arc::clone(&self.job_semaphore);
        let consumer_name = self.consumer_name.clone();
        let cancel = self.cancel.subscribe();
        let mut shutdown_rx = self.shutdown.subscribe();
        let claim_interval = self.config.claim_interval;
        let min_idle_ms = self.config.claim_min_idle.as_millis() as u64;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue.claim_pending(&consumer_name, min_idle_ms, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!("Claimed {} pending jobs", jobs.len());
                                for (message_id, job) in jobs {
                                    let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                                        break;
                                    };
                                    let orchestrator = Arc::clone(&orchestrator);
                                    let queue = Arc::clone(&queue);
                                    let cancel = cancel.clone();
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_job(orchestrator, queue, cancel, message_id, job).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Failed to claim pending jobs: {}", e);
                            }
                        }
                    }
                }
            }
        })
    }

    /// Consume and process jobs from the queue.
    async fn consume_jobs(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            // All slots busy, wait a bit
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(&self.consumer_name, 1000, available.min(5))
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!("Consumed {} jobs from queue", jobs.len());

        for (message_id, job) in jobs {
            let orchestrator = Arc::clone(&self.orchestrator);
            let queue = Arc::clone(&self.queue);
            let cancel = self.cancel.subscribe();
            let permit = Arc::clone(&self.job_semaphore)
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::job_failed("Semaphore closed"))?;

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_job(orchestrator, queue, cancel, message_id, job).await;
            });
        }

        Ok(())
    }

    /// Execute a single job with retry and DLQ handling.
    async fn execute_job(
        orchestrator: Arc<BatchOrchestrator>,
        queue: Arc<JobQueue>,
        cancel: watch::Receiver<bool>,
        message_id: String,
        job: RenderCombosJob,
    ) {
        let job_id = job.job_id().to_string();
        info!("Executing job {} ({})", job_id, job.name());

        match orchestrator.run_job_with_cancel(&job.job, cancel).await {
            Ok(result) => match settle(&result) {
                Settlement::Ack => {
                    metrics::record_job_completed(result.failed);
                    info!(
                        "Job {} finished: {}/{} combinations rendered",
                        job_id, result.succeeded, result.total
                    );
                    if let Err(e) = queue.ack(&message_id).await {
                        error!("Failed to ack job {}: {}", job_id, e);
                    }
                }
                Settlement::Redeliver => {
                    warn!(
                        "Job {} interrupted with {} combinations cancelled, leaving it for redelivery",
                        job_id,
                        result.cancelled()
                    );
                }
            },
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                metrics::record_job_failed();

                if !e.is_retryable() {
                    if let Err(dlq_err) = queue.dlq(&message_id, &job, &e.to_string()).await {
                        error!("Failed to move job {} to DLQ: {}", job_id, dlq_err);
                    }
                    return;
                }

                let retry_count = queue.increment_retry(&message_id).await.unwrap_or(u32::MAX);
                let max_retries = queue.max_retries();

                if retry_count >= max_retries {
                    warn!("Job {} exceeded max retries ({}), moving to DLQ", job_id, max_retries);
                    if let Err(dlq_err) = queue.dlq(&message_id, &job, &e.to_string()).await {
                        error!("Failed to move job {} to DLQ: {}", job_id, dlq_err);
                    }
                } else {
                    info!(
                        "Job {} will be retried (attempt {}/{})",
                        job_id, retry_count, max_retries
                    );
                    // Redelivered once claim_min_idle has passed
                }
            }
        }
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        loop {
            let available = self.job_semaphore.available_permits();
            if available == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn consumer_name(&self) -> &str {
        &self.consumer_name
    }
}
