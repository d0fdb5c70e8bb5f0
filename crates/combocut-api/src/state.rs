//! Application state.

use std::sync::Arc;

use async_trait::async_trait;

use combocut_queue::{JobQueue, QueueResult, RenderCombosJob};

use crate::config::ApiConfig;
use crate::error::ApiResult;

/// Destination for accepted jobs.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    /// Enqueue a job, returning the queue message ID.
    async fn submit(&self, job: &RenderCombosJob) -> QueueResult<String>;

    /// Check the backing store is reachable.
    async fn ping(&self) -> QueueResult<()>;

    /// Number of jobs waiting.
    async fn depth(&self) -> QueueResult<u64>;
}

#[async_trait]
impl JobSubmitter for JobQueue {
    async fn submit(&self, job: &RenderCombosJob) -> QueueResult<String> {
        self.enqueue(job).await
    }

    async fn ping(&self) -> QueueResult<()> {
        JobQueue::ping(self).await
    }

    async fn depth(&self) -> QueueResult<u64> {
        self.len().await
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub queue: Arc<dyn JobSubmitter>,
}

impl AppState {
    /// Create state backed by the Redis job queue.
    pub async fn new(config: ApiConfig) -> ApiResult<Self> {
        let queue = JobQueue::from_env()?;
        queue.init().await?;
        Ok(Self::with_submitter(config, Arc::new(queue)))
    }

    pub fn with_submitter(config: ApiConfig, queue: Arc<dyn JobSubmitter>) -> Self {
        Self { config, queue }
    }
}
