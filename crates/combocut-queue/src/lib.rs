//! Redis Streams job queue.
//!
//! This crate provides:
//! - Job enqueueing via Redis Streams
//! - Consumer-group consumption with retry counters and a DLQ
//! - Reclaiming of jobs abandoned by crashed workers

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::RenderCombosJob;
pub use queue::{JobQueue, QueueConfig};
