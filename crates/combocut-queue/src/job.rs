//! Job types for the queue.

use chrono::{DateTime, Utc};
use combocut_models::{Job, JobId};
use serde::{Deserialize, Serialize};

/// Job to render every combination of a validated [`Job`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderCombosJob {
    /// The job description
    pub job: Job,
    /// When the job was put on the queue
    pub enqueued_at: DateTime<Utc>,
}

impl RenderCombosJob {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            enqueued_at: Utc::now(),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job.job_id
    }

    /// Job name (output prefix).
    pub fn name(&self) -> &str {
        &self.job.name
    }

    /// Serialize for the stream entry.
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a stream entry payload.
    pub fn from_payload(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combocut_models::VoiceLine;
    use std::collections::BTreeMap;

    #[test]
    fn test_payload_preserves_job() {
        let mut blocks = BTreeMap::new();
        blocks.insert("b".to_string(), vec!["https://cdn/b1.mp4".to_string()]);
        blocks.insert("a".to_string(), vec!["https://cdn/a1.mp4".to_string()]);
        let job = Job::new(
            "promo",
            blocks,
            vec!["https://cdn/m.mp3".to_string()],
            vec![VoiceLine::new("Hi", "Sarah")],
        );

        let queued = RenderCombosJob::new(job);
        let payload = queued.to_payload().unwrap();
        let back = RenderCombosJob::from_payload(&payload).unwrap();

        assert_eq!(back.job_id(), queued.job_id());
        assert_eq!(back.name(), "promo");
        assert_eq!(back.job.total_combinations(), 1);
        assert_eq!(back.job.voice_lines, vec![VoiceLine::new("Hi", "Sarah")]);
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        assert!(RenderCombosJob::from_payload("{\"job\": 1}").is_err());
    }
}
