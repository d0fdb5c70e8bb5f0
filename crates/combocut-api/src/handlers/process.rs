//! Job submission.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use combocut_models::ProcessMediaRequest;
use combocut_queue::RenderCombosJob;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Acknowledgement for an accepted job.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessMediaResponse {
    pub message: String,
    pub task_id: String,
    pub project_name: String,
    pub status: u16,
}

/// Validate a render request and queue it.
///
/// Returns 202 once the job is on the queue. Rendering happens in a worker;
/// the outputs appear under `<task_name>/` in object storage.
pub async fn process_media(
    State(state): State<AppState>,
    payload: Result<Json<ProcessMediaRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProcessMediaResponse>)> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let job = request.into_job()?;
    let total = job.total_combinations();
    let queued = RenderCombosJob::new(job);

    let message_id = state.queue.submit(&queued).await?;
    metrics::record_job_enqueued(total);

    info!(
        job_id = %queued.job_id(),
        message_id = %message_id,
        "Accepted job {} with {} combinations",
        queued.name(),
        total
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ProcessMediaResponse {
            message: "Task submitted successfully".to_string(),
            task_id: queued.job_id().to_string(),
            project_name: queued.name().to_string(),
            status: StatusCode::ACCEPTED.as_u16(),
        }),
    ))
}
