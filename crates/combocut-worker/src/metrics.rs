//! Render metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host process installs a recorder.

use metrics::{counter, histogram};

use crate::error::ComboStage;

/// Metric names as constants for consistency.
pub mod names {
    pub const COMBOS_RENDERED_TOTAL: &str = "combocut_combos_rendered_total";
    pub const COMBOS_FAILED_TOTAL: &str = "combocut_combos_failed_total";
    pub const COMBO_DURATION_SECONDS: &str = "combocut_combo_duration_seconds";
    pub const UPLOAD_DURATION_SECONDS: &str = "combocut_upload_duration_seconds";
    pub const JOBS_COMPLETED_TOTAL: &str = "combocut_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "combocut_jobs_failed_total";
}

/// Record a combination that reached storage.
pub fn record_combo_rendered(duration_secs: f64) {
    counter!(names::COMBOS_RENDERED_TOTAL).increment(1);
    histogram!(names::COMBO_DURATION_SECONDS).record(duration_secs);
}

/// Record a failed combination by the stage it failed in.
pub fn record_combo_failed(stage: ComboStage) {
    let labels = [("stage", stage.as_str().to_string())];
    counter!(names::COMBOS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_upload_duration(duration_secs: f64) {
    histogram!(names::UPLOAD_DURATION_SECONDS).record(duration_secs);
}

/// Record a finished job.
pub fn record_job_completed(failed_combos: usize) {
    let outcome = if failed_combos == 0 { "complete" } else { "partial" };
    let labels = [("outcome", outcome.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
}

pub fn record_job_failed() {
    counter!(names::JOBS_FAILED_TOTAL).increment(1);
}
