//! Read-time view of a queued job in the external status vocabulary.

use super::error::JobError;
use super::model::{Job, JobStatus};
use crate::infrastructure::queue::{QueueHandle, QueueState};

pub fn status_for(state: QueueState) -> JobStatus {
    match state {
        QueueState::Queued | QueueState::Deferred | QueueState::Scheduled => JobStatus::Pending,
        QueueState::Started => JobStatus::Running,
        QueueState::Canceled | QueueState::Stopped => JobStatus::Canceled,
        QueueState::Finished => JobStatus::Succeeded,
        QueueState::Failed => JobStatus::Failed,
    }
}

/// Project a queue handle into the job record clients see. Worker-only
/// settings never leave the queue payload.
pub fn project(handle: &QueueHandle) -> Result<Job, JobError> {
    let state = handle
        .state
        .parse::<QueueState>()
        .map_err(|_| JobError::UnmappedQueueState {
            id: handle.id.clone().unwrap_or_default(),
            state: handle.state.clone(),
        })?;

    let mut job = handle.args.job.clone();
    job.status = Some(status_for(state));
    if let Some(id) = &handle.id {
        job.id = Some(id.clone());
    }
    job.start_time = handle.enqueued_at;
    job.stop_time = handle.ended_at;
    Ok(job)
}
