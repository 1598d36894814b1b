use crate::infrastructure::storage::rewrite::RewriteError;
use crate::common::response::ApiError;
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("At least one parameter specifying jobs must be provided!")]
    SelectorMissing,

    #[error("Index member '{0}' must not contain ','")]
    InvalidIndexMember(String),

    #[error("Job {id} reported unknown queue state '{state}'")]
    UnmappedQueueState { id: String, state: String },

    #[error("Failed to submit job {uid}: {source}")]
    Submission {
        uid: String,
        #[source]
        source: Box<JobError>,
    },

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("Index store error: {0}")]
    Store(anyhow::Error),

    #[error("Queue error: {0}")]
    Queue(anyhow::Error),
}

impl JobError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            JobError::SelectorMissing
            | JobError::InvalidIndexMember(_)
            | JobError::Submission { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        ApiError(e.to_string(), e.status_code())
    }
}
