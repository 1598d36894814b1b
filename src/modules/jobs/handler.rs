use super::dto::{CancelResponse, SelectorParams};
use super::model::{Job, JobSelector};
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::fmt::Display;
use tracing::error;
use validator::Validate;

fn validation_error(detail: impl Display) -> ApiError {
    error!("Request validation error: {}", detail);
    ApiError(format!("Validation error! {}", detail), StatusCode::UNPROCESSABLE_ENTITY)
}

/// The optional body of cancel and query requests: a JSON array of uids.
fn parse_uid_list(body: &[u8]) -> Result<Option<Vec<String>>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map_err(validation_error)
}

fn selector(
    params: Result<Query<SelectorParams>, QueryRejection>,
    body: &[u8],
) -> Result<JobSelector, ApiError> {
    let Query(params) = params.map_err(|rejection| validation_error(rejection.body_text()))?;
    let uid_list = parse_uid_list(body)?;
    Ok(JobSelector::resolve(uid_list, params.gid, params.project)?)
}

/// Create one or more transcode jobs
#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    request_body = Vec<Job>,
    responses(
        (status = 201, description = "List of created jobs", body = ApiResponse<Vec<Job>>),
        (status = 400, description = "Error creating the transcode jobs"),
        (status = 422, description = "Validation error")
    ),
    tag = "Transcode"
)]
pub async fn create_jobs(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Job>>, JsonRejection>,
) -> impl IntoResponse {
    let jobs = match payload {
        Ok(Json(jobs)) => jobs,
        Err(rejection) => return validation_error(rejection.body_text()).into_response(),
    };
    if let Err(e) = jobs.iter().try_for_each(|job| job.validate()) {
        return validation_error(e).into_response();
    }

    match state.jobs.create(jobs).await {
        Ok(created) => {
            ApiSuccess::created(created, "Transcode jobs created successfully").into_response()
        }
        Err(e) => {
            error!("Error creating transcode jobs: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

/// Returns the current status of a set of transcodes
#[utoipa::path(
    put,
    path = "/api/v1/jobs",
    params(SelectorParams),
    request_body(content = Vec<String>, description = "Explicit list of job uids"),
    responses(
        (status = 200, description = "List of jobs", body = ApiResponse<Vec<Job>>),
        (status = 400, description = "No jobs specified"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Transcode"
)]
pub async fn query_jobs(
    State(state): State<AppState>,
    params: Result<Query<SelectorParams>, QueryRejection>,
    body: Bytes,
) -> impl IntoResponse {
    let selector = match selector(params, &body) {
        Ok(selector) => selector,
        Err(e) => return e.into_response(),
    };

    match state.jobs.query(selector).await {
        Ok(jobs) => ApiSuccess::ok(jobs, "Transcode jobs retrieved successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Cancels a set of transcodes
#[utoipa::path(
    delete,
    path = "/api/v1/jobs",
    params(SelectorParams),
    request_body(content = Vec<String>, description = "Explicit list of job uids"),
    responses(
        (status = 200, description = "Successful cancellation of jobs", body = ApiResponse<CancelResponse>),
        (status = 400, description = "No jobs specified"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Transcode"
)]
pub async fn cancel_jobs(
    State(state): State<AppState>,
    params: Result<Query<SelectorParams>, QueryRejection>,
    body: Bytes,
) -> impl IntoResponse {
    let selector = match selector(params, &body) {
        Ok(selector) => selector,
        Err(e) => return e.into_response(),
    };

    match state.jobs.cancel(selector).await {
        Ok(canceled) => ApiSuccess::ok(
            CancelResponse { canceled },
            &format!("Successfully canceled {} jobs!", canceled),
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
