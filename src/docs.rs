use utoipa::OpenApi;
use crate::modules::jobs::dto::CancelResponse;
use crate::modules::jobs::model::{Job, JobStatus};

#[derive(OpenApi)]
#[openapi(
    info(title = "Transcode", description = "Simple transcode API"),
    paths(
        crate::modules::jobs::handler::create_jobs,
        crate::modules::jobs::handler::query_jobs,
        crate::modules::jobs::handler::cancel_jobs,
    ),
    components(
        schemas(Job, JobStatus, CancelResponse)
    ),
    tags(
        (name = "Transcode", description = "Transcode job submission and tracking")
    )
)]
pub struct ApiDoc;
