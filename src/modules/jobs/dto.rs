use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SelectorParams {
    /// Upload group id.
    pub gid: Option<String>,
    /// Project id.
    pub project: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancelResponse {
    pub canceled: usize,
}
