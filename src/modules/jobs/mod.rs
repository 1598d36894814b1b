use axum::Router;
use axum::routing::post;
use crate::state::AppState;

pub mod dto;
pub mod error;
pub mod handler;
pub mod index;
pub mod model;
pub mod projection;
pub mod service;

#[cfg(test)]
pub mod testing;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/jobs",
        post(handler::create_jobs)
            .put(handler::query_jobs)
            .delete(handler::cancel_jobs),
    )
}
