use crate::config::settings::AppConfig;
use crate::infrastructure::queue::rabbitmq::RabbitMqDispatcher;
use crate::infrastructure::queue::redis_queue::RedisJobQueue;
use crate::infrastructure::redis::client::RedisService;
use crate::infrastructure::storage::rewrite::InternalHostRewriter;
use crate::modules::jobs::service::{JobService, UuidGenerator};
use crate::state::AppState;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting transcode service...");

    let config = AppConfig::new()?;
    let redis = RedisService::new(&config.redis_url).await?;
    let dispatcher = RabbitMqDispatcher::new(&config.amqp_url, &config.queue_name).await?;
    let queue = RedisJobQueue::new(
        redis.clone(),
        dispatcher,
        Duration::from_secs(config.job_retention_secs),
    );

    let jobs = JobService::new(
        Arc::new(redis),
        Arc::new(queue),
        Arc::new(UuidGenerator),
        InternalHostRewriter::from_config(&config),
    );
    let addr = format!("0.0.0.0:{}", config.server_port);
    let app = app::create_app(AppState::new(jobs)).await;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
