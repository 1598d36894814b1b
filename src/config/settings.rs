use serde::Deserialize;
use crate::config::env::{self, EnvKey};

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub redis_url: String,
    pub amqp_url: String,
    pub queue_name: String,
    /// Seconds a job record is kept beyond its maximum run time.
    pub job_retention_secs: u64,
    /// Host clients see for live storage, e.g. `localhost:9000`.
    pub live_external_host: Option<String>,
    /// Endpoint the worker must use instead, e.g. `http://minio:9000`.
    pub live_endpoint_url: Option<String>,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            redis_url: env::get(EnvKey::RedisUrl)?,
            amqp_url: env::get(EnvKey::AmqpUrl)?,
            queue_name: env::get_or(EnvKey::QueueName, "transcodes"),
            job_retention_secs: env::get_parsed(EnvKey::JobRetention, 7 * 24 * 3600),
            live_external_host: env::get_opt(EnvKey::LiveExternalHost),
            live_endpoint_url: env::get_opt(EnvKey::LiveEndpointUrl),
        })
    }
}
