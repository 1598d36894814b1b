use redis::{Client, aio::MultiplexedConnection};
use tracing::info;

/// Shared handle to the Redis instance holding indices and job records.
#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Opens the client and fails fast if the server does not answer PING.
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(connection_string)?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("Redis reachable");
        Ok(Self { client })
    }

    pub async fn get_conn(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}
