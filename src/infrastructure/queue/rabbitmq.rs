use anyhow::{anyhow, Result};
use lapin::{
    options::*, types::FieldTable, BasicProperties, Channel, Connection,
    ConnectionProperties,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Persistent delivery, so dispatches survive a broker restart.
const DELIVERY_PERSISTENT: u8 = 2;

/// Publishes dispatch messages for the external transcode worker onto one
/// durable queue.
#[derive(Clone)]
pub struct RabbitMqDispatcher {
    url: String,
    queue: String,
    channel: Arc<Mutex<Channel>>,
    // Held so the connection lives as long as its channel.
    conn: Arc<Mutex<Connection>>,
}

impl RabbitMqDispatcher {
    async fn open(url: &str, queue: &str) -> Result<(Connection, Channel)> {
        let conn = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| anyhow!("Failed to connect to RabbitMQ: {}", e))?;

        let channel = conn
            .create_channel()
            .await
            .map_err(|e| anyhow!("Failed to create channel: {}", e))?;

        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to declare dispatch queue {}: {}", queue, e))?;

        info!(queue, "Dispatch queue ready");
        Ok((conn, channel))
    }

    pub async fn new(url: &str, queue: &str) -> Result<Self> {
        let (conn, channel) = Self::open(url, queue).await?;

        Ok(Self {
            url: url.to_string(),
            queue: queue.to_string(),
            channel: Arc::new(Mutex::new(channel)),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn reopen(&self) -> Result<()> {
        let (conn, channel) = Self::open(&self.url, &self.queue).await?;
        *self.conn.lock().await = conn;
        *self.channel.lock().await = channel;
        Ok(())
    }

    async fn send(&self, payload: &[u8]) -> Result<()> {
        let channel = self.channel.lock().await;
        channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default().with_delivery_mode(DELIVERY_PERSISTENT),
            )
            .await
            .map_err(|e| anyhow!("Failed to publish dispatch message: {}", e))?
            .await
            .map_err(|e| anyhow!("Failed to confirm dispatch message: {}", e))?;
        Ok(())
    }

    /// Publish once; on failure reopen the connection and try exactly once more.
    pub async fn publish(&self, payload: &[u8]) -> Result<()> {
        if let Err(e) = self.send(payload).await {
            warn!(queue = %self.queue, "Dispatch failed: {}. Reopening connection.", e);
            self.reopen().await?;
            self.send(payload).await?;
        }
        Ok(())
    }
}
