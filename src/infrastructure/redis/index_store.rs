use super::client::RedisService;
use crate::infrastructure::store::IndexStore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use redis::AsyncCommands;

#[async_trait]
impl IndexStore for RedisService {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| anyhow!("Failed to read index key {}: {}", key, e))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let _: () = conn
            .set(key, value)
            .await
            .map_err(|e| anyhow!("Failed to write index key {}: {}", key, e))?;
        Ok(())
    }
}
