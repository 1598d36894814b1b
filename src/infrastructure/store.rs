use anyhow::Result;
use async_trait::async_trait;

/// String-keyed store backing the group and project indices.
///
/// Only single-key get/set is assumed; concurrent writers to the same key
/// race and the last write wins.
#[async_trait]
pub trait IndexStore: Send + Sync + 'static {
    /// Returns `None` when the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
