//! Secondary indices from a group or project to its member job uids.
//!
//! Each index is a single key holding a comma-joined, insertion-ordered list.
//! Updates are read-modify-write, so two writers on one key can lose an update.

use super::error::JobError;
use crate::infrastructure::store::IndexStore;
use std::sync::Arc;
use tracing::debug;

const PREFIX: &str = "transcode";

pub const INDEX_SEPARATOR: &str = ",";

pub fn gid_key(gid: &str) -> String {
    format!("{PREFIX}:gid:{gid}")
}

pub fn project_key(project: i64) -> String {
    format!("{PREFIX}:project:{project}")
}

fn split(value: &str) -> Vec<String> {
    value
        .split(INDEX_SEPARATOR)
        .filter(|uid| !uid.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone)]
pub struct JobIndex {
    store: Arc<dyn IndexStore>,
}

impl JobIndex {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self { store }
    }

    /// Member uids in insertion order. A missing or empty key is an empty list.
    pub async fn list(&self, key: &str) -> Result<Vec<String>, JobError> {
        let value = self.store.get(key).await.map_err(JobError::Store)?;
        Ok(value.as_deref().map(split).unwrap_or_default())
    }

    /// Appends `uid` unless it is already a member. A uid containing the
    /// separator is refused before anything is written.
    pub async fn append(&self, key: &str, uid: &str) -> Result<(), JobError> {
        if uid.contains(INDEX_SEPARATOR) {
            return Err(JobError::InvalidIndexMember(uid.to_string()));
        }
        let mut uids = self.list(key).await?;
        if uids.iter().any(|member| member == uid) {
            debug!(key, uid, "Uid already indexed");
            return Ok(());
        }
        uids.push(uid.to_string());
        self.store
            .set(key, &uids.join(INDEX_SEPARATOR))
            .await
            .map_err(JobError::Store)
    }

    /// Removes the first occurrence of `uid`. Leaves the key untouched when
    /// it is absent or does not contain `uid`; may leave an empty string.
    pub async fn remove(&self, key: &str, uid: &str) -> Result<(), JobError> {
        let Some(value) = self.store.get(key).await.map_err(JobError::Store)? else {
            return Ok(());
        };
        let mut uids = split(&value);
        let Some(position) = uids.iter().position(|member| member == uid) else {
            return Ok(());
        };
        uids.remove(position);
        self.store
            .set(key, &uids.join(INDEX_SEPARATOR))
            .await
            .map_err(JobError::Store)
    }
}
