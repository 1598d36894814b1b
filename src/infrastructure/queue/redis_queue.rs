use super::rabbitmq::RabbitMqDispatcher;
use super::{JobQueue, QueueHandle, QueueState};
use crate::infrastructure::redis::client::RedisService;
use crate::modules::jobs::model::WorkerArgs;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const JOB_PREFIX: &str = "transcode:job";

/// Attempts at the compare-and-set in `cancel` before giving up.
const CANCEL_ATTEMPTS: usize = 3;

/// Replace KEYS[1] with ARGV[2] only while it still holds ARGV[1].
const COMPARE_AND_SET: &str = "
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        redis.call('SET', KEYS[1], ARGV[2], 'KEEPTTL')
        return 1
    end
    return 0
";

fn job_key(id: &str) -> String {
    format!("{JOB_PREFIX}:{id}")
}

/// Records outlive the longest possible run by the retention window.
fn record_ttl(timeout_secs: u64, retention: Duration) -> u64 {
    timeout_secs.saturating_add(retention.as_secs())
}

/// One MGET slot. Missing and unreadable records both mean the queue no
/// longer knows the job.
fn decode(id: &str, record: Option<String>) -> Option<QueueHandle> {
    let record = record?;
    match serde_json::from_str::<QueueHandle>(&record) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(job_id = %id, "Ignoring unreadable job record: {}", e);
            None
        }
    }
}

/// The canceled form of a stored record, or `None` when the job already
/// reached a terminal state. Unknown states are canceled like running ones.
fn cancel_record(raw: &str) -> Result<Option<String>> {
    let mut handle: QueueHandle = serde_json::from_str(raw)?;
    if let Ok(state) = handle.state.parse::<QueueState>() {
        if state.is_terminal() {
            return Ok(None);
        }
    }
    handle.state = QueueState::Canceled.as_str().to_string();
    Ok(Some(serde_json::to_string(&handle)?))
}

/// Message the worker receives; the full record is read back from Redis.
#[derive(Debug, Serialize)]
struct DispatchMessage<'a> {
    id: &'a str,
    func: &'a str,
}

/// Queue whose job records live in Redis and whose dispatch goes over RabbitMQ.
#[derive(Clone)]
pub struct RedisJobQueue {
    redis: RedisService,
    dispatcher: RabbitMqDispatcher,
    retention: Duration,
}

impl RedisJobQueue {
    pub fn new(redis: RedisService, dispatcher: RabbitMqDispatcher, retention: Duration) -> Self {
        Self {
            redis,
            dispatcher,
            retention,
        }
    }

    async fn save(&self, id: &str, handle: &QueueHandle) -> Result<()> {
        let record = serde_json::to_string(handle)?;
        let ttl = record_ttl(handle.timeout_secs, self.retention);
        let mut conn = self.redis.get_conn().await?;
        let _: () = conn
            .set_ex(job_key(id), record, ttl)
            .await
            .map_err(|e| anyhow!("Failed to store job {}: {}", id, e))?;
        Ok(())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(
        &self,
        func: &str,
        args: WorkerArgs,
        job_id: &str,
        timeout: Duration,
    ) -> Result<QueueHandle> {
        let handle = QueueHandle::queued(func, args, job_id, timeout);
        self.save(job_id, &handle).await?;

        let message = serde_json::to_vec(&DispatchMessage { id: job_id, func })?;
        self.dispatcher.publish(&message).await?;

        debug!(job_id, "Enqueued transcode job");
        Ok(handle)
    }

    async fn fetch_many(&self, ids: &[String]) -> Result<Vec<Option<QueueHandle>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| job_key(id)).collect();
        let mut conn = self.redis.get_conn().await?;
        // Always MGET so a single id still yields an array reply.
        let records: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow!("Failed to fetch jobs: {}", e))?;

        Ok(records
            .into_iter()
            .zip(ids)
            .map(|(record, id)| decode(id, record))
            .collect())
    }

    /// Re-reads the record and swaps in the canceled form only if the worker
    /// has not written it in between.
    async fn cancel(&self, handle: &QueueHandle) -> Result<()> {
        let id = handle
            .id
            .as_deref()
            .ok_or_else(|| anyhow!("Cannot cancel a job without an id"))?;
        let key = job_key(id);
        let script = redis::Script::new(COMPARE_AND_SET);
        let mut conn = self.redis.get_conn().await?;

        for _ in 0..CANCEL_ATTEMPTS {
            let current: Option<String> = conn
                .get(&key)
                .await
                .map_err(|e| anyhow!("Failed to read job {}: {}", id, e))?;
            let Some(current) = current else {
                debug!(job_id = id, "Job expired before cancel");
                return Ok(());
            };
            let Some(canceled) = cancel_record(&current)? else {
                debug!(job_id = id, "Job already finished, leaving its state");
                return Ok(());
            };

            let swapped: i32 = script
                .key(&key)
                .arg(&current)
                .arg(&canceled)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| anyhow!("Failed to cancel job {}: {}", id, e))?;
            if swapped == 1 {
                return Ok(());
            }
            debug!(job_id = id, "Job record changed during cancel, retrying");
        }

        Err(anyhow!("Job {} kept changing while canceling", id))
    }
}
