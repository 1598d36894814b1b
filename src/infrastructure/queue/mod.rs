//! Work queue contract consumed by the job lifecycle, plus the
//! Redis/RabbitMQ adapter used in production.

pub mod rabbitmq;
pub mod redis_queue;

use crate::modules::jobs::model::WorkerArgs;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;

/// State vocabulary reported by the queue itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Queued,
    Deferred,
    Scheduled,
    Started,
    Canceled,
    Stopped,
    Finished,
    Failed,
}

impl QueueState {
    pub const ALL: [QueueState; 8] = [
        QueueState::Queued,
        QueueState::Deferred,
        QueueState::Scheduled,
        QueueState::Started,
        QueueState::Canceled,
        QueueState::Stopped,
        QueueState::Finished,
        QueueState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueState::Queued => "queued",
            QueueState::Deferred => "deferred",
            QueueState::Scheduled => "scheduled",
            QueueState::Started => "started",
            QueueState::Canceled => "canceled",
            QueueState::Stopped => "stopped",
            QueueState::Finished => "finished",
            QueueState::Failed => "failed",
        }
    }

    /// The worker will not touch a job in this state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueueState::Canceled | QueueState::Stopped | QueueState::Finished | QueueState::Failed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownQueueState(pub String);

impl FromStr for QueueState {
    type Err = UnknownQueueState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueueState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownQueueState(s.to_string()))
    }
}

/// A job as the queue reports it.
///
/// `state` is kept as the raw string the queue stored so that a state
/// written by a newer worker is surfaced instead of being coerced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueHandle {
    pub id: Option<String>,
    pub func: String,
    pub args: WorkerArgs,
    pub state: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub enqueued_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
    pub timeout_secs: u64,
}

impl QueueHandle {
    /// A freshly enqueued record, stamped with the current time.
    pub fn queued(func: &str, args: WorkerArgs, job_id: &str, timeout: Duration) -> Self {
        Self {
            id: Some(job_id.to_string()),
            func: func.to_string(),
            args,
            state: QueueState::Queued.as_str().to_string(),
            enqueued_at: Some(OffsetDateTime::now_utc()),
            ended_at: None,
            timeout_secs: timeout.as_secs(),
        }
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync + 'static {
    /// Queue `args` for the worker entry point `func` under `job_id`.
    async fn enqueue(
        &self,
        func: &str,
        args: WorkerArgs,
        job_id: &str,
        timeout: Duration,
    ) -> Result<QueueHandle>;

    /// One slot per requested id, `None` where the queue no longer knows the job.
    async fn fetch_many(&self, ids: &[String]) -> Result<Vec<Option<QueueHandle>>>;

    /// Mark the job canceled. Jobs already in a terminal state keep it.
    async fn cancel(&self, handle: &QueueHandle) -> Result<()>;
}
