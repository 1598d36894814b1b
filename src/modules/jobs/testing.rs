//! In-memory collaborators for exercising the job lifecycle without Redis
//! or RabbitMQ.

use super::model::WorkerArgs;
use super::service::{IdGenerator, JobService};
use crate::config::settings::AppConfig;
use crate::infrastructure::queue::{JobQueue, QueueHandle, QueueState};
use crate::infrastructure::storage::rewrite::InternalHostRewriter;
use crate::infrastructure::store::IndexStore;
use crate::state::AppState;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct MemoryIndexStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryIndexStore {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Queue that keeps handles in a map. Enqueue can be made to fail, and
/// enqueue timestamps can be withheld to mimic a queue that has not yet
/// reported them.
#[derive(Default)]
pub struct MemoryQueue {
    jobs: Mutex<HashMap<String, QueueHandle>>,
    pub fail_enqueue: AtomicBool,
    pub withhold_enqueued_at: AtomicBool,
    pub cancel_calls: AtomicUsize,
}

impl MemoryQueue {
    pub fn handle(&self, id: &str) -> Option<QueueHandle> {
        self.jobs.lock().unwrap().get(id).cloned()
    }

    pub fn set_state(&self, id: &str, state: &str) {
        if let Some(handle) = self.jobs.lock().unwrap().get_mut(id) {
            handle.state = state.to_string();
        }
    }

    pub fn evict(&self, id: &str) {
        self.jobs.lock().unwrap().remove(id);
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(
        &self,
        func: &str,
        args: WorkerArgs,
        job_id: &str,
        timeout: Duration,
    ) -> Result<QueueHandle> {
        if self.fail_enqueue.load(Ordering::SeqCst) {
            return Err(anyhow!("queue unavailable"));
        }
        let mut handle = QueueHandle::queued(func, args, job_id, timeout);
        if self.withhold_enqueued_at.load(Ordering::SeqCst) {
            handle.enqueued_at = None;
        }
        self.jobs
            .lock()
            .unwrap()
            .insert(job_id.to_string(), handle.clone());
        Ok(handle)
    }

    async fn fetch_many(&self, ids: &[String]) -> Result<Vec<Option<QueueHandle>>> {
        let jobs = self.jobs.lock().unwrap();
        Ok(ids.iter().map(|id| jobs.get(id).cloned()).collect())
    }

    async fn cancel(&self, handle: &QueueHandle) -> Result<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        let id = handle.id.clone().ok_or_else(|| anyhow!("missing id"))?;
        if let Some(stored) = self.jobs.lock().unwrap().get_mut(&id) {
            let terminal = stored
                .state
                .parse::<QueueState>()
                .is_ok_and(|state| state.is_terminal());
            if !terminal {
                stored.state = QueueState::Canceled.as_str().to_string();
            }
        }
        Ok(())
    }
}

/// Yields `id-1`, `id-2`, ...
#[derive(Default)]
pub struct SequentialIds {
    next: AtomicUsize,
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        format!("id-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Application state wired to in-memory collaborators.
pub fn app_state(store: Arc<MemoryIndexStore>, queue: Arc<MemoryQueue>) -> AppState {
    let config = AppConfig {
        server_port: 0,
        redis_url: "redis://localhost:6379".to_string(),
        amqp_url: "amqp://localhost:5672".to_string(),
        queue_name: "transcodes".to_string(),
        job_retention_secs: 3600,
        live_external_host: None,
        live_endpoint_url: None,
    };
    let jobs = JobService::new(
        store,
        queue,
        Arc::new(SequentialIds::default()),
        InternalHostRewriter::from_config(&config),
    );
    AppState::new(jobs)
}
