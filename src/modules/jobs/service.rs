use super::error::JobError;
use super::index::{gid_key, project_key, JobIndex};
use super::model::{Job, JobSelector, WorkerArgs};
use super::projection::project;
use crate::infrastructure::queue::{JobQueue, QueueHandle};
use crate::infrastructure::storage::rewrite::InternalHostRewriter;
use crate::infrastructure::store::IndexStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Worker function the queue invokes for every transcode.
pub const WORKER_ENTRY_POINT: &str = "tator.transcode.__main__.transcode_main";

/// Maximum run time of a single transcode.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(3600 * 96);

pub trait IdGenerator: Send + Sync + 'static {
    fn generate(&self) -> String;
}

pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[derive(Clone)]
pub struct JobService {
    index: JobIndex,
    queue: Arc<dyn JobQueue>,
    ids: Arc<dyn IdGenerator>,
    rewriter: InternalHostRewriter,
}

impl JobService {
    pub fn new(
        store: Arc<dyn IndexStore>,
        queue: Arc<dyn JobQueue>,
        ids: Arc<dyn IdGenerator>,
        rewriter: InternalHostRewriter,
    ) -> Self {
        Self {
            index: JobIndex::new(store),
            queue,
            ids,
            rewriter,
        }
    }

    /// Submit every job in order. The first failure aborts the batch; jobs
    /// already queued by this call stay queued.
    pub async fn create(&self, jobs: Vec<Job>) -> Result<Vec<Job>, JobError> {
        let mut handles = Vec::with_capacity(jobs.len());
        for mut job in jobs {
            let uid = self.fresh_or(job.uid.take());
            let gid = self.fresh_or(job.gid.take());
            job.uid = Some(uid.clone());
            job.gid = Some(gid);

            let handle = self
                .submit(&uid, job)
                .await
                .map_err(|e| JobError::Submission {
                    uid,
                    source: Box::new(e),
                })?;
            handles.push(handle);
        }

        info!(count = handles.len(), "Created transcode jobs");
        handles.iter().map(project).collect()
    }

    /// Cancel the selected jobs and drop them from their own group and
    /// project indices. Returns how many live jobs were canceled.
    pub async fn cancel(&self, selector: JobSelector) -> Result<usize, JobError> {
        let uids = self.resolve(&selector).await?;
        let handles = self.queue.fetch_many(&uids).await.map_err(JobError::Queue)?;

        let mut canceled = 0;
        for handle in handles.into_iter().flatten() {
            self.queue.cancel(&handle).await.map_err(JobError::Queue)?;
            self.unindex(&handle).await?;
            canceled += 1;
        }

        info!(?selector, canceled, "Canceled transcode jobs");
        Ok(canceled)
    }

    /// Current view of the selected jobs. Uids the queue no longer knows are
    /// left out.
    pub async fn query(&self, selector: JobSelector) -> Result<Vec<Job>, JobError> {
        let uids = self.resolve(&selector).await?;
        let handles = self.queue.fetch_many(&uids).await.map_err(JobError::Queue)?;

        let live: Vec<QueueHandle> = handles.into_iter().flatten().collect();
        if live.len() < uids.len() {
            debug!(?selector, missing = uids.len() - live.len(), "Skipping unknown jobs");
        }
        live.iter().map(project).collect()
    }

    fn fresh_or(&self, id: Option<String>) -> String {
        id.filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.ids.generate())
    }

    async fn submit(&self, uid: &str, mut job: Job) -> Result<QueueHandle, JobError> {
        job.url = self.rewriter.rewrite(&job.url)?;
        job.clear_derived();

        if let Some(gid) = &job.gid {
            self.index.append(&gid_key(gid), uid).await?;
        }
        self.index.append(&project_key(job.project), uid).await?;

        self.queue
            .enqueue(WORKER_ENTRY_POINT, WorkerArgs::new(job), uid, JOB_TIMEOUT)
            .await
            .map_err(JobError::Queue)
    }

    async fn unindex(&self, handle: &QueueHandle) -> Result<(), JobError> {
        let job = &handle.args.job;
        let Some(uid) = job.uid.as_deref().or(handle.id.as_deref()) else {
            return Ok(());
        };
        if let Some(gid) = &job.gid {
            self.index.remove(&gid_key(gid), uid).await?;
        }
        self.index.remove(&project_key(job.project), uid).await
    }

    async fn resolve(&self, selector: &JobSelector) -> Result<Vec<String>, JobError> {
        match selector {
            JobSelector::Uids(uids) => Ok(uids.clone()),
            JobSelector::Group(gid) => self.index.list(&gid_key(gid)).await,
            JobSelector::Project(project) => self.index.list(&project_key(*project)).await,
        }
    }
}
