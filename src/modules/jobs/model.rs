use super::error::JobError;
use super::index::INDEX_SEPARATOR;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Externally visible job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Canceled,
    Succeeded,
    Failed,
}

fn default_group_to() -> Option<i64> {
    Some(1080)
}

/// Index values are comma-joined, so a member id may not contain a comma.
fn no_separator(value: &str) -> Result<(), ValidationError> {
    if value.contains(INDEX_SEPARATOR) {
        let mut error = ValidationError::new("separator");
        error.message = Some("Must not contain ','".into());
        return Err(error);
    }
    Ok(())
}

/// Job ids arrive as strings or as bare integers.
fn string_or_int<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|id| match id {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    }))
}

/// Workload associated with one input file.
///
/// `id`, `status`, `start_time` and `stop_time` are filled in by the service
/// and ignored on submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Job {
    /// URL where the source video file is hosted.
    pub url: String,
    /// Size of the video file in bytes.
    #[validate(range(min = 0, message = "Size must not be negative"))]
    pub size: i64,
    /// Tator host URL.
    pub host: String,
    /// Tator API token.
    pub token: String,
    pub project: i64,
    /// Media type id.
    #[serde(rename = "type")]
    pub media_type: i64,
    /// Name of the video file.
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub section_id: i64,
    /// Attributes to set on the media.
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<Map<String, Value>>,
    #[schema(value_type = Option<Object>)]
    pub email_spec: Option<Map<String, Value>>,
    pub media_id: Option<i64>,
    /// Upload group id, generated when absent.
    #[validate(custom(function = "no_separator"))]
    pub gid: Option<String>,
    /// Upload unique id, generated when absent.
    #[validate(custom(function = "no_separator"))]
    pub uid: Option<String>,
    /// Vertical resolutions below this are transcoded with multi-headed ffmpeg.
    #[serde(default = "default_group_to")]
    #[validate(range(min = 1, message = "group_to must be positive"))]
    pub group_to: Option<i64>,
    #[serde(default, deserialize_with = "string_or_int")]
    #[schema(value_type = Option<String>)]
    pub id: Option<String>,
    pub status: Option<JobStatus>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub stop_time: Option<OffsetDateTime>,
}

impl Job {
    /// Drop every field the service derives, leaving the submitted payload.
    pub fn clear_derived(&mut self) {
        self.id = None;
        self.status = None;
        self.start_time = None;
        self.stop_time = None;
    }
}

/// Worker-only settings queued alongside every job. Never returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerDefaults {
    pub path: Option<String>,
    pub work_dir: String,
    pub cleanup: bool,
    pub extension: Option<String>,
    pub hwaccel: bool,
    pub force_fps: i32,
    pub inhibit_upload: bool,
}

impl Default for WorkerDefaults {
    fn default() -> Self {
        Self {
            path: None,
            work_dir: "/tmp".to_string(),
            cleanup: false,
            extension: None,
            hwaccel: false,
            force_fps: -1,
            inhibit_upload: false,
        }
    }
}

/// Payload handed to the worker: the submitted job plus worker defaults,
/// serialized as one flat object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerArgs {
    #[serde(flatten)]
    pub job: Job,
    #[serde(flatten)]
    pub worker: WorkerDefaults,
}

impl WorkerArgs {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            worker: WorkerDefaults::default(),
        }
    }
}

/// Which jobs a cancel or query request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSelector {
    Uids(Vec<String>),
    Group(String),
    Project(i64),
}

impl JobSelector {
    /// An explicit uid list wins over a group id, which wins over a project.
    /// An empty uid list counts as not supplied.
    pub fn resolve(
        uid_list: Option<Vec<String>>,
        gid: Option<String>,
        project: Option<i64>,
    ) -> Result<Self, JobError> {
        if let Some(uids) = uid_list.filter(|uids| !uids.is_empty()) {
            return Ok(JobSelector::Uids(uids));
        }
        if let Some(gid) = gid {
            return Ok(JobSelector::Group(gid));
        }
        if let Some(project) = project {
            return Ok(JobSelector::Project(project));
        }
        Err(JobError::SelectorMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission() -> Value {
        json!({
            "url": "https://example.com/video.mp4",
            "size": 1024,
            "host": "https://tator.example.com",
            "token": "secret",
            "project": 42,
            "type": 7,
            "name": "video.mp4",
            "section_id": 3
        })
    }

    #[test]
    fn submission_defaults() {
        let job: Job = serde_json::from_value(submission()).unwrap();
        assert_eq!(job.media_type, 7);
        assert_eq!(job.group_to, Some(1080));
        assert!(job.uid.is_none());
        assert!(job.gid.is_none());
        assert!(job.status.is_none());
        assert!(job.start_time.is_none());
    }

    #[test]
    fn validation_rejects_empty_name_and_negative_size() {
        let mut job: Job = serde_json::from_value(submission()).unwrap();
        assert!(job.validate().is_ok());

        job.name.clear();
        job.size = -1;
        let errors = job.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("size"));
    }

    #[test]
    fn validation_rejects_separator_in_ids() {
        let mut job: Job = serde_json::from_value(submission()).unwrap();
        job.uid = Some("x,victim".to_string());
        job.gid = Some("G,H".to_string());

        let errors = job.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("uid"));
        assert!(fields.contains_key("gid"));

        job.uid = Some("x".to_string());
        job.gid = Some("G".to_string());
        assert!(job.validate().is_ok());
    }

    #[test]
    fn id_accepts_string_or_integer() {
        let mut value = submission();
        value["id"] = json!(17);
        let job: Job = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(job.id.as_deref(), Some("17"));

        value["id"] = json!("abc");
        let job: Job = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(job.id.as_deref(), Some("abc"));

        value["id"] = Value::Null;
        let job: Job = serde_json::from_value(value.clone()).unwrap();
        assert!(job.id.is_none());

        value["id"] = json!([1]);
        assert!(serde_json::from_value::<Job>(value).is_err());
    }

    #[test]
    fn worker_args_flatten_into_one_object() {
        let job: Job = serde_json::from_value(submission()).unwrap();
        let args = serde_json::to_value(WorkerArgs::new(job.clone())).unwrap();

        assert_eq!(args["project"], 42);
        assert_eq!(args["type"], 7);
        assert_eq!(args["work_dir"], "/tmp");
        assert_eq!(args["force_fps"], -1);
        assert_eq!(args["inhibit_upload"], false);

        let back: WorkerArgs = serde_json::from_value(args).unwrap();
        assert_eq!(back.job, job);
        assert_eq!(back.worker, WorkerDefaults::default());
    }

    #[test]
    fn selector_precedence() {
        let uids = Some(vec!["a".to_string()]);
        let gid = Some("g".to_string());

        assert_eq!(
            JobSelector::resolve(uids, gid.clone(), Some(1)).unwrap(),
            JobSelector::Uids(vec!["a".to_string()])
        );
        assert_eq!(
            JobSelector::resolve(None, gid, Some(1)).unwrap(),
            JobSelector::Group("g".to_string())
        );
        assert_eq!(
            JobSelector::resolve(Some(vec![]), None, Some(1)).unwrap(),
            JobSelector::Project(1)
        );
    }

    #[test]
    fn selector_missing() {
        assert!(matches!(
            JobSelector::resolve(None, None, None),
            Err(JobError::SelectorMissing)
        ));
    }
}
