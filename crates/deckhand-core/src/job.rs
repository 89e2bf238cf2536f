//! Prediction job type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Id, Label};

/// Label key the batch executor stamps on every pod of a job
pub const JOB_ID_POD_LABEL: &str = "prediction-job-id";

/// Label selector matching the pods of a prediction job
pub fn pod_label_selector(job_id: Uuid) -> String {
    format!("{}={}", JOB_ID_POD_LABEL, job_id)
}

/// Batch prediction job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionJob {
    pub id: Uuid,
    /// Derived from model name, version id and submission time
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version_id: Id,
    #[serde(default)]
    pub version_model_id: Id,
    #[serde(default)]
    pub project_id: Id,
    #[serde(default)]
    pub environment_name: String,
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub metadata: Metadata,
    pub status: JobStatus,
    /// Cause of the last failure, empty when none
    #[serde(default)]
    pub error: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PredictionJob {
    /// Create a pending job request carrying only its configuration
    pub fn new(config: Config) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            version_id: 0,
            version_model_id: 0,
            project_id: 0,
            environment_name: String::new(),
            config,
            metadata: Metadata::default(),
            status: JobStatus::Pending,
            error: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Job configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Image the executor runs, filled in after the image build
    #[serde(default)]
    pub image_ref: String,
    #[serde(default)]
    pub service_account_name: String,
    #[serde(default)]
    pub resource_request: ResourceRequest,
    #[serde(default)]
    pub env_vars: Vec<EnvVar>,
}

/// Environment variable passed to the job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Resource request for the driver and executors of a job.
///
/// Empty strings and a zero replica count mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    #[serde(default)]
    pub driver_cpu_request: String,
    #[serde(default)]
    pub driver_memory_request: String,
    #[serde(default)]
    pub executor_cpu_request: String,
    #[serde(default)]
    pub executor_memory_request: String,
    #[serde(default)]
    pub executor_replica: i32,
}

impl ResourceRequest {
    /// Quantity fields paired with their names, in validation order
    pub fn quantities(&self) -> [(ResourceField, &str); 4] {
        [
            (ResourceField::DriverCpu, self.driver_cpu_request.as_str()),
            (ResourceField::DriverMemory, self.driver_memory_request.as_str()),
            (ResourceField::ExecutorCpu, self.executor_cpu_request.as_str()),
            (
                ResourceField::ExecutorMemory,
                self.executor_memory_request.as_str(),
            ),
        ]
    }
}

/// Quantity field of a resource request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceField {
    DriverCpu,
    DriverMemory,
    ExecutorCpu,
    ExecutorMemory,
}

impl std::fmt::Display for ResourceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceField::DriverCpu => write!(f, "driver cpu request"),
            ResourceField::DriverMemory => write!(f, "driver memory request"),
            ResourceField::ExecutorCpu => write!(f, "executor cpu request"),
            ResourceField::ExecutorMemory => write!(f, "executor memory request"),
        }
    }
}

/// Ownership metadata stamped on a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub team: String,
    pub stream: String,
    pub app: String,
    pub environment: String,
    pub labels: Vec<Label>,
}

/// Prediction job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// Image build or submission to the executor failed
    FailedSubmission,
    Stopped,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::FailedSubmission => "failed_submission",
            JobStatus::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container belonging to a job, either from the image build or from the executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub pod_name: String,
    pub namespace: String,
    #[serde(default)]
    pub cluster: String,
}

/// Query over stored prediction jobs.
///
/// Ids and status match exactly; name and error match by substring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model_id: Option<Id>,
    #[serde(default)]
    pub version_id: Option<Id>,
    #[serde(default)]
    pub project_id: Option<Id>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobFilter {
    /// Check whether a job satisfies every set field of the filter
    pub fn matches(&self, job: &PredictionJob) -> bool {
        self.id.map_or(true, |id| job.id == id)
            && self.name.as_deref().map_or(true, |n| job.name.contains(n))
            && self.model_id.map_or(true, |id| job.version_model_id == id)
            && self.version_id.map_or(true, |id| job.version_id == id)
            && self.project_id.map_or(true, |id| job.project_id == id)
            && self.status.map_or(true, |s| job.status == s)
            && self.error.as_deref().map_or(true, |e| job.error.contains(e))
    }
}
