//! Process-based batch executor
//!
//! This executor runs each prediction job as a launcher process on the local
//! host (for example `spark-submit` in client mode). Used for development
//! environments that have no cluster-side job operator.

use async_trait::async_trait;
use deckhand_core::{Container, DeckhandError, DeckhandResult, PredictionJob, JOB_ID_POD_LABEL};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::traits::BatchExecutor;

/// Process executor configuration
#[derive(Debug, Clone)]
pub struct ProcessExecutorConfig {
    /// Path to the launcher binary
    pub launcher_path: PathBuf,
    /// Arguments placed before the job flags
    pub extra_args: Vec<String>,
    /// Cluster name reported on containers
    pub cluster: String,
}

impl Default for ProcessExecutorConfig {
    fn default() -> Self {
        Self {
            launcher_path: PathBuf::from("spark-submit"),
            extra_args: Vec::new(),
            cluster: "local".to_string(),
        }
    }
}

struct TrackedJob {
    name: String,
    namespace: String,
    child: Child,
}

/// Batch executor running jobs as local processes
pub struct ProcessExecutor {
    config: ProcessExecutorConfig,
    jobs: Mutex<HashMap<Uuid, TrackedJob>>,
}

impl ProcessExecutor {
    /// Create a new process executor
    pub fn new(config: ProcessExecutorConfig) -> Self {
        Self {
            config,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Build the command launching a job
    fn build_command(&self, job: &PredictionJob, namespace: &str) -> Command {
        let mut cmd = Command::new(&self.config.launcher_path);
        let resources = &job.config.resource_request;

        for arg in &self.config.extra_args {
            cmd.arg(arg);
        }

        cmd.arg("--name").arg(&job.name);
        cmd.arg("--namespace").arg(namespace);
        cmd.arg("--image").arg(&job.config.image_ref);
        cmd.arg("--driver-cores").arg(&resources.driver_cpu_request);
        cmd.arg("--driver-memory").arg(&resources.driver_memory_request);
        cmd.arg("--executor-cores").arg(&resources.executor_cpu_request);
        cmd.arg("--executor-memory").arg(&resources.executor_memory_request);
        cmd.arg("--num-executors")
            .arg(resources.executor_replica.to_string());

        cmd.env("PREDICTION_JOB_ID", job.id.to_string());
        for var in &job.config.env_vars {
            cmd.env(&var.name, &var.value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        cmd
    }

    /// Check if the process of a job is still alive
    pub async fn is_running(&self, job_id: Uuid) -> bool {
        let mut jobs = self.jobs.lock().await;
        match jobs.get_mut(&job_id) {
            Some(tracked) => matches!(tracked.child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

/// Drop finished processes from the table, collecting their exit status
fn reap_finished(jobs: &mut HashMap<Uuid, TrackedJob>) {
    jobs.retain(|id, tracked| match tracked.child.try_wait() {
        Ok(None) => true,
        Ok(Some(status)) => {
            debug!(job_id = %id, job_name = %tracked.name, %status, "Prediction job process exited");
            false
        }
        Err(e) => {
            warn!(job_id = %id, error = %e, "Failed to poll prediction job process");
            false
        }
    });
}

/// Extract the job id from a `prediction-job-id=<id>` selector
fn selected_job_id(label_selector: &str) -> Option<Uuid> {
    let (key, value) = label_selector.split_once('=')?;
    if key.trim() != JOB_ID_POD_LABEL {
        return None;
    }
    Uuid::parse_str(value.trim()).ok()
}

#[async_trait]
impl BatchExecutor for ProcessExecutor {
    async fn submit(&self, job: &PredictionJob, namespace: &str) -> DeckhandResult<()> {
        let mut jobs = self.jobs.lock().await;
        reap_finished(&mut jobs);
        if jobs.contains_key(&job.id) {
            return Err(DeckhandError::Executor(format!(
                "job {} is already submitted",
                job.name
            )));
        }

        info!(
            job_id = %job.id,
            job_name = %job.name,
            namespace = namespace,
            "Launching prediction job process"
        );

        let mut cmd = self.build_command(job, namespace);

        match cmd.spawn() {
            Ok(child) => {
                debug!(
                    job_id = %job.id,
                    pid = child.id().unwrap_or(0),
                    "Prediction job process spawned"
                );
                jobs.insert(
                    job.id,
                    TrackedJob {
                        name: job.name.clone(),
                        namespace: namespace.to_string(),
                        child,
                    },
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    job_id = %job.id,
                    error = %e,
                    "Failed to spawn prediction job process"
                );
                Err(DeckhandError::Executor(format!(
                    "Failed to launch job {}: {}",
                    job.name, e
                )))
            }
        }
    }

    async fn stop(&self, job: &PredictionJob, namespace: &str) -> DeckhandResult<()> {
        let mut jobs = self.jobs.lock().await;
        let mut tracked = match jobs.remove(&job.id) {
            Some(tracked) if tracked.namespace == namespace => tracked,
            Some(tracked) => {
                jobs.insert(job.id, tracked);
                return Err(DeckhandError::Executor(format!(
                    "job {} is not running in namespace {}",
                    job.name, namespace
                )));
            }
            None => {
                return Err(DeckhandError::Executor(format!(
                    "job {} is not running",
                    job.name
                )))
            }
        };

        drop(jobs);

        info!(job_id = %job.id, job_name = %job.name, "Stopping prediction job process");

        let stop_failed =
            |e: std::io::Error| DeckhandError::Executor(format!("Failed to stop job {}: {}", job.name, e));
        tracked.child.start_kill().map_err(stop_failed)?;
        let status = tracked.child.wait().await.map_err(stop_failed)?;
        debug!(job_id = %job.id, %status, "Prediction job process stopped");
        Ok(())
    }

    async fn get_containers(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> DeckhandResult<Vec<Container>> {
        let Some(job_id) = selected_job_id(label_selector) else {
            return Err(DeckhandError::Executor(format!(
                "unsupported label selector: {}",
                label_selector
            )));
        };

        let mut jobs = self.jobs.lock().await;
        reap_finished(&mut jobs);
        let containers = jobs
            .get(&job_id)
            .filter(|tracked| tracked.namespace == namespace)
            .map(|tracked| Container {
                name: "driver".to_string(),
                pod_name: format!("{}-driver", tracked.name),
                namespace: tracked.namespace.clone(),
                cluster: self.config.cluster.clone(),
            })
            .into_iter()
            .collect();

        Ok(containers)
    }

    fn name(&self) -> &'static str {
        "process"
    }
}
