//! Prediction job orchestration

use chrono::{DateTime, Utc};
use deckhand_core::{
    pod_label_selector, Container, DeckhandError, DeckhandResult, Environment,
    EnvironmentRegistry, JobFilter, JobStatus, Metadata, Model, PredictionJob, Project, Version,
};
use deckhand_runtime::{BatchExecutor, ImageBuilder};
use deckhand_store::JobStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::defaults::{apply_defaults, validate};
use crate::metrics::OutcomeCounter;

/// Result of a stop request: the last known record and any executor error
#[derive(Debug)]
pub struct StopOutcome {
    pub job: PredictionJob,
    pub stop_error: Option<DeckhandError>,
}

impl StopOutcome {
    /// Turn an executor error into a failure, dropping the record
    pub fn into_result(self) -> DeckhandResult<PredictionJob> {
        match self.stop_error {
            Some(e) => Err(e),
            None => Ok(self.job),
        }
    }
}

/// Creates, stops and reports on prediction jobs.
///
/// Creation persists a pending record and returns it immediately; the image
/// build and submission run in a detached task that owns its own copy of
/// the record and writes the outcome back to the store exactly once. The
/// task outlives the orchestrator if it is dropped first.
pub struct JobOrchestrator {
    store: Arc<dyn JobStore>,
    image_builder: Arc<dyn ImageBuilder>,
    executors: Arc<EnvironmentRegistry<dyn BatchExecutor>>,
    outcomes: Arc<dyn OutcomeCounter>,
    clock: Arc<dyn Clock>,
    environment_label: String,
    /// Handles of in-flight submissions, kept only for `drain`
    submissions: Mutex<Vec<JoinHandle<()>>>,
}

impl JobOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        store: Arc<dyn JobStore>,
        image_builder: Arc<dyn ImageBuilder>,
        executors: Arc<EnvironmentRegistry<dyn BatchExecutor>>,
        outcomes: Arc<dyn OutcomeCounter>,
        environment_label: impl Into<String>,
    ) -> Self {
        Self {
            store,
            image_builder,
            executors,
            outcomes,
            clock: Arc::new(SystemClock),
            environment_label: environment_label.into(),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Replace the clock used for job naming
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get a prediction job by id
    pub async fn get_job(&self, id: Uuid) -> DeckhandResult<PredictionJob> {
        self.store.get(id).await
    }

    /// List the prediction jobs of a project
    pub async fn list_jobs(
        &self,
        project: &Project,
        filter: JobFilter,
    ) -> DeckhandResult<Vec<PredictionJob>> {
        let filter = JobFilter {
            project_id: Some(project.id),
            ..filter
        };
        self.store.list(&filter).await
    }

    /// Create a prediction job for a model version.
    ///
    /// Returns the persisted pending record without waiting for the image
    /// build or the submission. Invalid jobs are rejected before anything is
    /// persisted.
    pub async fn create_job(
        &self,
        env: &Environment,
        model: &Model,
        version: &Version,
        mut job: PredictionJob,
    ) -> DeckhandResult<PredictionJob> {
        let now = self.clock.now();
        let project = &model.project;

        job.id = Uuid::new_v4();
        job.name = job_name(model, version, now);
        job.metadata = Metadata {
            team: project.team.clone(),
            stream: project.stream.clone(),
            app: model.name.clone(),
            environment: self.environment_label.clone(),
            labels: project.labels.clone(),
        };
        job.status = JobStatus::Pending;
        job.error.clear();
        job.version_model_id = model.id;
        job.project_id = model.project_id;
        job.version_id = version.id;
        job.environment_name = env.name.clone();
        job.created_at = now;
        job.updated_at = now;

        apply_defaults(
            &mut job.config.resource_request,
            &env.default_prediction_job_resource_request,
        );
        validate(model, &job)?;

        self.store.save(&job).await.map_err(|e| {
            error!(job_name = %job.name, error = %e, "Failed to save prediction job");
            e
        })?;

        info!(
            job_id = %job.id,
            job_name = %job.name,
            environment = %env.name,
            "Prediction job accepted"
        );

        let submission = Submission {
            job: job.clone(),
            environment: env.name.clone(),
            model: model.clone(),
            version: version.clone(),
            store: self.store.clone(),
            image_builder: self.image_builder.clone(),
            executors: self.executors.clone(),
            outcomes: self.outcomes.clone(),
            clock: self.clock.clone(),
        };

        let mut submissions = self.submissions.lock().await;
        submissions.retain(|handle| !handle.is_finished());
        submissions.push(tokio::spawn(submission.run()));

        Ok(job)
    }

    /// Ask the executor to stop a job.
    ///
    /// The stored status is left as is; the executor reports the final state.
    pub async fn stop_job(
        &self,
        env: &Environment,
        model: &Model,
        _version: &Version,
        id: Uuid,
    ) -> DeckhandResult<StopOutcome> {
        let job = self.store.get(id).await?;
        let executor = self.executors.get(&env.name)?;

        let stop_error = executor.stop(&job, &model.project.name).await.err();
        match &stop_error {
            Some(e) => warn!(job_id = %job.id, error = %e, "Failed to stop prediction job"),
            None => info!(job_id = %job.id, job_name = %job.name, "Prediction job stop requested"),
        }

        Ok(StopOutcome { job, stop_error })
    }

    /// Containers of a job: image build containers first, then the executor's
    pub async fn list_containers(
        &self,
        env: &Environment,
        model: &Model,
        version: &Version,
        job: &PredictionJob,
    ) -> DeckhandResult<Vec<Container>> {
        let executor = self.executors.get(&env.name)?;
        let project = &model.project;
        let mut containers = Vec::new();

        if model.model_type.requires_image_build() {
            containers.extend(
                self.image_builder
                    .get_containers(project, model, version)
                    .await?,
            );
        }

        containers.extend(
            executor
                .get_containers(&project.name, &pod_label_selector(job.id))
                .await?,
        );

        Ok(containers)
    }

    /// Wait for every in-flight submission to finish
    pub async fn drain(&self) {
        let submissions = std::mem::take(&mut *self.submissions.lock().await);
        let pending = submissions.iter().filter(|h| !h.is_finished()).count();
        if pending > 0 {
            info!(submissions = pending, "Waiting for in-flight submissions");
        }
        for handle in submissions {
            if let Err(e) = handle.await {
                error!(error = %e, "Prediction job submission task failed");
            }
        }
    }
}

/// `<model>-<version>-<first 13 digits of the nanosecond timestamp>`
fn job_name(model: &Model, version: &Version, now: DateTime<Utc>) -> String {
    let stamp = now.timestamp_nanos_opt().unwrap_or_default().to_string();
    let stamp = &stamp[..stamp.len().min(13)];
    format!("{}-{}-{}", model.name, version.id, stamp)
}

/// Background image build and submission of one job
struct Submission {
    job: PredictionJob,
    environment: String,
    model: Model,
    version: Version,
    store: Arc<dyn JobStore>,
    image_builder: Arc<dyn ImageBuilder>,
    executors: Arc<EnvironmentRegistry<dyn BatchExecutor>>,
    outcomes: Arc<dyn OutcomeCounter>,
    clock: Arc<dyn Clock>,
}

impl Submission {
    async fn run(mut self) {
        match self.submit().await {
            Ok(()) => {
                info!(job_id = %self.job.id, job_name = %self.job.name, "Prediction job submitted");
                self.job.status = JobStatus::Running;
            }
            Err(e) => {
                warn!(job_id = %self.job.id, error = %e, "Prediction job submission failed");
                self.job.status = JobStatus::FailedSubmission;
                self.job.error = e.to_string();
            }
        }

        self.job.updated_at = self.clock.now();
        if let Err(e) = self.store.save(&self.job).await {
            error!(job_id = %self.job.id, error = %e, "Failed to update prediction job");
        }

        self.outcomes
            .increment(&self.model.project.name, &self.model.name, self.job.status);
    }

    async fn submit(&mut self) -> DeckhandResult<()> {
        let project = &self.model.project;

        debug!(job_id = %self.job.id, "Building prediction job image");
        let image_ref = self
            .image_builder
            .build_image(project, &self.model, &self.version)
            .await
            .map_err(|e| {
                warn!(job_id = %self.job.id, error = %e, "Prediction job image build failed");
                e
            })?;
        self.job.config.image_ref = image_ref;

        let executor = self.executors.get(&self.environment)?;
        executor.submit(&self.job, &project.name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::JobOutcomeMetrics;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use deckhand_core::{Config, JobSpecError, ModelType, ResourceRequest};
    use deckhand_store::MemoryJobStore;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Image builder returning a fixed result, optionally held until released
    struct FakeImageBuilder {
        result: Result<String, String>,
        containers: Vec<Container>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeImageBuilder {
        fn ok() -> Self {
            Self {
                result: Ok("ghcr.io/acme/fraud-fraud-model:7".to_string()),
                containers: Vec::new(),
                gate: None,
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                result: Err(reason.to_string()),
                ..Self::ok()
            }
        }
    }

    #[async_trait]
    impl ImageBuilder for FakeImageBuilder {
        async fn build_image(&self, _: &Project, _: &Model, _: &Version) -> DeckhandResult<String> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.result.clone().map_err(DeckhandError::ImageBuild)
        }

        async fn get_containers(
            &self,
            _: &Project,
            _: &Model,
            _: &Version,
        ) -> DeckhandResult<Vec<Container>> {
            Ok(self.containers.clone())
        }
    }

    /// Executor recording the jobs it receives
    #[derive(Default)]
    struct RecordingExecutor {
        fail: bool,
        submitted: StdMutex<Vec<PredictionJob>>,
        stopped: StdMutex<Vec<Uuid>>,
        containers: Vec<Container>,
    }

    #[async_trait]
    impl BatchExecutor for RecordingExecutor {
        async fn submit(&self, job: &PredictionJob, _: &str) -> DeckhandResult<()> {
            if self.fail {
                return Err(DeckhandError::Executor("quota exceeded".to_string()));
            }
            self.submitted.lock().unwrap().push(job.clone());
            Ok(())
        }

        async fn stop(&self, job: &PredictionJob, _: &str) -> DeckhandResult<()> {
            if self.fail {
                return Err(DeckhandError::Executor("job not found".to_string()));
            }
            self.stopped.lock().unwrap().push(job.id);
            Ok(())
        }

        async fn get_containers(&self, _: &str, _: &str) -> DeckhandResult<Vec<Container>> {
            Ok(self.containers.clone())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    struct Harness {
        orchestrator: JobOrchestrator,
        store: Arc<MemoryJobStore>,
        metrics: Arc<JobOutcomeMetrics>,
        executor: Arc<RecordingExecutor>,
    }

    fn harness(builder: FakeImageBuilder, executor: RecordingExecutor) -> Harness {
        let store = Arc::new(MemoryJobStore::new());
        let metrics = Arc::new(JobOutcomeMetrics::new());
        let executor = Arc::new(executor);
        let shared: Arc<dyn BatchExecutor> = executor.clone();
        let executors = EnvironmentRegistry::new().with("staging", shared);

        let orchestrator = JobOrchestrator::new(
            store.clone(),
            Arc::new(builder),
            Arc::new(executors),
            metrics.clone(),
            "staging",
        )
        .with_clock(Arc::new(FixedClock(
            Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap(),
        )));

        Harness {
            orchestrator,
            store,
            metrics,
            executor,
        }
    }

    fn environment(name: &str) -> Environment {
        Environment {
            default_prediction_job_resource_request: ResourceRequest {
                driver_cpu_request: "1".to_string(),
                driver_memory_request: "1Gi".to_string(),
                executor_cpu_request: "1".to_string(),
                executor_memory_request: "4Gi".to_string(),
                executor_replica: 3,
            },
            ..Environment::new(name)
        }
    }

    fn model(model_type: ModelType) -> Model {
        Model {
            id: 10,
            project_id: 1,
            project: Project {
                id: 1,
                name: "fraud".to_string(),
                team: "risk".to_string(),
                stream: "payments".to_string(),
                labels: vec![deckhand_core::Label::new("cost-center", "42")],
            },
            name: "fraud-model".to_string(),
            model_type,
        }
    }

    fn version() -> Version {
        Version { id: 7, model_id: 10 }
    }

    fn request(executor_cpu: &str) -> PredictionJob {
        PredictionJob::new(Config {
            resource_request: ResourceRequest {
                executor_cpu_request: executor_cpu.to_string(),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    fn container(name: &str) -> Container {
        Container {
            name: name.to_string(),
            pod_name: format!("{}-pod", name),
            namespace: "fraud".to_string(),
            cluster: "staging-01".to_string(),
        }
    }

    #[test]
    fn test_job_name_uses_truncated_timestamp() {
        let now = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let name = job_name(&model(ModelType::PyFuncV2), &version(), now);
        assert_eq!(name, "fraud-model-7-1700000000123");
    }

    #[tokio::test]
    async fn test_create_job_defaults_and_metadata() {
        let h = harness(FakeImageBuilder::ok(), RecordingExecutor::default());

        let job = h
            .orchestrator
            .create_job(
                &environment("staging"),
                &model(ModelType::PyFuncV2),
                &version(),
                request("2"),
            )
            .await
            .unwrap();

        assert_eq!(job.name, "fraud-model-7-1700000000123");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.version_id, 7);
        assert_eq!(job.version_model_id, 10);
        assert_eq!(job.project_id, 1);
        assert_eq!(job.environment_name, "staging");
        assert_eq!(job.metadata.team, "risk");
        assert_eq!(job.metadata.stream, "payments");
        assert_eq!(job.metadata.app, "fraud-model");
        assert_eq!(job.metadata.environment, "staging");
        assert_eq!(job.metadata.labels.len(), 1);

        let resources = &job.config.resource_request;
        assert_eq!(resources.executor_replica, 3);
        assert_eq!(resources.executor_cpu_request, "2");
        assert_eq!(resources.executor_memory_request, "4Gi");

        h.orchestrator.drain().await;
    }

    #[tokio::test]
    async fn test_pending_record_persisted_before_submission() {
        let gate = Arc::new(Notify::new());
        let builder = FakeImageBuilder {
            gate: Some(gate.clone()),
            ..FakeImageBuilder::ok()
        };
        let h = harness(builder, RecordingExecutor::default());

        let job = h
            .orchestrator
            .create_job(
                &environment("staging"),
                &model(ModelType::PyFuncV2),
                &version(),
                request(""),
            )
            .await
            .unwrap();

        let stored = h.store.get(job.id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Pending);
        assert!(h.executor.submitted.lock().unwrap().is_empty());

        gate.notify_one();
        h.orchestrator.drain().await;

        let stored = h.store.get(job.id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Running);
        assert_eq!(stored.config.image_ref, "ghcr.io/acme/fraud-fraud-model:7");
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.config.image_ref.is_empty());

        let submitted = h.executor.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].config.image_ref, "ghcr.io/acme/fraud-fraud-model:7");
        assert_eq!(h.metrics.count("fraud", "fraud-model", JobStatus::Running), 1);
    }

    #[tokio::test]
    async fn test_submission_outlives_dropped_orchestrator() {
        let gate = Arc::new(Notify::new());
        let builder = FakeImageBuilder {
            gate: Some(gate.clone()),
            ..FakeImageBuilder::ok()
        };
        let h = harness(builder, RecordingExecutor::default());

        let job = h
            .orchestrator
            .create_job(
                &environment("staging"),
                &model(ModelType::PyFuncV2),
                &version(),
                request(""),
            )
            .await
            .unwrap();
        drop(h.orchestrator);
        gate.notify_one();

        let mut status = JobStatus::Pending;
        for _ in 0..100 {
            status = h.store.get(job.id).await.unwrap().status;
            if status != JobStatus::Pending {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(status, JobStatus::Running);
        assert_eq!(h.executor.submitted.lock().unwrap().len(), 1);
        assert_eq!(h.metrics.count("fraud", "fraud-model", JobStatus::Running), 1);
    }

    #[tokio::test]
    async fn test_image_build_failure_marks_failed_submission() {
        let h = harness(
            FakeImageBuilder::failing("base image missing"),
            RecordingExecutor::default(),
        );

        let job = h
            .orchestrator
            .create_job(
                &environment("staging"),
                &model(ModelType::PyFuncV2),
                &version(),
                request(""),
            )
            .await
            .unwrap();
        h.orchestrator.drain().await;

        let stored = h.store.get(job.id).await.unwrap();
        assert_eq!(stored.status, JobStatus::FailedSubmission);
        assert!(stored.error.contains("base image missing"));
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.error.is_empty());
        assert!(h.executor.submitted.lock().unwrap().is_empty());

        assert_eq!(
            h.metrics
                .count("fraud", "fraud-model", JobStatus::FailedSubmission),
            1
        );
        assert_eq!(h.metrics.count("fraud", "fraud-model", JobStatus::Pending), 0);
        assert_eq!(h.metrics.count("fraud", "fraud-model", JobStatus::Running), 0);
    }

    #[tokio::test]
    async fn test_submission_failure_marks_failed_submission() {
        let executor = RecordingExecutor {
            fail: true,
            ..Default::default()
        };
        let h = harness(FakeImageBuilder::ok(), executor);

        let job = h
            .orchestrator
            .create_job(
                &environment("staging"),
                &model(ModelType::PyFuncV2),
                &version(),
                request(""),
            )
            .await
            .unwrap();
        h.orchestrator.drain().await;

        let stored = h.store.get(job.id).await.unwrap();
        assert_eq!(stored.status, JobStatus::FailedSubmission);
        assert!(stored.error.contains("quota exceeded"));
        assert_eq!(
            h.metrics
                .count("fraud", "fraud-model", JobStatus::FailedSubmission),
            1
        );
    }

    #[tokio::test]
    async fn test_unregistered_environment_fails_submission() {
        let h = harness(FakeImageBuilder::ok(), RecordingExecutor::default());

        let job = h
            .orchestrator
            .create_job(
                &environment("production"),
                &model(ModelType::PyFuncV2),
                &version(),
                request(""),
            )
            .await
            .unwrap();
        h.orchestrator.drain().await;

        let stored = h.store.get(job.id).await.unwrap();
        assert_eq!(stored.status, JobStatus::FailedSubmission);
        assert!(stored.error.contains("production"));
    }

    #[tokio::test]
    async fn test_invalid_job_is_never_persisted() {
        let h = harness(FakeImageBuilder::ok(), RecordingExecutor::default());

        let err = h
            .orchestrator
            .create_job(
                &environment("staging"),
                &model(ModelType::Tensorflow),
                &version(),
                request(""),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeckhandError::InvalidJobSpec(JobSpecError::UnsupportedModelType(_))
        ));

        let err = h
            .orchestrator
            .create_job(
                &environment("staging"),
                &model(ModelType::PyFuncV2),
                &version(),
                request("two"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeckhandError::InvalidJobSpec(JobSpecError::InvalidResourceQuantity { .. })
        ));

        h.orchestrator.drain().await;
        assert_eq!(h.store.len().await, 0);
    }

    #[tokio::test]
    async fn test_stop_job() {
        let h = harness(FakeImageBuilder::ok(), RecordingExecutor::default());
        let env = environment("staging");
        let model = model(ModelType::PyFuncV2);

        let job = h
            .orchestrator
            .create_job(&env, &model, &version(), request(""))
            .await
            .unwrap();
        h.orchestrator.drain().await;

        let outcome = h
            .orchestrator
            .stop_job(&env, &model, &version(), job.id)
            .await
            .unwrap();
        assert!(outcome.stop_error.is_none());
        assert_eq!(outcome.job.status, JobStatus::Running);
        assert_eq!(*h.executor.stopped.lock().unwrap(), vec![job.id]);
    }

    #[tokio::test]
    async fn test_stop_job_without_executor_leaves_status() {
        let h = harness(FakeImageBuilder::ok(), RecordingExecutor::default());
        let model = model(ModelType::PyFuncV2);

        let job = h
            .orchestrator
            .create_job(&environment("staging"), &model, &version(), request(""))
            .await
            .unwrap();
        h.orchestrator.drain().await;
        let before = h.store.get(job.id).await.unwrap();

        let err = h
            .orchestrator
            .stop_job(&environment("production"), &model, &version(), job.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DeckhandError::EnvironmentNotConfigured(name) if name == "production"));

        let after = h.store.get(job.id).await.unwrap();
        assert_eq!(after.status, before.status);
        assert!(h.executor.stopped.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stop_job_reports_executor_error_with_record() {
        let executor = RecordingExecutor {
            fail: true,
            ..Default::default()
        };
        let h = harness(FakeImageBuilder::ok(), executor);
        let env = environment("staging");
        let model = model(ModelType::PyFuncV2);

        let job = h
            .orchestrator
            .create_job(&env, &model, &version(), request(""))
            .await
            .unwrap();
        h.orchestrator.drain().await;

        let outcome = h
            .orchestrator
            .stop_job(&env, &model, &version(), job.id)
            .await
            .unwrap();
        assert_eq!(outcome.job.id, job.id);
        assert_eq!(outcome.job.status, JobStatus::FailedSubmission);
        assert!(matches!(outcome.stop_error, Some(DeckhandError::Executor(_))));
        assert!(outcome.into_result().is_err());
    }

    #[tokio::test]
    async fn test_stop_missing_job_is_not_found() {
        let h = harness(FakeImageBuilder::ok(), RecordingExecutor::default());
        let result = h
            .orchestrator
            .stop_job(
                &environment("staging"),
                &model(ModelType::PyFuncV2),
                &version(),
                Uuid::new_v4(),
            )
            .await;
        assert!(matches!(result, Err(DeckhandError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_containers_build_first() {
        let builder = FakeImageBuilder {
            containers: vec![container("image-builder")],
            ..FakeImageBuilder::ok()
        };
        let executor = RecordingExecutor {
            containers: vec![container("driver"), container("executor-1")],
            ..Default::default()
        };
        let h = harness(builder, executor);
        let job = PredictionJob::new(Config::default());

        let containers = h
            .orchestrator
            .list_containers(
                &environment("staging"),
                &model(ModelType::PyFuncV2),
                &version(),
                &job,
            )
            .await
            .unwrap();
        let names: Vec<&str> = containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["image-builder", "driver", "executor-1"]);

        let containers = h
            .orchestrator
            .list_containers(
                &environment("staging"),
                &model(ModelType::PyFunc),
                &version(),
                &job,
            )
            .await
            .unwrap();
        assert_eq!(containers.len(), 2);
    }

    #[tokio::test]
    async fn test_list_jobs_scoped_to_project() {
        let h = harness(FakeImageBuilder::ok(), RecordingExecutor::default());
        let env = environment("staging");
        let model = model(ModelType::PyFuncV2);

        let job = h
            .orchestrator
            .create_job(&env, &model, &version(), request(""))
            .await
            .unwrap();
        h.orchestrator.drain().await;

        let mut foreign = PredictionJob::new(Config::default());
        foreign.project_id = 2;
        h.store.save(&foreign).await.unwrap();

        let jobs = h
            .orchestrator
            .list_jobs(&model.project, JobFilter::default())
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, job.id);

        let filter = JobFilter {
            status: Some(JobStatus::Pending),
            ..Default::default()
        };
        let jobs = h.orchestrator.list_jobs(&model.project, filter).await.unwrap();
        assert!(jobs.is_empty());
    }
}
