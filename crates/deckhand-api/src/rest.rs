//! REST API handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use deckhand_core::{
    Catalog, Config, Container, DeckhandError, DeckhandResult, Destination, Environment, Id,
    JobFilter, ModelEndpoint, PredictionJob, Rule,
};
use deckhand_network::EndpointManager;
use deckhand_scheduler::{JobOrchestrator, JobOutcomeMetrics};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// Application state shared across handlers
pub struct AppState {
    pub catalog: Catalog,
    pub environments: Vec<Environment>,
    /// Model endpoints by id
    pub endpoints: RwLock<HashMap<Uuid, ModelEndpoint>>,
    pub endpoint_manager: EndpointManager,
    pub orchestrator: Arc<JobOrchestrator>,
    pub metrics: Arc<JobOutcomeMetrics>,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        environments: Vec<Environment>,
        endpoint_manager: EndpointManager,
        orchestrator: Arc<JobOrchestrator>,
        metrics: Arc<JobOutcomeMetrics>,
    ) -> Self {
        Self {
            catalog,
            environments,
            endpoints: RwLock::new(HashMap::new()),
            endpoint_manager,
            orchestrator,
            metrics,
        }
    }

    fn environment(&self, name: &str) -> DeckhandResult<&Environment> {
        self.environments
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DeckhandError::NotFound(format!("environment {}", name)))
    }

    /// Resolve a requested rule against the catalog's version endpoints
    fn resolve_rule(&self, req: &RuleRequest) -> DeckhandResult<Rule> {
        let destinations = req
            .destinations
            .iter()
            .map(|d| -> DeckhandResult<Destination> {
                Ok(Destination {
                    version_endpoint: self.catalog.version_endpoint(d.version_endpoint_id)?.clone(),
                    weight: d.weight,
                })
            })
            .collect::<DeckhandResult<Vec<_>>>()?;

        let mirror = match req.mirror {
            Some(id) => Some(self.catalog.version_endpoint(id)?.clone()),
            None => None,
        };

        Ok(Rule {
            destinations,
            mirror,
        })
    }

    async fn endpoint(&self, model_id: Id, endpoint_id: Uuid) -> DeckhandResult<ModelEndpoint> {
        self.endpoints
            .read()
            .await
            .get(&endpoint_id)
            .filter(|e| e.model_id == model_id)
            .cloned()
            .ok_or_else(|| DeckhandError::NotFound(format!("model endpoint {}", endpoint_id)))
    }

    async fn job(&self, model_id: Id, version_id: Id, job_id: Uuid) -> DeckhandResult<PredictionJob> {
        let job = self.orchestrator.get_job(job_id).await?;
        if job.version_model_id != model_id || job.version_id != version_id {
            return Err(DeckhandError::NotFound(format!("prediction job {}", job_id)));
        }
        Ok(job)
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/v1/models/:model_id/endpoints",
            post(deploy_endpoint).get(list_endpoints),
        )
        .route(
            "/api/v1/models/:model_id/endpoints/:endpoint_id",
            put(update_endpoint).delete(undeploy_endpoint),
        )
        .route(
            "/api/v1/models/:model_id/versions/:version_id/jobs",
            post(create_job),
        )
        .route(
            "/api/v1/models/:model_id/versions/:version_id/jobs/:job_id",
            get(get_job),
        )
        .route(
            "/api/v1/models/:model_id/versions/:version_id/jobs/:job_id/stop",
            put(stop_job),
        )
        .route(
            "/api/v1/models/:model_id/versions/:version_id/jobs/:job_id/containers",
            get(list_containers),
        )
        .route("/api/v1/projects/:project_id/jobs", get(list_jobs))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type ApiError = (StatusCode, String);

fn error_response(e: DeckhandError) -> ApiError {
    let status = match &e {
        DeckhandError::NotFound(_) | DeckhandError::EnvironmentNotConfigured(_) => {
            StatusCode::NOT_FOUND
        }
        DeckhandError::InvalidJobSpec(_) | DeckhandError::Route(_) => StatusCode::BAD_REQUEST,
        DeckhandError::MeshApplyFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

/// Traffic split by version endpoint id
#[derive(Debug, Deserialize)]
pub struct DestinationRequest {
    pub version_endpoint_id: Uuid,
    pub weight: i32,
}

/// Routing rule of a model endpoint
#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    pub destinations: Vec<DestinationRequest>,
    /// Version endpoint receiving a copy of the traffic
    #[serde(default)]
    pub mirror: Option<Uuid>,
}

/// Request to deploy a model endpoint
#[derive(Debug, Deserialize)]
pub struct DeployEndpointRequest {
    pub environment_name: String,
    #[serde(flatten)]
    pub rule: RuleRequest,
}

/// Deploy a model endpoint
async fn deploy_endpoint(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<Id>,
    Json(req): Json<DeployEndpointRequest>,
) -> Result<(StatusCode, Json<ModelEndpoint>), ApiError> {
    info!(
        model_id,
        environment = %req.environment_name,
        destinations = req.rule.destinations.len(),
        "Deploying model endpoint"
    );

    let model = state.catalog.model(model_id).map_err(error_response)?;
    let rule = state.resolve_rule(&req.rule).map_err(error_response)?;
    let mut endpoint = ModelEndpoint::new(model_id, req.environment_name, rule);

    state
        .endpoint_manager
        .deploy(&model, &mut endpoint)
        .await
        .map_err(error_response)?;

    state
        .endpoints
        .write()
        .await
        .insert(endpoint.id, endpoint.clone());

    Ok((StatusCode::CREATED, Json(endpoint)))
}

/// List the endpoints of a model
async fn list_endpoints(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<Id>,
) -> Result<Json<Vec<ModelEndpoint>>, ApiError> {
    state.catalog.model(model_id).map_err(error_response)?;

    let mut endpoints: Vec<ModelEndpoint> = state
        .endpoints
        .read()
        .await
        .values()
        .filter(|e| e.model_id == model_id)
        .cloned()
        .collect();
    endpoints.sort_by_key(|e| e.created_at);

    Ok(Json(endpoints))
}

/// Replace the routing rule of a model endpoint
async fn update_endpoint(
    State(state): State<Arc<AppState>>,
    Path((model_id, endpoint_id)): Path<(Id, Uuid)>,
    Json(req): Json<RuleRequest>,
) -> Result<Json<ModelEndpoint>, ApiError> {
    info!(model_id, endpoint_id = %endpoint_id, "Updating model endpoint");

    let model = state.catalog.model(model_id).map_err(error_response)?;
    let mut endpoint = state
        .endpoint(model_id, endpoint_id)
        .await
        .map_err(error_response)?;
    endpoint.rule = state.resolve_rule(&req).map_err(error_response)?;

    state
        .endpoint_manager
        .update(&model, &mut endpoint)
        .await
        .map_err(error_response)?;

    state
        .endpoints
        .write()
        .await
        .insert(endpoint.id, endpoint.clone());

    Ok(Json(endpoint))
}

/// Undeploy a model endpoint; the record is kept as terminated
async fn undeploy_endpoint(
    State(state): State<Arc<AppState>>,
    Path((model_id, endpoint_id)): Path<(Id, Uuid)>,
) -> Result<Json<ModelEndpoint>, ApiError> {
    info!(model_id, endpoint_id = %endpoint_id, "Undeploying model endpoint");

    let model = state.catalog.model(model_id).map_err(error_response)?;
    let mut endpoint = state
        .endpoint(model_id, endpoint_id)
        .await
        .map_err(error_response)?;

    state
        .endpoint_manager
        .undeploy(&model, &mut endpoint)
        .await
        .map_err(error_response)?;

    state
        .endpoints
        .write()
        .await
        .insert(endpoint.id, endpoint.clone());

    Ok(Json(endpoint))
}

/// Request to create a prediction job
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub environment_name: String,
    #[serde(default)]
    pub config: Config,
}

/// Create a prediction job; submission continues in the background
async fn create_job(
    State(state): State<Arc<AppState>>,
    Path((model_id, version_id)): Path<(Id, Id)>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<PredictionJob>), ApiError> {
    info!(
        model_id,
        version_id,
        environment = %req.environment_name,
        "Creating prediction job"
    );

    let model = state.catalog.model(model_id).map_err(error_response)?;
    let version = state
        .catalog
        .version(model_id, version_id)
        .map_err(error_response)?;
    let env = state
        .environment(&req.environment_name)
        .map_err(error_response)?;

    let job = state
        .orchestrator
        .create_job(env, &model, version, PredictionJob::new(req.config))
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// Get a prediction job
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path((model_id, version_id, job_id)): Path<(Id, Id, Uuid)>,
) -> Result<Json<PredictionJob>, ApiError> {
    let job = state
        .job(model_id, version_id, job_id)
        .await
        .map_err(error_response)?;
    Ok(Json(job))
}

/// Stop a prediction job
async fn stop_job(
    State(state): State<Arc<AppState>>,
    Path((model_id, version_id, job_id)): Path<(Id, Id, Uuid)>,
) -> Result<Json<PredictionJob>, ApiError> {
    info!(job_id = %job_id, "Stopping prediction job");

    let model = state.catalog.model(model_id).map_err(error_response)?;
    let version = state
        .catalog
        .version(model_id, version_id)
        .map_err(error_response)?;
    let job = state
        .job(model_id, version_id, job_id)
        .await
        .map_err(error_response)?;
    let env = state
        .environment(&job.environment_name)
        .map_err(error_response)?;

    let outcome = state
        .orchestrator
        .stop_job(env, &model, version, job_id)
        .await
        .map_err(error_response)?;

    if let Some(e) = &outcome.stop_error {
        warn!(job_id = %job_id, error = %e, "Executor refused to stop job");
    }

    outcome.into_result().map(Json).map_err(error_response)
}

/// List the containers of a prediction job
async fn list_containers(
    State(state): State<Arc<AppState>>,
    Path((model_id, version_id, job_id)): Path<(Id, Id, Uuid)>,
) -> Result<Json<Vec<Container>>, ApiError> {
    let model = state.catalog.model(model_id).map_err(error_response)?;
    let version = state
        .catalog
        .version(model_id, version_id)
        .map_err(error_response)?;
    let job = state
        .job(model_id, version_id, job_id)
        .await
        .map_err(error_response)?;
    let env = state
        .environment(&job.environment_name)
        .map_err(error_response)?;

    let containers = state
        .orchestrator
        .list_containers(env, &model, version, &job)
        .await
        .map_err(error_response)?;

    Ok(Json(containers))
}

/// List the prediction jobs of a project
async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Id>,
    Query(filter): Query<JobFilter>,
) -> Result<Json<Vec<PredictionJob>>, ApiError> {
    let project = state.catalog.project(project_id).map_err(error_response)?;
    let jobs = state
        .orchestrator
        .list_jobs(project, filter)
        .await
        .map_err(error_response)?;
    Ok(Json(jobs))
}

/// Submission outcome counters in text exposition format
async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use deckhand_core::{
        EnvironmentRegistry, JobStatus, ModelEndpointStatus, ModelRecord, ModelType, Project,
        ResourceRequest, Version, VersionEndpoint, VersionEndpointStatus,
    };
    use deckhand_runtime::{BatchExecutor, MemoryMeshClient, MeshClient, PrebuiltImageBuilder};
    use deckhand_store::MemoryJobStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct AcceptingExecutor;

    #[async_trait]
    impl BatchExecutor for AcceptingExecutor {
        async fn submit(&self, _: &PredictionJob, _: &str) -> DeckhandResult<()> {
            Ok(())
        }

        async fn stop(&self, _: &PredictionJob, _: &str) -> DeckhandResult<()> {
            Ok(())
        }

        async fn get_containers(&self, namespace: &str, _: &str) -> DeckhandResult<Vec<Container>> {
            Ok(vec![Container {
                name: "driver".to_string(),
                pod_name: "driver-0".to_string(),
                namespace: namespace.to_string(),
                cluster: "local".to_string(),
            }])
        }

        fn name(&self) -> &'static str {
            "accepting"
        }
    }

    const READY: &str = "6f1c1a52-6e4a-4d0e-8d1e-1b8a3c1f0a01";
    const CANARY: &str = "6f1c1a52-6e4a-4d0e-8d1e-1b8a3c1f0a02";
    const BROKEN: &str = "6f1c1a52-6e4a-4d0e-8d1e-1b8a3c1f0a03";

    fn version_endpoint(id: &str, version_id: Id, status: VersionEndpointStatus) -> VersionEndpoint {
        VersionEndpoint {
            id: id.parse().unwrap(),
            version_id,
            environment_name: "staging".to_string(),
            url: format!("http://a-{0}.fraud.models.example.com/v1/models/a-{0}", version_id),
            service_name: format!("a-{}-predictor.fraud.models.example.com", version_id),
            status,
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            projects: vec![Project {
                id: 1,
                name: "fraud".to_string(),
                team: "risk".to_string(),
                stream: "payments".to_string(),
                labels: Vec::new(),
            }],
            models: vec![
                ModelRecord {
                    id: 10,
                    project_id: 1,
                    name: "a".to_string(),
                    model_type: ModelType::PyFuncV2,
                },
                ModelRecord {
                    id: 11,
                    project_id: 1,
                    name: "b".to_string(),
                    model_type: ModelType::Tensorflow,
                },
            ],
            versions: vec![
                Version { id: 1, model_id: 10 },
                Version { id: 2, model_id: 10 },
                Version { id: 1, model_id: 11 },
            ],
            version_endpoints: vec![
                version_endpoint(READY, 1, VersionEndpointStatus::Running),
                version_endpoint(CANARY, 2, VersionEndpointStatus::Running),
                version_endpoint(BROKEN, 2, VersionEndpointStatus::Failed),
            ],
        }
    }

    fn environments() -> Vec<Environment> {
        let defaults = ResourceRequest {
            driver_cpu_request: "1".to_string(),
            driver_memory_request: "1Gi".to_string(),
            executor_cpu_request: "1".to_string(),
            executor_memory_request: "4Gi".to_string(),
            executor_replica: 3,
        };
        vec![
            Environment {
                default_prediction_job_resource_request: defaults.clone(),
                ..Environment::new("staging")
            },
            Environment {
                default_prediction_job_resource_request: defaults,
                ..Environment::new("production")
            },
        ]
    }

    fn test_state() -> Arc<AppState> {
        let mesh: Arc<dyn MeshClient> = Arc::new(MemoryMeshClient::new());
        let executor: Arc<dyn BatchExecutor> = Arc::new(AcceptingExecutor);
        let metrics = Arc::new(JobOutcomeMetrics::new());

        let orchestrator = JobOrchestrator::new(
            Arc::new(MemoryJobStore::new()),
            Arc::new(PrebuiltImageBuilder::new("ghcr.io/acme")),
            Arc::new(EnvironmentRegistry::new().with("staging", executor)),
            metrics.clone(),
            "staging",
        );

        Arc::new(AppState::new(
            catalog(),
            environments(),
            EndpointManager::new(
                Arc::new(EnvironmentRegistry::new().with("staging", mesh)),
                "staging",
            ),
            Arc::new(orchestrator),
            metrics,
        ))
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send(router, method, uri, body).await;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_endpoint_lifecycle() {
        let router = create_router(test_state());

        let (status, body) = send_json(
            &router,
            "POST",
            "/api/v1/models/10/endpoints",
            Some(json!({
                "environment_name": "staging",
                "destinations": [
                    { "version_endpoint_id": READY, "weight": 80 },
                    { "version_endpoint_id": CANARY, "weight": 20 }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "serving");
        assert_eq!(body["url"], "a.fraud.models.example.com");
        let endpoint_id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send_json(&router, "GET", "/api/v1/models/10/endpoints", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let uri = format!("/api/v1/models/10/endpoints/{}", endpoint_id);
        let (status, body) = send_json(
            &router,
            "PUT",
            &uri,
            Some(json!({
                "destinations": [{ "version_endpoint_id": CANARY, "weight": 100 }],
                "mirror": READY
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rule"]["destinations"].as_array().unwrap().len(), 1);

        let (status, body) = send_json(&router, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], serde_json::to_value(ModelEndpointStatus::Terminated).unwrap());
    }

    #[tokio::test]
    async fn test_deploy_errors() {
        let router = create_router(test_state());

        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/models/10/endpoints",
            Some(json!({
                "environment_name": "staging",
                "destinations": [{ "version_endpoint_id": BROKEN, "weight": 100 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/models/10/endpoints",
            Some(json!({
                "environment_name": "staging",
                "destinations": [{ "version_endpoint_id": Uuid::new_v4(), "weight": 100 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/models/10/endpoints",
            Some(json!({
                "environment_name": "production",
                "destinations": [{ "version_endpoint_id": READY, "weight": 100 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&router, "GET", "/api/v1/models/99/endpoints", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let state = test_state();
        let router = create_router(state.clone());

        let (status, body) = send_json(
            &router,
            "POST",
            "/api/v1/models/10/versions/1/jobs",
            Some(json!({
                "environment_name": "staging",
                "config": { "resource_request": { "executor_cpu_request": "2" } }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["config"]["resource_request"]["executor_replica"], 3);
        let job_id = body["id"].as_str().unwrap().to_string();

        state.orchestrator.drain().await;

        let uri = format!("/api/v1/models/10/versions/1/jobs/{}", job_id);
        let (status, body) = send_json(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["config"]["image_ref"], "ghcr.io/acme/fraud-a:1");

        let (status, body) =
            send_json(&router, "GET", &format!("{}/containers", uri), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["namespace"], "fraud");

        let (status, body) = send_json(&router, "PUT", &format!("{}/stop", uri), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], job_id.as_str());

        let (status, body) =
            send_json(&router, "GET", "/api/v1/projects/1/jobs?status=running", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, bytes) = send(&router, "GET", "/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(&format!(
            "deckhand_prediction_jobs_total{{project=\"fraud\",model=\"a\",status=\"{}\"}} 1",
            JobStatus::Running
        )));
    }

    #[tokio::test]
    async fn test_job_errors() {
        let router = create_router(test_state());

        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/models/11/versions/1/jobs",
            Some(json!({ "environment_name": "staging" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/models/10/versions/1/jobs",
            Some(json!({
                "environment_name": "staging",
                "config": { "resource_request": { "driver_memory_request": "lots" } }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/models/10/versions/1/jobs",
            Some(json!({ "environment_name": "qa" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let uri = format!("/api/v1/models/10/versions/1/jobs/{}", Uuid::new_v4());
        let (status, _) = send(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&router, "PUT", &format!("{}/stop", uri), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stop_in_unregistered_environment() {
        let state = test_state();
        let router = create_router(state.clone());

        let (status, body) = send_json(
            &router,
            "POST",
            "/api/v1/models/10/versions/2/jobs",
            Some(json!({ "environment_name": "production" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let job_id = body["id"].as_str().unwrap().to_string();
        state.orchestrator.drain().await;

        let uri = format!("/api/v1/models/10/versions/2/jobs/{}", job_id);
        let (status, _) = send(&router, "PUT", &format!("{}/stop", uri), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send_json(&router, "GET", &uri, None).await;
        assert_eq!(body["status"], "failed_submission");
    }
}
