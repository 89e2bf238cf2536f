//! CLI commands implementation

use anyhow::Result;
use deckhand_core::{Config, Container, EnvVar, Id, ModelEndpoint, PredictionJob};
use serde::Serialize;
use uuid::Uuid;

/// API client for communicating with the daemon
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn job_url(&self, model: Id, version: Id, job: Uuid) -> String {
        self.url(&format!(
            "/api/v1/models/{}/versions/{}/jobs/{}",
            model, version, job
        ))
    }
}

/// Traffic split entry given on the command line
#[derive(Debug, Clone, Serialize)]
pub struct DestinationArg {
    pub version_endpoint_id: Uuid,
    pub weight: i32,
}

/// Parse `VERSION_ENDPOINT_ID=WEIGHT`
pub fn parse_destination(s: &str) -> Result<DestinationArg, String> {
    let (id, weight) = s
        .split_once('=')
        .ok_or_else(|| format!("expected VERSION_ENDPOINT_ID=WEIGHT, got '{}'", s))?;
    let version_endpoint_id = Uuid::parse_str(id.trim())
        .map_err(|e| format!("invalid version endpoint id '{}': {}", id, e))?;
    let weight = weight
        .trim()
        .parse()
        .map_err(|e| format!("invalid weight '{}': {}", weight, e))?;

    Ok(DestinationArg {
        version_endpoint_id,
        weight,
    })
}

/// Parse `KEY=VALUE`
pub fn parse_env_var(s: &str) -> Result<EnvVar, String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok(EnvVar {
            name: name.to_string(),
            value: value.to_string(),
        }),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// Turn an error response into an error carrying the server's message
async fn failure(response: reqwest::Response, action: &str) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    anyhow::anyhow!("Failed to {} ({}): {}", action, status, body)
}

/// List the jobs of a project
pub async fn list_jobs(
    client: &ApiClient,
    project: Id,
    name: Option<String>,
    status: Option<String>,
) -> Result<()> {
    let mut query = Vec::new();
    if let Some(name) = name {
        query.push(("name", name));
    }
    if let Some(status) = status {
        query.push(("status", status));
    }

    let response = client
        .client
        .get(client.url(&format!("/api/v1/projects/{}/jobs", project)))
        .query(&query)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(failure(response, "list jobs").await);
    }

    let jobs: Vec<PredictionJob> = response.json().await?;
    if jobs.is_empty() {
        println!("No prediction jobs found");
        return Ok(());
    }

    println!(
        "{:<36} {:<36} {:<8} {:<12} {:<18}",
        "ID", "NAME", "VERSION", "ENVIRONMENT", "STATUS"
    );
    println!("{}", "-".repeat(114));
    for job in jobs {
        println!(
            "{:<36} {:<36} {:<8} {:<12} {:<18}",
            job.id,
            job.name,
            job.version_id,
            job.environment_name,
            job.status.to_string()
        );
    }

    Ok(())
}

/// Show a job
pub async fn get_job(client: &ApiClient, model: Id, version: Id, job: Uuid) -> Result<()> {
    let response = client
        .client
        .get(client.job_url(model, version, job))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(failure(response, "get job").await);
    }

    let job: PredictionJob = response.json().await?;
    print_job_details(&job);
    Ok(())
}

/// Create a job
pub async fn create_job(
    client: &ApiClient,
    model: Id,
    version: Id,
    environment: String,
    config: Config,
) -> Result<()> {
    #[derive(Serialize)]
    struct CreateRequest {
        environment_name: String,
        config: Config,
    }

    let response = client
        .client
        .post(client.url(&format!(
            "/api/v1/models/{}/versions/{}/jobs",
            model, version
        )))
        .json(&CreateRequest {
            environment_name: environment,
            config,
        })
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(failure(response, "create job").await);
    }

    let job: PredictionJob = response.json().await?;
    println!("Prediction job '{}' created", job.name);
    print_job_details(&job);
    Ok(())
}

/// Stop a job
pub async fn stop_job(client: &ApiClient, model: Id, version: Id, job: Uuid) -> Result<()> {
    let response = client
        .client
        .put(format!("{}/stop", client.job_url(model, version, job)))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(failure(response, "stop job").await);
    }

    let job: PredictionJob = response.json().await?;
    println!("Stop requested for prediction job '{}'", job.name);
    Ok(())
}

/// List the containers of a job
pub async fn list_containers(client: &ApiClient, model: Id, version: Id, job: Uuid) -> Result<()> {
    let response = client
        .client
        .get(format!("{}/containers", client.job_url(model, version, job)))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(failure(response, "list containers").await);
    }

    let containers: Vec<Container> = response.json().await?;
    if containers.is_empty() {
        println!("No containers found");
        return Ok(());
    }

    println!(
        "{:<30} {:<40} {:<20} {:<15}",
        "NAME", "POD", "NAMESPACE", "CLUSTER"
    );
    println!("{}", "-".repeat(105));
    for c in containers {
        println!(
            "{:<30} {:<40} {:<20} {:<15}",
            c.name, c.pod_name, c.namespace, c.cluster
        );
    }

    Ok(())
}

/// List the endpoints of a model
pub async fn list_endpoints(client: &ApiClient, model: Id) -> Result<()> {
    let response = client
        .client
        .get(client.url(&format!("/api/v1/models/{}/endpoints", model)))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(failure(response, "list endpoints").await);
    }

    let endpoints: Vec<ModelEndpoint> = response.json().await?;
    if endpoints.is_empty() {
        println!("No model endpoints found");
        return Ok(());
    }

    println!(
        "{:<36} {:<12} {:<11} {}",
        "ID", "ENVIRONMENT", "STATUS", "URL"
    );
    println!("{}", "-".repeat(100));
    for ep in endpoints {
        println!(
            "{:<36} {:<12} {:<11} {}",
            ep.id,
            ep.environment_name,
            ep.status.to_string(),
            ep.url
        );
    }

    Ok(())
}

/// Deploy a model endpoint
pub async fn deploy_endpoint(
    client: &ApiClient,
    model: Id,
    environment: String,
    destinations: Vec<DestinationArg>,
    mirror: Option<Uuid>,
) -> Result<()> {
    #[derive(Serialize)]
    struct DeployRequest {
        environment_name: String,
        destinations: Vec<DestinationArg>,
        mirror: Option<Uuid>,
    }

    let response = client
        .client
        .post(client.url(&format!("/api/v1/models/{}/endpoints", model)))
        .json(&DeployRequest {
            environment_name: environment,
            destinations,
            mirror,
        })
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(failure(response, "deploy endpoint").await);
    }

    let endpoint: ModelEndpoint = response.json().await?;
    println!("Model endpoint {} deployed", endpoint.id);
    println!("  URL: {}", endpoint.url);
    for d in &endpoint.rule.destinations {
        println!(
            "  -> version {} ({}%)",
            d.version_endpoint.version_id, d.weight
        );
    }
    if let Some(mirror) = &endpoint.rule.mirror {
        println!("  mirror: version {}", mirror.version_id);
    }

    Ok(())
}

/// Undeploy a model endpoint
pub async fn undeploy_endpoint(client: &ApiClient, model: Id, endpoint: Uuid) -> Result<()> {
    let response = client
        .client
        .delete(client.url(&format!(
            "/api/v1/models/{}/endpoints/{}",
            model, endpoint
        )))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(failure(response, "undeploy endpoint").await);
    }

    println!("Model endpoint {} undeployed", endpoint);
    Ok(())
}

/// Show submission outcome counters
pub async fn metrics(client: &ApiClient) -> Result<()> {
    let response = client.client.get(client.url("/metrics")).send().await?;

    if !response.status().is_success() {
        return Err(failure(response, "get metrics").await);
    }

    print!("{}", response.text().await?);
    Ok(())
}

/// Helper to print job details
fn print_job_details(job: &PredictionJob) {
    let resources = &job.config.resource_request;
    println!("Prediction job: {}", job.name);
    println!("  ID: {}", job.id);
    println!("  Model: {} (version {})", job.version_model_id, job.version_id);
    println!("  Environment: {}", job.environment_name);
    println!("  Status: {}", job.status);
    if !job.error.is_empty() {
        println!("  Error: {}", job.error);
    }
    if !job.config.image_ref.is_empty() {
        println!("  Image: {}", job.config.image_ref);
    }
    println!(
        "  Driver: {} CPU, {} memory",
        resources.driver_cpu_request, resources.driver_memory_request
    );
    println!(
        "  Executors: {} x ({} CPU, {} memory)",
        resources.executor_replica, resources.executor_cpu_request, resources.executor_memory_request
    );
}
