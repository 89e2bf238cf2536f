//! Configuration types for deckhand

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::endpoint::VersionEndpoint;
use crate::error::{DeckhandError, DeckhandResult};
use crate::model::{Environment, Id, Model, ModelType, Project, Version};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// API server configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Deployment-wide settings
    #[serde(default)]
    pub deployment: DeploymentConfig,
    /// Environments jobs and endpoints can target
    #[serde(default)]
    pub environments: Vec<Environment>,
    /// Projects, models and versions known to this daemon
    #[serde(default)]
    pub catalog: Catalog,
}

impl DaemonConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> DeckhandResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeckhandError::Config(format!("Failed to read config file: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| DeckhandError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Look up an environment by name
    pub fn environment(&self, name: &str) -> DeckhandResult<&Environment> {
        self.environments
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DeckhandError::NotFound(format!("environment {}", name)))
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind the REST API server
    pub rest_address: String,
    /// Port for the REST API server
    pub rest_port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rest_address: "0.0.0.0".to_string(),
            rest_port: 9090,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or text)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Deployment-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Environment label stamped on routes and job metadata
    pub environment_label: String,
    /// Registry prefix for prediction job images
    pub image_registry: String,
    /// JSON snapshot backing the job store, in-memory only when unset
    pub job_snapshot_path: Option<PathBuf>,
    /// Program launched to run a prediction job
    pub launcher_path: PathBuf,
    /// Extra arguments passed to the launcher
    pub launcher_args: Vec<String>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            environment_label: "dev".to_string(),
            image_registry: "registry.local/deckhand".to_string(),
            job_snapshot_path: None,
            launcher_path: PathBuf::from("spark-submit"),
            launcher_args: Vec::new(),
        }
    }
}

/// Model catalog entry; its project is resolved through the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: Id,
    pub project_id: Id,
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
}

/// Read-only catalog of the records owned by the model registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub models: Vec<ModelRecord>,
    #[serde(default)]
    pub versions: Vec<Version>,
    #[serde(default)]
    pub version_endpoints: Vec<VersionEndpoint>,
}

impl Catalog {
    pub fn project(&self, id: Id) -> DeckhandResult<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| DeckhandError::NotFound(format!("project {}", id)))
    }

    /// Look up a model together with its project
    pub fn model(&self, id: Id) -> DeckhandResult<Model> {
        let record = self
            .models
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| DeckhandError::NotFound(format!("model {}", id)))?;
        let project = self.project(record.project_id)?;

        Ok(Model {
            id: record.id,
            project_id: record.project_id,
            project: project.clone(),
            name: record.name.clone(),
            model_type: record.model_type,
        })
    }

    /// Look up a version belonging to a model
    pub fn version(&self, model_id: Id, id: Id) -> DeckhandResult<&Version> {
        self.versions
            .iter()
            .find(|v| v.id == id && v.model_id == model_id)
            .ok_or_else(|| DeckhandError::NotFound(format!("version {} of model {}", id, model_id)))
    }

    pub fn version_endpoint(&self, id: Uuid) -> DeckhandResult<&VersionEndpoint> {
        self.version_endpoints
            .iter()
            .find(|ve| ve.id == id)
            .ok_or_else(|| DeckhandError::NotFound(format!("version endpoint {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[deployment]
environment_label = "staging"
image_registry = "ghcr.io/acme"
launcher_path = "/opt/spark/bin/spark-submit"

[[environments]]
name = "id-staging"
cluster = "staging-01"

[environments.default_prediction_job_resource_request]
driver_cpu_request = "1"
driver_memory_request = "1Gi"
executor_cpu_request = "1"
executor_memory_request = "4Gi"
executor_replica = 3

[[catalog.projects]]
id = 1
name = "fraud"
team = "risk"
stream = "payments"
labels = [{ key = "cost-center", value = "42" }]

[[catalog.models]]
id = 10
project_id = 1
name = "fraud-model"
type = "pyfunc_v2"

[[catalog.versions]]
id = 7
model_id = 10
"#;

    #[test]
    fn test_default_daemon_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.api.rest_port, 9090);
        assert_eq!(config.deployment.environment_label, "dev");
        assert!(config.environments.is_empty());
    }

    #[test]
    fn test_parse_config_and_resolve_catalog() {
        let config: DaemonConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.api.rest_port, 9090);
        assert_eq!(config.deployment.environment_label, "staging");

        let env = config.environment("id-staging").unwrap();
        assert_eq!(env.default_prediction_job_resource_request.executor_replica, 3);

        let model = config.catalog.model(10).unwrap();
        assert_eq!(model.project.name, "fraud");
        assert_eq!(model.project.labels[0].key, "cost-center");
        assert_eq!(model.model_type, ModelType::PyFuncV2);

        assert!(config.catalog.version(10, 7).is_ok());
        assert!(matches!(
            config.catalog.version(11, 7),
            Err(DeckhandError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_environment() {
        let config: DaemonConfig = toml::from_str(SAMPLE).unwrap();
        assert!(matches!(
            config.environment("production"),
            Err(DeckhandError::NotFound(_))
        ));
    }
}
