//! Model endpoint and version endpoint type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Id;

/// A deployed instance of a model version.
///
/// Version endpoints are owned by the version deployer; deckhand only reads them
/// when synthesizing routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEndpoint {
    pub id: Uuid,
    pub version_id: Id,
    pub environment_name: String,
    /// Raw serving URL, e.g. `http://fraud-model-1.fraud.models.example.com/v1/models/fraud-model-1`
    pub url: String,
    /// Internal service name used as the routing host header
    pub service_name: String,
    pub status: VersionEndpointStatus,
}

/// Version endpoint status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionEndpointStatus {
    Pending,
    Running,
    Terminated,
    Failed,
}

impl std::fmt::Display for VersionEndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionEndpointStatus::Pending => write!(f, "pending"),
            VersionEndpointStatus::Running => write!(f, "running"),
            VersionEndpointStatus::Terminated => write!(f, "terminated"),
            VersionEndpointStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A weighted destination inside an endpoint rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub version_endpoint: VersionEndpoint,
    /// Traffic weight, passed to the mesh verbatim
    pub weight: i32,
}

/// Routing intent of a model endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Ordered destinations; order is preserved in the route spec
    pub destinations: Vec<Destination>,
    /// Optional target receiving a copy of the traffic
    #[serde(default)]
    pub mirror: Option<VersionEndpoint>,
}

/// Stable, model-level endpoint routing traffic across version endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEndpoint {
    pub id: Uuid,
    pub model_id: Id,
    pub environment_name: String,
    pub rule: Rule,
    pub status: ModelEndpointStatus,
    /// Resolved host, set once the route is applied
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ModelEndpoint {
    /// Create a pending endpoint for a model in an environment
    pub fn new(model_id: Id, environment_name: String, rule: Rule) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            model_id,
            environment_name,
            rule,
            status: ModelEndpointStatus::Pending,
            url: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Model endpoint status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelEndpointStatus {
    Pending,
    Serving,
    Terminated,
    Failed,
}

impl std::fmt::Display for ModelEndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelEndpointStatus::Pending => write!(f, "pending"),
            ModelEndpointStatus::Serving => write!(f, "serving"),
            ModelEndpointStatus::Terminated => write!(f, "terminated"),
            ModelEndpointStatus::Failed => write!(f, "failed"),
        }
    }
}
