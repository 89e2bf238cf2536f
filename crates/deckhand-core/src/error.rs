//! Error types for deckhand

use thiserror::Error;
use uuid::Uuid;

use crate::endpoint::VersionEndpointStatus;
use crate::job::ResourceField;

/// Main error type for deckhand
#[derive(Error, Debug)]
pub enum DeckhandError {
    /// Record absent from its store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Prediction job rejected before it was persisted
    #[error("Invalid job spec: {0}")]
    InvalidJobSpec(#[from] JobSpecError),

    /// Route synthesis failed
    #[error("Invalid route: {0}")]
    Route(#[from] RouteError),

    /// No collaborator registered for the named environment
    #[error("Environment not configured: {0}")]
    EnvironmentNotConfigured(String),

    /// Mesh client rejected the call or was unreachable
    #[error("Failed to {action}: {source}")]
    MeshApplyFailed {
        action: &'static str,
        #[source]
        source: Box<DeckhandError>,
    },

    /// Mesh client error
    #[error("Mesh error: {0}")]
    Mesh(String),

    /// Image builder error
    #[error("Image build error: {0}")]
    ImageBuild(String),

    /// Batch executor error
    #[error("Executor error: {0}")]
    Executor(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeckhandError {
    /// Wrap a mesh client failure with the action that was attempted
    pub fn mesh_apply(action: &'static str, source: DeckhandError) -> Self {
        DeckhandError::MeshApplyFailed {
            action,
            source: Box::new(source),
        }
    }
}

/// Validation failures for a prediction job, reported in evaluation order
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobSpecError {
    #[error("model type {0} is not yet supported")]
    UnsupportedModelType(String),

    #[error("invalid executor replica: {0}")]
    InvalidReplicaCount(i32),

    #[error("invalid {field}: {value:?}")]
    InvalidResourceQuantity { field: ResourceField, value: String },
}

/// Failures while synthesizing a route spec from an endpoint rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("version endpoint ({id}) is not running, but {status}")]
    DestinationNotReady {
        id: Uuid,
        status: VersionEndpointStatus,
    },

    #[error("invalid version endpoint url: {url}")]
    InvalidHost { url: String },

    #[error("endpoint rule has no destinations")]
    NoDestinations,
}

/// Result type for deckhand operations
pub type DeckhandResult<T> = Result<T, DeckhandError>;

impl From<serde_json::Error> for DeckhandError {
    fn from(err: serde_json::Error) -> Self {
        DeckhandError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for DeckhandError {
    fn from(err: toml::de::Error) -> Self {
        DeckhandError::Config(err.to_string())
    }
}
