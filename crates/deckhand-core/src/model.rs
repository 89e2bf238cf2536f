//! Project, Model, Version and Environment type definitions

use serde::{Deserialize, Serialize};

use crate::job::ResourceRequest;

/// Identifier of catalog records (projects, models, versions)
pub type Id = i32;

/// Free-form key/value label attached to a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Project owning a set of models; its name doubles as the cluster namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub name: String,
    /// Owning team
    #[serde(default)]
    pub team: String,
    /// Owning stream
    #[serde(default)]
    pub stream: String,
    /// User-defined labels propagated to deployed resources
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// Supported model flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    #[serde(rename = "pyfunc")]
    PyFunc,
    #[serde(rename = "pyfunc_v2")]
    PyFuncV2,
    Tensorflow,
    Xgboost,
    Sklearn,
    #[serde(rename = "pytorch")]
    PyTorch,
    Onnx,
    Custom,
}

impl ModelType {
    /// Whether prediction jobs can be created for this model type
    pub fn supports_batch(&self) -> bool {
        matches!(self, ModelType::PyFuncV2)
    }

    /// Whether jobs for this model type go through an image-build phase
    pub fn requires_image_build(&self) -> bool {
        matches!(self, ModelType::PyFuncV2)
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::PyFunc => write!(f, "pyfunc"),
            ModelType::PyFuncV2 => write!(f, "pyfunc_v2"),
            ModelType::Tensorflow => write!(f, "tensorflow"),
            ModelType::Xgboost => write!(f, "xgboost"),
            ModelType::Sklearn => write!(f, "sklearn"),
            ModelType::PyTorch => write!(f, "pytorch"),
            ModelType::Onnx => write!(f, "onnx"),
            ModelType::Custom => write!(f, "custom"),
        }
    }
}

/// A registered model, carrying its resolved project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Id,
    pub project_id: Id,
    pub project: Project,
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
}

/// A version of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: Id,
    pub model_id: Id,
}

/// Deployment target environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    /// Cluster backing this environment
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub region: String,
    /// Resource request applied to prediction jobs that leave fields unset
    #[serde(default)]
    pub default_prediction_job_resource_request: ResourceRequest,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cluster: String::new(),
            region: String::new(),
            default_prediction_job_resource_request: ResourceRequest::default(),
        }
    }
}
