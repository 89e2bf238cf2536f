//! Collaborator trait definitions

use async_trait::async_trait;
use deckhand_core::{
    Container, DeckhandResult, Model, PredictionJob, Project, RouteSpec, Version,
};

/// Builds the image a prediction job runs
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Build the image for a model version, returning its reference
    async fn build_image(
        &self,
        project: &Project,
        model: &Model,
        version: &Version,
    ) -> DeckhandResult<String>;

    /// Containers of the build for a model version
    async fn get_containers(
        &self,
        project: &Project,
        model: &Model,
        version: &Version,
    ) -> DeckhandResult<Vec<Container>>;
}

/// Runs prediction jobs on external compute, one per environment
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    /// Submit a job into a namespace
    async fn submit(&self, job: &PredictionJob, namespace: &str) -> DeckhandResult<()>;

    /// Stop a submitted job
    async fn stop(&self, job: &PredictionJob, namespace: &str) -> DeckhandResult<()>;

    /// Containers of the pods matching a label selector
    async fn get_containers(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> DeckhandResult<Vec<Container>>;

    /// Get the executor name
    fn name(&self) -> &'static str;
}

/// Applies route specs to the service mesh, one per environment
#[async_trait]
pub trait MeshClient: Send + Sync {
    /// Create a route; fails if one with the same name exists
    async fn create_route(&self, namespace: &str, spec: &RouteSpec) -> DeckhandResult<RouteSpec>;

    /// Create or replace a route
    async fn patch_route(&self, namespace: &str, spec: &RouteSpec) -> DeckhandResult<RouteSpec>;

    /// Delete a route by name
    async fn delete_route(&self, namespace: &str, name: &str) -> DeckhandResult<()>;
}
