//! Model endpoint lifecycle

use chrono::Utc;
use deckhand_core::{
    DeckhandError, DeckhandResult, EnvironmentRegistry, Model, ModelEndpoint, ModelEndpointStatus,
};
use deckhand_runtime::MeshClient;
use std::sync::Arc;
use tracing::{error, info};

use crate::route::RouteSpecBuilder;

/// Deploys, updates and undeploys model endpoints on the mesh.
///
/// The endpoint is only mutated after the mesh call succeeds; on failure it is
/// left exactly as passed in.
pub struct EndpointManager {
    mesh_clients: Arc<EnvironmentRegistry<dyn MeshClient>>,
    builder: RouteSpecBuilder,
}

impl EndpointManager {
    /// Create a manager over per-environment mesh clients
    pub fn new(
        mesh_clients: Arc<EnvironmentRegistry<dyn MeshClient>>,
        environment_label: impl Into<String>,
    ) -> Self {
        Self {
            mesh_clients,
            builder: RouteSpecBuilder::new(environment_label),
        }
    }

    /// Create the route of a new endpoint; the endpoint becomes serving
    pub async fn deploy(&self, model: &Model, endpoint: &mut ModelEndpoint) -> DeckhandResult<()> {
        let spec = self.builder.build(model, endpoint).map_err(|e| {
            error!(endpoint_id = %endpoint.id, error = %e, "Failed to build route spec");
            e
        })?;
        let mesh = self.mesh_clients.get(&endpoint.environment_name)?;

        let applied = mesh
            .create_route(&model.project.name, &spec)
            .await
            .map_err(|e| {
                error!(endpoint_id = %endpoint.id, error = %e, "Failed to create route");
                DeckhandError::mesh_apply("create route", e)
            })?;

        info!(
            endpoint_id = %endpoint.id,
            host = %applied.host,
            routes = applied.routes.len(),
            "Route created"
        );

        endpoint.url = applied.host;
        endpoint.status = ModelEndpointStatus::Serving;
        endpoint.updated_at = Utc::now();
        Ok(())
    }

    /// Re-apply the route of an endpoint after its rule changed
    pub async fn update(&self, model: &Model, endpoint: &mut ModelEndpoint) -> DeckhandResult<()> {
        let spec = self.builder.build(model, endpoint).map_err(|e| {
            error!(endpoint_id = %endpoint.id, error = %e, "Failed to build route spec");
            e
        })?;
        let mesh = self.mesh_clients.get(&endpoint.environment_name)?;

        let applied = mesh
            .patch_route(&model.project.name, &spec)
            .await
            .map_err(|e| {
                error!(endpoint_id = %endpoint.id, error = %e, "Failed to update route");
                DeckhandError::mesh_apply("update route", e)
            })?;

        info!(
            endpoint_id = %endpoint.id,
            host = %applied.host,
            routes = applied.routes.len(),
            "Route updated"
        );

        endpoint.url = applied.host;
        endpoint.status = ModelEndpointStatus::Serving;
        endpoint.updated_at = Utc::now();
        Ok(())
    }

    /// Delete the route of an endpoint; the record is kept as terminated
    pub async fn undeploy(&self, model: &Model, endpoint: &mut ModelEndpoint) -> DeckhandResult<()> {
        let mesh = self.mesh_clients.get(&endpoint.environment_name)?;

        mesh.delete_route(&model.project.name, &model.name)
            .await
            .map_err(|e| {
                error!(endpoint_id = %endpoint.id, error = %e, "Failed to delete route");
                DeckhandError::mesh_apply("delete route", e)
            })?;

        info!(endpoint_id = %endpoint.id, model = %model.name, "Route deleted");

        endpoint.status = ModelEndpointStatus::Terminated;
        endpoint.updated_at = Utc::now();
        Ok(())
    }
}
