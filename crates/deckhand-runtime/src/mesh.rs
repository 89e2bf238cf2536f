//! In-memory mesh client
//!
//! Keeps route specs in a local table instead of a cluster. Used by the daemon
//! in local mode and by tests that need a working mesh.

use async_trait::async_trait;
use deckhand_core::{DeckhandError, DeckhandResult, RouteSpec};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::traits::MeshClient;

type RouteKey = (String, String);

/// Mesh client backed by an in-memory route table
pub struct MemoryMeshClient {
    routes: RwLock<HashMap<RouteKey, RouteSpec>>,
}

impl MemoryMeshClient {
    /// Create an empty route table
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Get a route by namespace and name
    pub async fn route(&self, namespace: &str, name: &str) -> Option<RouteSpec> {
        let routes = self.routes.read().await;
        routes
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of routes in the table
    pub async fn len(&self) -> usize {
        self.routes.read().await.len()
    }
}

impl Default for MemoryMeshClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MeshClient for MemoryMeshClient {
    async fn create_route(&self, namespace: &str, spec: &RouteSpec) -> DeckhandResult<RouteSpec> {
        let mut routes = self.routes.write().await;
        let key = (namespace.to_string(), spec.name.clone());
        if routes.contains_key(&key) {
            return Err(DeckhandError::Mesh(format!(
                "route {}/{} already exists",
                namespace, spec.name
            )));
        }

        routes.insert(key, spec.clone());
        debug!(namespace = namespace, route = %spec.name, host = %spec.host, "Route created");
        Ok(spec.clone())
    }

    async fn patch_route(&self, namespace: &str, spec: &RouteSpec) -> DeckhandResult<RouteSpec> {
        let mut routes = self.routes.write().await;
        routes.insert((namespace.to_string(), spec.name.clone()), spec.clone());
        debug!(namespace = namespace, route = %spec.name, host = %spec.host, "Route patched");
        Ok(spec.clone())
    }

    async fn delete_route(&self, namespace: &str, name: &str) -> DeckhandResult<()> {
        let mut routes = self.routes.write().await;
        if routes
            .remove(&(namespace.to_string(), name.to_string()))
            .is_none()
        {
            return Err(DeckhandError::Mesh(format!(
                "route {}/{} not found",
                namespace, name
            )));
        }

        debug!(namespace = namespace, route = name, "Route deleted");
        Ok(())
    }
}
