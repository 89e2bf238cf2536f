//! deckhand-network: Mesh routing for model endpoints
//!
//! This crate turns the routing intent of a model endpoint into mesh
//! configuration and applies it:
//! - Route spec synthesis (hosts, path rewrite, canary weights, mirroring)
//! - Endpoint lifecycle (deploy, update, undeploy) against per-environment mesh clients

pub mod endpoint;
pub mod route;

pub use endpoint::EndpointManager;
pub use route::RouteSpecBuilder;
