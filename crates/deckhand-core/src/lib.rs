//! deckhand-core: Core types for the deckhand orchestrator
//!
//! This crate provides the fundamental types used throughout deckhand:
//! - Projects, models, versions and environments
//! - Model endpoints, version endpoints and route specifications
//! - Prediction jobs and their resource requests
//! - Configuration types
//! - Error handling
//! - Per-environment collaborator registries

pub mod config;
pub mod endpoint;
pub mod error;
pub mod job;
pub mod model;
pub mod quantity;
pub mod registry;
pub mod route;

pub use config::*;
pub use endpoint::*;
pub use error::*;
pub use job::*;
pub use model::*;
pub use quantity::Quantity;
pub use registry::EnvironmentRegistry;
pub use route::*;
