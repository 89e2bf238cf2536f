//! deckhand-runtime: Collaborators deckhand drives
//!
//! This crate defines the contracts for the external systems deckhand talks to,
//! plus local implementations usable without a cluster:
//! - Image builder (prebuilt images resolved from a registry)
//! - Batch executor (launcher processes on the local host)
//! - Mesh client (in-memory route table)

pub mod image;
pub mod mesh;
pub mod process;
pub mod traits;

pub use image::PrebuiltImageBuilder;
pub use mesh::MemoryMeshClient;
pub use process::{ProcessExecutor, ProcessExecutorConfig};
pub use traits::{BatchExecutor, ImageBuilder, MeshClient};
