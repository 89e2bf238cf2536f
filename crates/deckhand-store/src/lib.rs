//! deckhand-store: Prediction job storage
//!
//! This crate provides persistence for prediction jobs:
//! - The `JobStore` contract used by the orchestrator
//! - An in-memory store with an optional JSON snapshot on disk

pub mod memory;

pub use memory::MemoryJobStore;

use async_trait::async_trait;
use deckhand_core::{DeckhandResult, JobFilter, PredictionJob};
use uuid::Uuid;

/// Persistence for prediction jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Load a job by id, `NotFound` if absent
    async fn get(&self, id: Uuid) -> DeckhandResult<PredictionJob>;

    /// Insert or replace a job by id
    async fn save(&self, job: &PredictionJob) -> DeckhandResult<()>;

    /// List jobs matching a filter
    async fn list(&self, filter: &JobFilter) -> DeckhandResult<Vec<PredictionJob>>;
}
