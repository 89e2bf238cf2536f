//! In-memory job store with optional JSON snapshot

use async_trait::async_trait;
use deckhand_core::{DeckhandError, DeckhandResult, JobFilter, PredictionJob};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::JobStore;

/// Job store keeping records in memory.
///
/// With a snapshot path every save rewrites the snapshot while holding the
/// write lock, so the file always reflects the last acknowledged save.
pub struct MemoryJobStore {
    /// Jobs indexed by ID
    jobs: RwLock<HashMap<Uuid, PredictionJob>>,
    /// Snapshot file, if any
    snapshot_path: Option<PathBuf>,
}

impl MemoryJobStore {
    /// Create a store that lives only in memory
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            snapshot_path: None,
        }
    }

    /// Create a store persisted to a JSON snapshot
    pub fn with_snapshot(path: PathBuf) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            snapshot_path: Some(path),
        }
    }

    /// Load the snapshot, if one is configured and present
    pub async fn init(&self) -> DeckhandResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            info!(path = %path.display(), "No job snapshot found, starting empty");
            return Ok(());
        }

        let content = tokio::fs::read(path).await?;
        let loaded: Vec<PredictionJob> = serde_json::from_slice(&content)?;
        let count = loaded.len();

        let mut jobs = self.jobs.write().await;
        jobs.clear();
        jobs.extend(loaded.into_iter().map(|job| (job.id, job)));

        info!(path = %path.display(), jobs = count, "Loaded job snapshot");
        Ok(())
    }

    /// Write all jobs to the snapshot file
    async fn write_snapshot(&self, jobs: &HashMap<Uuid, PredictionJob>) -> DeckhandResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let mut records: Vec<&PredictionJob> = jobs.values().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let content = serde_json::to_vec_pretty(&records)?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    /// Number of stored jobs
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, id: Uuid) -> DeckhandResult<PredictionJob> {
        let jobs = self.jobs.read().await;
        jobs.get(&id)
            .cloned()
            .ok_or_else(|| DeckhandError::NotFound(format!("prediction job {}", id)))
    }

    async fn save(&self, job: &PredictionJob) -> DeckhandResult<()> {
        let mut jobs = self.jobs.write().await;
        let previous = jobs.insert(job.id, job.clone());

        if let Err(e) = self.write_snapshot(&jobs).await {
            match previous {
                Some(previous) => jobs.insert(job.id, previous),
                None => jobs.remove(&job.id),
            };
            return Err(DeckhandError::Storage(format!(
                "failed to persist prediction job {}: {}",
                job.id, e
            )));
        }

        debug!(job_id = %job.id, status = %job.status, "Saved prediction job");
        Ok(())
    }

    async fn list(&self, filter: &JobFilter) -> DeckhandResult<Vec<PredictionJob>> {
        let jobs = self.jobs.read().await;
        let mut matched: Vec<PredictionJob> =
            jobs.values().filter(|j| filter.matches(j)).cloned().collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(matched)
    }
}
