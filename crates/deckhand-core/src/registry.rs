//! Per-environment collaborator registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DeckhandError, DeckhandResult};

/// Read-only map from environment name to a collaborator.
///
/// Built once at startup and shared by reference; lookups need no locking.
pub struct EnvironmentRegistry<T: ?Sized> {
    entries: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> EnvironmentRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a collaborator, returning the registry for chaining
    pub fn with(mut self, environment: impl Into<String>, entry: Arc<T>) -> Self {
        self.entries.insert(environment.into(), entry);
        self
    }

    /// Resolve the collaborator for an environment
    pub fn get(&self, environment: &str) -> DeckhandResult<Arc<T>> {
        self.entries
            .get(environment)
            .cloned()
            .ok_or_else(|| DeckhandError::EnvironmentNotConfigured(environment.to_string()))
    }

    /// Names of all configured environments
    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> Default for EnvironmentRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> FromIterator<(String, Arc<T>)> for EnvironmentRegistry<T> {
    fn from_iter<I: IntoIterator<Item = (String, Arc<T>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
