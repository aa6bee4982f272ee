//! In-process job registry.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use taskbeat_protocols::error::RegistryError;
use taskbeat_protocols::job::Job;
use taskbeat_protocols::registry::JobRegistry;

/// Thread-safe registry of jobs keyed by name.
///
/// Registration rejects duplicate names; lookups hand out shared
/// references, so the same job instance is used by every caller.
pub struct TaskRegistry {
    jobs: DashMap<String, Arc<dyn Job>>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }

    /// Register a job under its own name.
    pub fn register(&self, job: Arc<dyn Job>) -> Result<(), RegistryError> {
        let name = job.name().to_string();

        if self.jobs.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }

        debug!(
            "Registered task {} (periodic: {})",
            name,
            job.is_periodic()
        );
        self.jobs.insert(name, job);
        Ok(())
    }

    /// Remove a job by name.
    pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
        self.jobs
            .remove(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Jobs without a recurrence interval.
    pub fn get_all_regular(&self) -> HashMap<String, Arc<dyn Job>> {
        self.jobs
            .iter()
            .filter(|e| !e.value().is_periodic())
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry for TaskRegistry {
    fn lookup(&self, name: &str) -> Result<Arc<dyn Job>, RegistryError> {
        self.jobs
            .get(name)
            .map(|job| job.value().clone())
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }

    fn get_all_periodic(&self) -> HashMap<String, Arc<dyn Job>> {
        self.jobs
            .iter()
            .filter(|e| e.value().is_periodic())
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
