//! Job registry contract.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::job::Job;

/// Name based lookup of registered jobs.
pub trait JobRegistry: Send + Sync {
    /// Look up a job by name.
    ///
    /// Returns [`RegistryError::NotRegistered`] for unknown names.
    fn lookup(&self, name: &str) -> Result<Arc<dyn Job>, RegistryError>;

    /// All jobs that carry a recurrence interval, keyed by name.
    fn get_all_periodic(&self) -> HashMap<String, Arc<dyn Job>>;
}
