//! Dispatch path errors.

use thiserror::Error;

use super::{PublishError, RegistryError};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Both a relative countdown and an absolute eta were supplied.
    #[error("countdown and eta are mutually exclusive")]
    ConflictingSchedule,

    #[error("Invalid countdown: {0}")]
    InvalidCountdown(String),

    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_is_transparent() {
        let err: DispatchError = RegistryError::NotRegistered("missing".to_string()).into();
        assert_eq!(err.to_string(), "Task not registered: missing");
    }

    #[test]
    fn test_conflicting_schedule() {
        let err = DispatchError::ConflictingSchedule;
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_publish_error_conversion() {
        let err: DispatchError = PublishError::Closed.into();
        assert!(err.to_string().contains("Publish failed"));
    }
}
