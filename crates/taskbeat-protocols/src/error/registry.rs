//! Job registry errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Task not registered: {0}")]
    NotRegistered(String),

    #[error("Task already registered: {0}")]
    AlreadyRegistered(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_registered() {
        let err = RegistryError::NotRegistered("tasks.cleanup".to_string());
        assert!(err.to_string().contains("not registered"));
        assert!(err.to_string().contains("tasks.cleanup"));
    }

    #[test]
    fn test_already_registered() {
        let err = RegistryError::AlreadyRegistered("tasks.cleanup".to_string());
        assert!(err.to_string().contains("already registered"));
    }
}
