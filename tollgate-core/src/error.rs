use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Failures of the backing store.
///
/// These are propagated unchanged to the caller: the accounting layer never
/// retries and never synthesizes an allowed/denied answer when the store is
/// unreachable. Fail-open vs fail-closed is the caller's policy.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Input rejected before any store call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Identity must not be empty")]
    EmptyIdentity,

    #[error("Unrecognized action category: {0}")]
    InvalidCategory(String),

    #[error("Max attempts must be positive, got {0}")]
    InvalidMaxAttempts(u32),

    #[error("Window duration must be positive")]
    InvalidWindow,

    #[error("Retention period must be positive")]
    InvalidRetention,
}

impl Error {
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let storage_error = Error::Storage(StorageError::Connection("refused".to_string()));
        assert_eq!(
            storage_error.to_string(),
            "Storage error: Connection error: refused"
        );

        let validation_error = Error::Validation(ValidationError::EmptyIdentity);
        assert_eq!(
            validation_error.to_string(),
            "Validation error: Identity must not be empty"
        );
    }

    #[test]
    fn test_validation_error_variants() {
        let bad_category = ValidationError::InvalidCategory("sign-out".to_string());
        assert_eq!(
            bad_category.to_string(),
            "Unrecognized action category: sign-out"
        );

        let bad_max = ValidationError::InvalidMaxAttempts(0);
        assert_eq!(bad_max.to_string(), "Max attempts must be positive, got 0");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::Storage(StorageError::Database("oops".to_string())).is_storage_error());
        assert!(!Error::Storage(StorageError::Database("oops".to_string())).is_validation_error());
        assert!(Error::Validation(ValidationError::InvalidWindow).is_validation_error());
    }

    #[test]
    fn test_error_from_conversions() {
        let error: Error = StorageError::Timeout("5s elapsed".to_string()).into();
        assert!(matches!(error, Error::Storage(StorageError::Timeout(_))));

        let error: Error = ValidationError::EmptyIdentity.into();
        assert!(matches!(
            error,
            Error::Validation(ValidationError::EmptyIdentity)
        ));
    }
}
