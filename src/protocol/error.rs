//! Error types for object-store operations

use std::io;
use thiserror::Error;

/// Result type alias for object-store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to an object store
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// AWS SDK error
    #[error("AWS SDK error: {0}")]
    Sdk(String),

    /// Service error with specific error code
    #[error("S3 service error ({code}): {message}")]
    Service { code: String, message: String },

    /// Object not found in bucket
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Bucket not found or not accessible
    #[error("Bucket not found or not accessible: {0}")]
    BucketNotFound(String),

    /// Access denied error
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error on the local side of a transfer
    #[error("I/O error: {0}")]
    Io(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),
}

impl StoreError {
    /// Check if the error points at a missing or unreadable bucket/prefix
    pub fn is_missing_location(&self) -> bool {
        match self {
            StoreError::BucketNotFound(_) | StoreError::AccessDenied(_) => true,
            StoreError::Service { code, .. } => code == "NoSuchBucket",
            _ => false,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_location() {
        assert!(StoreError::BucketNotFound("models".to_string()).is_missing_location());
        assert!(StoreError::Service {
            code: "NoSuchBucket".to_string(),
            message: "gone".to_string(),
        }
        .is_missing_location());
        assert!(!StoreError::Network("reset".to_string()).is_missing_location());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn test_error_display_formats() {
        let err = StoreError::NotFound {
            bucket: "my-bucket".to_string(),
            key: "my-key".to_string(),
        };
        assert_eq!(format!("{}", err), "Object not found: my-bucket/my-key");

        let err = StoreError::Service {
            code: "SlowDown".to_string(),
            message: "rate limited".to_string(),
        };
        assert_eq!(format!("{}", err), "S3 service error (SlowDown): rate limited");
    }
}
