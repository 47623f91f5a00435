/*!
 * Error types for model-sync
 */

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::protocol::StoreError;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;
pub const EXIT_CAPABILITY: i32 = 3;

#[derive(Debug)]
pub enum SyncError {
    /// Listing the remote prefix or walking the local tree failed
    Enumeration { location: String, reason: String },

    /// A single object get/put failed
    Transfer {
        from: String,
        to: String,
        cause: StoreError,
    },

    /// Directory creation or local path resolution failed
    Filesystem { path: PathBuf, reason: String },

    /// Missing or invalid bucket, prefix or credentials
    Config(String),

    /// A required external capability (model exporter) is not available
    CapabilityUnavailable(String),

    /// The run finished but at least one batch stopped early
    Incomplete {
        succeeded: u64,
        attempted: u64,
        total: u64,
        first_error: Box<SyncError>,
    },

    /// A worker task panicked or was cancelled
    Parallel(String),

    /// I/O error
    Io(io::Error),
}

impl SyncError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::Enumeration { .. } | SyncError::Config(_) => EXIT_FATAL,
            SyncError::CapabilityUnavailable(_) => EXIT_CAPABILITY,
            SyncError::Transfer { .. }
            | SyncError::Filesystem { .. }
            | SyncError::Incomplete { .. }
            | SyncError::Parallel(_)
            | SyncError::Io(_) => EXIT_PARTIAL,
        }
    }

    /// Errors that stop the run before any transfer is attempted
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Enumeration { .. }
                | SyncError::Config(_)
                | SyncError::CapabilityUnavailable(_)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Enumeration { .. } => ErrorCategory::Enumeration,
            SyncError::Transfer { .. } => ErrorCategory::Transfer,
            SyncError::Filesystem { .. } | SyncError::Io(_) => ErrorCategory::Filesystem,
            SyncError::Config(_) => ErrorCategory::Configuration,
            SyncError::CapabilityUnavailable(_) => ErrorCategory::Capability,
            SyncError::Incomplete { first_error, .. } => first_error.category(),
            SyncError::Parallel(_) => ErrorCategory::Concurrency,
        }
    }

    pub(crate) fn enumeration(location: impl Into<String>, reason: impl fmt::Display) -> Self {
        SyncError::Enumeration {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        SyncError::Filesystem {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Enumeration,
    Transfer,
    Filesystem,
    Configuration,
    Capability,
    Concurrency,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Enumeration => write!(f, "enumeration"),
            ErrorCategory::Transfer => write!(f, "transfer"),
            ErrorCategory::Filesystem => write!(f, "filesystem"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Capability => write!(f, "capability"),
            ErrorCategory::Concurrency => write!(f, "concurrency"),
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Enumeration { location, reason } => {
                write!(f, "Failed to enumerate {}: {}", location, reason)
            }
            SyncError::Transfer { from, to, cause } => {
                write!(f, "Transfer {} -> {} failed: {}", from, to, cause)
            }
            SyncError::Filesystem { path, reason } => {
                write!(f, "Filesystem error at {}: {}", path.display(), reason)
            }
            SyncError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            SyncError::CapabilityUnavailable(msg) => {
                write!(f, "Required capability unavailable: {}", msg)
            }
            SyncError::Incomplete {
                succeeded,
                attempted,
                total,
                first_error,
            } => {
                write!(
                    f,
                    "Run incomplete: {} of {} items transferred ({} attempted); first error: {}",
                    succeeded, total, attempted, first_error
                )
            }
            SyncError::Parallel(msg) => {
                write!(f, "Worker error: {}", msg)
            }
            SyncError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Transfer { cause, .. } => Some(cause),
            SyncError::Incomplete { first_error, .. } => Some(first_error.as_ref()),
            SyncError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SyncError {
    fn from(err: io::Error) -> Self {
        SyncError::Io(err)
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Config(format!("JSON error: {}", err))
    }
}
