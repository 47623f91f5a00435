/*!
 * model-sync - bulk transfer of model trees to and from S3-compatible storage
 *
 * - Mirrors every object under a key prefix into a local directory
 * - Pushes a local directory tree under a key prefix
 * - Splits the work into one batch per worker, each worker on its own
 *   store connection
 * - Reports partial progress when a batch stops on its first failure
 * - Optionally exports a model with an external command before uploading
 *
 * Author: Shane Wall <shaneawall@gmail.com>
 */

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod prepare;
pub mod protocol;

// Re-export commonly used types
pub use config::{EngineOptions, ListingMode, LogLevel, SyncConfig};
pub use core::{
    DeploymentHints, DownloadReport, DownloadRequest, Orchestrator, RunSummary, UploadReport,
    UploadRequest,
};
pub use error::{Result, SyncError};
pub use protocol::s3::{S3Config, S3Connector};
pub use protocol::{MemoryStore, ObjectStore, StoreConnector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
