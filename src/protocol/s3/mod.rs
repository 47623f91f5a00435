//! Native S3 protocol implementation for model-sync
//!
//! This module provides S3 support using the official AWS SDK for Rust.
//! Besides AWS itself it targets S3-compatible services such as Tigris and
//! MinIO through a custom endpoint.
//!
//! # Example
//!
//! ```ignore
//! use model_sync::protocol::s3::{S3Config, S3Connector};
//! use model_sync::protocol::{ObjectStore, StoreConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = S3Config::new();
//!     config.endpoint = Some("https://fly.storage.tigris.dev".to_string());
//!     config.region = Some("auto".to_string());
//!
//!     let client = S3Connector::new(config)?.connect().await?;
//!     let page = client.list_objects("models", "flux-1.dev/", None).await?;
//!     println!("{} keys", page.keys.len());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod operations;

#[cfg(test)]
mod tests;

pub use client::{S3Client, S3Connector};
pub use config::{is_valid_bucket_name, S3Config};
