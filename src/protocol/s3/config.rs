//! Configuration types for the S3 client

use crate::protocol::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Connection settings shared read-only by every worker's client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Custom endpoint URL (Tigris, MinIO, LocalStack, ...)
    pub endpoint: Option<String>,

    /// Region (e.g. "auto" for Tigris, "us-east-1")
    pub region: Option<String>,

    /// Access key ID (optional - uses credential chain if not provided)
    pub access_key: Option<String>,

    /// Secret access key (optional - uses credential chain if not provided)
    pub secret_key: Option<String>,

    /// Session token (for temporary credentials)
    pub session_token: Option<String>,

    /// Path-style addressing (required for some S3-compatible services)
    pub force_path_style: bool,

    /// Per-operation timeout in seconds (0 = no timeout)
    pub timeout_seconds: u64,
}

impl S3Config {
    pub fn new() -> Self {
        Self {
            endpoint: None,
            region: None,
            access_key: None,
            secret_key: None,
            session_token: None,
            force_path_style: false,
            timeout_seconds: 0,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> StoreResult<()> {
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(StoreError::InvalidConfig(
                "Both access_key and secret_key must be provided together".to_string(),
            ));
        }

        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(StoreError::InvalidConfig(format!(
                    "Endpoint must be an http(s) URL: {}",
                    endpoint
                )));
            }
        }

        Ok(())
    }

    /// Check if using custom endpoint (S3-compatible service)
    pub fn is_custom_endpoint(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Check if using explicit credentials
    pub fn has_explicit_credentials(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a bucket name according to S3 naming rules
pub fn is_valid_bucket_name(name: &str) -> bool {
    let len = name.len();

    // Length check: 3-63 characters
    if !(3..=63).contains(&len) {
        return false;
    }

    // Must start and end with lowercase letter or number
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !edge_ok(name.chars().next()) || !edge_ok(name.chars().last()) {
        return false;
    }

    // Only lowercase letters, numbers, hyphens, and periods
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return false;
    }

    if name.contains("..") {
        return false;
    }

    // Cannot be formatted as IP address
    if name.split('.').count() == 4 && name.split('.').all(|s| s.parse::<u8>().is_ok()) {
        return false;
    }

    !(name.starts_with("xn--") || name.ends_with("-s3alias"))
}
