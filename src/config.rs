/*!
 * Configuration types for model-sync
 *
 * Configuration is assembled once at the process boundary (TOML file, then
 * environment, then CLI flags) and handed to the engine as plain values.
 * Nothing below the CLI reads the environment.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::protocol::s3::{is_valid_bucket_name, S3Config};

/// Environment variables read by `SyncConfig::apply_env`
pub const ENV_ENDPOINT: &str = "AWS_ENDPOINT_URL_S3";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const ENV_BUCKET: &str = "MODEL_BUCKET_NAME";
pub const ENV_MODEL_PATH: &str = "MODEL_PATH";
pub const ENV_EXPORTER: &str = "MODEL_EXPORTER";

/// How remote listings deal with the store's page limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ListingMode {
    /// Follow continuation tokens until the listing is complete
    #[default]
    Paginate,

    /// Issue exactly one listing call; keys past the first page are dropped
    SinglePage,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Settings the orchestrator needs for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on concurrent workers, always >= 1
    pub parallelism: usize,

    pub listing_mode: ListingMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            parallelism: get_cpu_count(),
            listing_mode: ListingMode::default(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Object-store connection settings
    #[serde(default)]
    pub store: S3Config,

    /// Default bucket holding model artifacts
    #[serde(default)]
    pub bucket: Option<String>,

    /// Default model path (key prefix) inside the bucket
    #[serde(default)]
    pub model_path: Option<String>,

    /// Number of parallel workers (0 = CPU count)
    #[serde(default)]
    pub parallelism: usize,

    #[serde(default)]
    pub listing_mode: ListingMode,

    /// External command that exports a model into a local directory
    #[serde(default)]
    pub exporter: Option<String>,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl SyncConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: SyncConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Overlay values from the process environment
    pub fn apply_process_env(&mut self) {
        let vars: HashMap<String, String> = std::env::vars().collect();
        self.apply_env(&vars);
    }

    /// Overlay values from an environment map; unset or empty variables are ignored
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.store.endpoint = Some(endpoint);
        }
        if let Some(region) = get(ENV_REGION) {
            self.store.region = Some(region);
        }
        if let Some(access_key) = get(ENV_ACCESS_KEY) {
            self.store.access_key = Some(access_key);
        }
        if let Some(secret_key) = get(ENV_SECRET_KEY) {
            self.store.secret_key = Some(secret_key);
        }
        if let Some(token) = get(ENV_SESSION_TOKEN) {
            self.store.session_token = Some(token);
        }
        if let Some(bucket) = get(ENV_BUCKET) {
            self.bucket = Some(bucket);
        }
        if let Some(model_path) = get(ENV_MODEL_PATH) {
            self.model_path = Some(model_path);
        }
        if let Some(exporter) = get(ENV_EXPORTER) {
            self.exporter = Some(exporter);
        }
    }

    /// Validate the configuration before any transfer begins
    pub fn validate(&self) -> Result<()> {
        self.store
            .validate()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        if let Some(bucket) = &self.bucket {
            validate_bucket_name(bucket)?;
        }

        Ok(())
    }

    /// Resolve the options handed to the orchestrator
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            parallelism: if self.parallelism == 0 {
                get_cpu_count()
            } else {
                self.parallelism
            },
            listing_mode: self.listing_mode,
        }
    }
}

/// Reject bucket names the store would refuse
pub fn validate_bucket_name(bucket: &str) -> Result<()> {
    if bucket.is_empty() {
        return Err(SyncError::Config("Bucket name cannot be empty".to_string()));
    }
    if !is_valid_bucket_name(bucket) {
        return Err(SyncError::Config(format!(
            "Invalid bucket name: {}. Bucket names must be 3-63 characters, \
             lowercase letters, numbers, hyphens, and periods only",
            bucket
        )));
    }
    Ok(())
}

/// Number of available CPU cores
///
/// If detection fails (restricted containers, cgroup environments) this
/// falls back to a single worker.
pub fn get_cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or_else(|e| {
            tracing::warn!(
                "Failed to detect available parallelism: {}. Defaulting to 1 worker",
                e
            );
            1
        })
}
