/*!
 * Per-batch results, run summaries and deployment hints
 */

use serde::Serialize;

use crate::error::{Result, SyncError};
use crate::protocol::s3::S3Config;

/// Outcome of one worker's batch
#[derive(Debug)]
pub struct TransferResult {
    pub batch_id: usize,

    /// Jobs in the batch
    pub batch_len: usize,

    /// Jobs completed before the first failure
    pub succeeded: u64,

    /// The failure that stopped the batch, if any
    pub first_error: Option<SyncError>,
}

impl TransferResult {
    /// Jobs that were started: the successes plus the one that failed
    pub fn attempted(&self) -> u64 {
        self.succeeded + u64::from(self.first_error.is_some())
    }

    pub fn is_success(&self) -> bool {
        self.first_error.is_none()
    }
}

/// Aggregate of every batch in a run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Items produced by the enumerator
    pub total: u64,

    /// Batches dispatched to workers
    pub batches: usize,

    pub attempted: u64,
    pub succeeded: u64,

    /// First failure in completion order
    pub first_error: Option<SyncError>,
}

impl RunSummary {
    /// Fold worker results, which arrive in completion order
    pub fn from_results(total: u64, results: impl IntoIterator<Item = TransferResult>) -> Self {
        let mut summary = RunSummary {
            total,
            ..Default::default()
        };

        for result in results {
            summary.batches += 1;
            summary.attempted += result.attempted();
            summary.succeeded += result.succeeded;
            if summary.first_error.is_none() {
                summary.first_error = result.first_error;
            }
        }

        summary
    }

    pub fn is_success(&self) -> bool {
        self.first_error.is_none() && self.succeeded == self.total
    }

    /// Items never attempted because their batch stopped early
    pub fn skipped(&self) -> u64 {
        self.total.saturating_sub(self.attempted)
    }

    /// Turn a failed run into `SyncError::Incomplete`, keeping the counts
    pub fn into_result(self) -> Result<RunSummary> {
        match self.first_error {
            None if self.succeeded == self.total => Ok(self),
            None => Err(SyncError::Parallel(format!(
                "only {} of {} items reported success",
                self.succeeded, self.total
            ))),
            Some(first_error) => Err(SyncError::Incomplete {
                succeeded: self.succeeded,
                attempted: self.attempted,
                total: self.total,
                first_error: Box::new(first_error),
            }),
        }
    }
}

/// Values a deployment needs to load the uploaded model back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentHints {
    pub bucket_name: String,
    pub model_path: String,
    pub endpoint: Option<String>,
    pub region: Option<String>,
}

impl DeploymentHints {
    pub fn new(bucket: &str, model_path: &str, store: &S3Config) -> Self {
        Self {
            bucket_name: bucket.to_string(),
            model_path: model_path.trim_end_matches('/').to_string(),
            endpoint: store.endpoint.clone(),
            region: store.region.clone(),
        }
    }

    /// Environment lines for the deployment; secrets are left as placeholders
    pub fn env_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "AWS_ACCESS_KEY_ID=<key from earlier>".to_string(),
            "AWS_SECRET_ACCESS_KEY=<key from earlier>".to_string(),
        ];
        if let Some(endpoint) = &self.endpoint {
            lines.push(format!("AWS_ENDPOINT_URL_S3={}", endpoint));
        }
        if let Some(region) = &self.region {
            lines.push(format!("AWS_REGION={}", region));
        }
        lines.push(format!("MODEL_BUCKET_NAME={}", self.bucket_name));
        lines.push(format!("MODEL_PATH={}", self.model_path));
        lines
    }
}
