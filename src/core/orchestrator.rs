/*!
 * Orchestrator: enumerate, partition, fan out, aggregate
 *
 * Both directions run the same pipeline:
 *
 * 1. Validate the request (bucket name, prefix) before touching the store
 * 2. Enumerate the sources to completion
 * 3. Plan `min(count, parallelism)` workers and partition the jobs
 * 4. Run one batch per worker, each on its own store connection
 * 5. Fold the per-batch results into a `RunSummary`
 */

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::batcher::{partition, WorkerPlan};
use super::enumerate::{list_local_blocking, list_remote};
use super::job::{Batch, Direction, TransferJob};
use super::path;
use super::pool::WorkerPool;
use super::summary::{DeploymentHints, RunSummary};
use crate::config::{validate_bucket_name, EngineOptions};
use crate::error::{Result, SyncError};
use crate::protocol::s3::S3Config;
use crate::protocol::StoreConnector;

/// Mirror a remote prefix into a local directory
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub bucket: String,

    /// Key prefix, with or without a trailing `/`
    pub prefix: String,

    /// Directory the prefix is recreated under
    pub dest_dir: PathBuf,
}

/// Push a local directory under a key prefix
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bucket: String,

    /// Key prefix the tree lands under, with or without a trailing `/`
    pub bucket_path: String,

    pub local_dir: PathBuf,
}

#[derive(Debug)]
pub struct DownloadReport {
    /// Where the prefix was mirrored
    pub local_root: PathBuf,
    pub summary: RunSummary,
    pub duration: Duration,
}

impl DownloadReport {
    pub fn into_result(self) -> Result<Self> {
        let DownloadReport {
            local_root,
            summary,
            duration,
        } = self;
        let summary = summary.into_result()?;
        Ok(DownloadReport {
            local_root,
            summary,
            duration,
        })
    }
}

#[derive(Debug)]
pub struct UploadReport {
    pub bucket: String,
    pub model_path: String,
    pub summary: RunSummary,
    pub duration: Duration,
}

impl UploadReport {
    pub fn into_result(self) -> Result<Self> {
        let UploadReport {
            bucket,
            model_path,
            summary,
            duration,
        } = self;
        let summary = summary.into_result()?;
        Ok(UploadReport {
            bucket,
            model_path,
            summary,
            duration,
        })
    }

    /// Deployment settings for loading the uploaded tree back
    pub fn hints(&self, store: &S3Config) -> DeploymentHints {
        DeploymentHints::new(&self.bucket, &self.model_path, store)
    }
}

/// Drives whole transfer runs over a store connector
pub struct Orchestrator<C: StoreConnector> {
    connector: Arc<C>,
    options: EngineOptions,
}

impl<C: StoreConnector> Orchestrator<C> {
    pub fn new(connector: C, options: EngineOptions) -> Self {
        Self {
            connector: Arc::new(connector),
            options,
        }
    }

    /// Mirror every object under `request.prefix` into
    /// `dest_dir/<prefix segments>/<relative key>`
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadReport> {
        let start = Instant::now();
        validate_bucket_name(&request.bucket)?;
        let prefix = path::normalize_prefix(&request.prefix)?;
        let local_root = path::local_root(&request.dest_dir, &prefix);

        // Listing uses its own connection; workers open theirs later
        let lister = self.connector.connect().await.map_err(|e| {
            SyncError::enumeration(format!("s3://{}/{}", request.bucket, prefix), e)
        })?;
        let keys = list_remote(&lister, &request.bucket, &prefix, self.options.listing_mode).await?;
        drop(lister);

        info!(
            "Found {} objects under s3://{}/{}",
            keys.len(),
            request.bucket,
            prefix
        );

        let jobs = keys
            .into_iter()
            .map(|key| TransferJob::download(key, &prefix, &local_root))
            .collect::<Result<Vec<_>>>()?;

        let summary = self
            .execute(Direction::Download, &request.bucket, jobs)
            .await;

        Ok(DownloadReport {
            local_root,
            summary,
            duration: start.elapsed(),
        })
    }

    /// Push every regular file under `request.local_dir` to
    /// `bucket_path/<relative path>`
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadReport> {
        let start = Instant::now();
        validate_bucket_name(&request.bucket)?;
        // Same emptiness rule as downloads; the caller's form is kept for keys
        path::normalize_prefix(&request.bucket_path)?;

        let files = list_local_blocking(request.local_dir.clone()).await?;
        if files.is_empty() {
            warn!(
                "{} contains no files; nothing to upload",
                request.local_dir.display()
            );
        } else {
            info!("Found {} files under {}", files.len(), request.local_dir.display());
        }

        // Paths are resolved per job, so one bad file only stops its batch
        let jobs: Vec<TransferJob> = files
            .into_iter()
            .map(|file| TransferJob::upload(file, &request.local_dir, &request.bucket_path))
            .collect();

        let summary = self.execute(Direction::Upload, &request.bucket, jobs).await;

        Ok(UploadReport {
            bucket: request.bucket.clone(),
            model_path: request.bucket_path.clone(),
            summary,
            duration: start.elapsed(),
        })
    }

    async fn execute(&self, direction: Direction, bucket: &str, jobs: Vec<TransferJob>) -> RunSummary {
        let total = jobs.len() as u64;
        let plan = WorkerPlan::new(jobs.len(), self.options.parallelism);
        if plan.is_empty() {
            return RunSummary::from_results(0, Vec::new());
        }

        info!(
            "Starting {} of {} items with {} workers (batch size {})",
            direction, plan.item_count, plan.worker_count, plan.batch_size
        );

        let batches: Vec<Batch> = partition(jobs, &plan)
            .enumerate()
            .map(|(id, jobs)| Batch::new(id, jobs))
            .collect();

        let results = WorkerPool::new(Arc::clone(&self.connector))
            .run(bucket, batches)
            .await;
        let summary = RunSummary::from_results(total, results);

        if summary.is_success() {
            info!("{} complete: {} items", direction, summary.succeeded);
        } else {
            warn!(
                "{} incomplete: {} of {} items succeeded, {} never attempted",
                direction,
                summary.succeeded,
                summary.total,
                summary.skipped()
            );
        }
        summary
    }
}
