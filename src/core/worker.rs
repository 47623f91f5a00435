/*!
 * Transfer worker: runs one batch, in order, until done or the first failure
 */

use tracing::{debug, info, warn};

use super::job::{Batch, Destination, TransferJob};
use super::summary::TransferResult;
use crate::error::{Result, SyncError};
use crate::protocol::ObjectStore;

/// Execute every job of `batch` against `store`
///
/// Jobs run one after another in batch order. The first failing job stops
/// the batch; the jobs after it are never attempted.
pub async fn run_batch<S>(store: &S, bucket: &str, batch: Batch) -> TransferResult
where
    S: ObjectStore + ?Sized,
{
    let batch_id = batch.id;
    let batch_len = batch.len();
    let mut succeeded = 0u64;
    let mut first_error = None;

    debug!(batch = batch_id, jobs = batch_len, "Starting batch");

    for job in &batch.jobs {
        match transfer_one(store, bucket, job).await {
            Ok(()) => succeeded += 1,
            Err(e) => {
                warn!(
                    batch = batch_id,
                    source = %job.source_id(),
                    "Transfer failed, abandoning rest of batch: {}",
                    e
                );
                first_error = Some(e);
                break;
            }
        }
    }

    TransferResult {
        batch_id,
        batch_len,
        succeeded,
        first_error,
    }
}

/// Move a single file
async fn transfer_one<S>(store: &S, bucket: &str, job: &TransferJob) -> Result<()>
where
    S: ObjectStore + ?Sized,
{
    let destination = job.destination()?;

    match (job, &destination) {
        (TransferJob::Download { key, .. }, Destination::File(local_path)) => {
            if let Some(parent) = local_path.parent() {
                // create_dir_all treats an existing directory as success
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| SyncError::filesystem(parent, e))?;
            }

            info!("s3://{}/{} -> {}", bucket, key, local_path.display());
            store
                .get_object_to_file(bucket, key, local_path)
                .await
                .map_err(|cause| SyncError::Transfer {
                    from: format!("s3://{}/{}", bucket, key),
                    to: local_path.display().to_string(),
                    cause,
                })
        }
        (TransferJob::Upload { path, .. }, Destination::Object(key)) => {
            info!("{} -> s3://{}/{}", path.display(), bucket, key);
            store
                .put_object_from_file(path, bucket, key)
                .await
                .map_err(|cause| SyncError::Transfer {
                    from: path.display().to_string(),
                    to: format!("s3://{}/{}", bucket, key),
                    cause,
                })
        }
        _ => Err(SyncError::filesystem(
            job.source_id(),
            format!("{} job resolved to {}", job.direction(), destination),
        )),
    }
}
