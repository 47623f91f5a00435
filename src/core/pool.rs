/*!
 * Worker pool: one task and one store connection per batch
 *
 * Batches run concurrently on a `JoinSet`. Each task opens its own store
 * client through the `StoreConnector`, so no transport state is shared
 * between workers. Results come back in completion order.
 */

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::{self, JoinSet};
use tracing::{debug, error, info_span, Instrument};

use super::job::Batch;
use super::summary::TransferResult;
use super::worker::run_batch;
use crate::error::SyncError;
use crate::protocol::StoreConnector;

/// Runs batches in parallel against fresh store connections
pub struct WorkerPool<C: StoreConnector> {
    connector: Arc<C>,
}

impl<C: StoreConnector> Clone for WorkerPool<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
        }
    }
}

impl<C: StoreConnector> WorkerPool<C> {
    pub fn new(connector: Arc<C>) -> Self {
        Self { connector }
    }

    /// Run every batch on its own task and wait for all of them
    ///
    /// A failing batch never cancels the others. A task that panics is
    /// reported as a `SyncError::Parallel` result for its batch.
    pub async fn run(&self, bucket: &str, batches: Vec<Batch>) -> Vec<TransferResult> {
        let bucket: Arc<str> = Arc::from(bucket);
        let mut join_set = JoinSet::new();
        // Task id -> (batch id, batch length), for tasks that never return
        let mut tasks: HashMap<task::Id, (usize, usize)> = HashMap::new();

        for batch in batches {
            let batch_id = batch.id;
            let batch_len = batch.len();
            let connector = Arc::clone(&self.connector);
            let bucket = Arc::clone(&bucket);
            let span = info_span!("worker", batch = batch_id);

            let handle = join_set.spawn(
                async move {
                    match connector.connect().await {
                        Ok(store) => run_batch(&store, &bucket, batch).await,
                        Err(cause) => {
                            error!("Failed to open store connection: {}", cause);
                            TransferResult {
                                batch_id,
                                batch_len,
                                succeeded: 0,
                                first_error: Some(SyncError::Transfer {
                                    from: format!("s3://{}", bucket),
                                    to: format!("worker {}", batch_id),
                                    cause,
                                }),
                            }
                        }
                    }
                }
                .instrument(span),
            );
            tasks.insert(handle.id(), (batch_id, batch_len));
        }

        debug!(workers = tasks.len(), "Spawned transfer workers");

        let mut results = Vec::with_capacity(tasks.len());

        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((_, result)) => results.push(result),
                Err(e) => {
                    // Panicked or cancelled; only this task's batch is affected
                    let Some(&(batch_id, batch_len)) = tasks.get(&e.id()) else {
                        error!("Unknown worker task failed: {}", e);
                        continue;
                    };
                    error!(batch = batch_id, "Worker task failed: {}", e);
                    results.push(TransferResult {
                        batch_id,
                        batch_len,
                        succeeded: 0,
                        first_error: Some(SyncError::Parallel(format!(
                            "worker for batch {} did not finish: {}",
                            batch_id, e
                        ))),
                    });
                }
            }
        }

        results
    }
}
