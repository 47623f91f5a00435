/*!
 * Core transfer engine
 *
 * - `batcher`: lazy batching and per-worker partitioning
 * - `path`: key and local path translation
 * - `job`: immutable transfer jobs and batches
 * - `enumerate`: remote and local source listing
 * - `worker`: sequential execution of one batch
 * - `pool`: parallel execution of all batches
 * - `orchestrator`: the end-to-end download and upload runs
 */

pub mod batcher;
pub mod enumerate;
pub mod job;
pub mod orchestrator;
pub mod path;
pub mod pool;
pub mod summary;
pub mod worker;

pub use batcher::{batches, partition, WorkerPlan};
pub use job::{Batch, Destination, Direction, TransferJob};
pub use orchestrator::{DownloadReport, DownloadRequest, Orchestrator, UploadReport, UploadRequest};
pub use pool::WorkerPool;
pub use summary::{DeploymentHints, RunSummary, TransferResult};
