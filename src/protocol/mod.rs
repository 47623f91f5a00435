/*!
 * Object-store abstraction for model-sync
 *
 * The transfer engine only needs three capabilities from a store:
 * - list the keys under a prefix (one page at a time)
 * - download one object to a local file
 * - upload one local file to an object
 *
 * Any S3-compatible service satisfies this through `s3::S3Client`.
 * `memory::MemoryStore` is an in-process implementation used by the tests.
 */

mod error;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use std::path::Path;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// Default number of keys returned by one listing call (S3 caps pages at 1000)
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// One page of a prefix listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    /// Keys in lexicographic order
    pub keys: Vec<String>,

    /// Token for the next page, `None` when the listing is complete
    pub next_token: Option<String>,
}

impl ObjectListing {
    /// Whether the store cut this page short
    pub fn is_truncated(&self) -> bool {
        self.next_token.is_some()
    }
}

/// Operations the transfer engine needs from an object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of keys starting with `prefix`
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> StoreResult<ObjectListing>;

    /// Download `key` into `local_path`, overwriting it
    async fn get_object_to_file(&self, bucket: &str, key: &str, local_path: &Path)
        -> StoreResult<()>;

    /// Upload `local_path` to `key`, overwriting it
    async fn put_object_from_file(&self, local_path: &Path, bucket: &str, key: &str)
        -> StoreResult<()>;
}

/// Opens independent store clients
///
/// The worker pool calls `connect` once per worker, so no transport state is
/// shared between workers.
#[async_trait]
pub trait StoreConnector: Send + Sync + 'static {
    type Store: ObjectStore + 'static;

    async fn connect(&self) -> StoreResult<Self::Store>;
}
