/*!
 * Source enumeration: remote keys under a prefix, local files under a root
 */

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::path;
use crate::config::ListingMode;
use crate::error::{Result, SyncError};
use crate::protocol::ObjectStore;

/// List every object key under `prefix` (already normalized)
///
/// Directory-marker keys are skipped. A prefix with no objects is an error:
/// there is nothing to mirror and the caller almost certainly mistyped it.
pub async fn list_remote<S>(
    store: &S,
    bucket: &str,
    prefix: &str,
    mode: ListingMode,
) -> Result<Vec<String>>
where
    S: ObjectStore + ?Sized,
{
    let location = format!("s3://{}/{}", bucket, prefix);
    let mut keys = Vec::new();
    let mut token = None;
    let mut pages = 0usize;

    loop {
        let listing = store
            .list_objects(bucket, prefix, token.take())
            .await
            .map_err(|e| {
                if e.is_missing_location() {
                    SyncError::enumeration(
                        &location,
                        format!("bucket missing or not readable: {}", e),
                    )
                } else {
                    SyncError::enumeration(&location, e)
                }
            })?;
        pages += 1;

        keys.extend(
            listing
                .keys
                .into_iter()
                .filter(|key| !path::is_directory_marker(key, prefix)),
        );

        match (listing.next_token, mode) {
            (None, _) => break,
            (Some(_), ListingMode::SinglePage) => {
                warn!(
                    "Listing of {} is truncated after {} keys; single-page mode drops the rest",
                    location,
                    keys.len()
                );
                break;
            }
            (Some(next), ListingMode::Paginate) => token = Some(next),
        }
    }

    debug!(pages, keys = keys.len(), "Listed {}", location);

    if keys.is_empty() {
        return Err(SyncError::enumeration(location, "no objects under prefix"));
    }
    Ok(keys)
}

/// Regular files below `root`, in a stable (name-sorted) order
///
/// Symlinks are not followed. An empty tree yields an empty list.
pub fn list_local(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(SyncError::enumeration(
            root.display().to_string(),
            "not a directory",
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.map_err(|e| SyncError::enumeration(root.display().to_string(), e))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    debug!(files = files.len(), "Walked {}", root.display());
    Ok(files)
}

/// `list_local` off the async runtime
pub async fn list_local_blocking(root: PathBuf) -> Result<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || list_local(&root))
        .await
        .map_err(|e| SyncError::Parallel(format!("directory walk task failed: {}", e)))?
}
