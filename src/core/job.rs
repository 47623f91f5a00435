/*!
 * Transfer jobs and batches
 */

use std::fmt;
use std::path::{Path, PathBuf};

use super::path;
use crate::error::{Result, SyncError};

/// Which way a run moves data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Object store -> local tree
    Download,
    /// Local tree -> object store
    Upload,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Download => write!(f, "download"),
            Direction::Upload => write!(f, "upload"),
        }
    }
}

/// Where one job writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    File(PathBuf),
    Object(String),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::File(path) => write!(f, "{}", path.display()),
            Destination::Object(key) => write!(f, "{}", key),
        }
    }
}

/// One file moving between the local tree and the store
///
/// Jobs are built once from enumerated sources and never change. Upload jobs
/// resolve their relative path when the destination is requested, so a bad
/// local path fails only its own job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferJob {
    Download {
        key: String,
        local_root: PathBuf,
        relative_path: String,
    },
    Upload {
        path: PathBuf,
        local_root: PathBuf,
        key_prefix: String,
    },
}

impl TransferJob {
    /// Job fetching `key` into the tree mirrored at `local_root`
    ///
    /// `prefix` must be the normalized prefix the key was listed under.
    pub fn download(key: impl Into<String>, prefix: &str, local_root: &Path) -> Result<Self> {
        let key = key.into();
        let relative_path = path::relative_key(&key, prefix)
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| {
                SyncError::enumeration(
                    prefix,
                    format!("listed key {:?} is not an object under the prefix", key),
                )
            })?
            .to_string();

        Ok(TransferJob::Download {
            key,
            local_root: local_root.to_path_buf(),
            relative_path,
        })
    }

    /// Job pushing `file` (found under `local_root`) below `key_prefix`
    pub fn upload(file: PathBuf, local_root: &Path, key_prefix: &str) -> Self {
        TransferJob::Upload {
            path: file,
            local_root: local_root.to_path_buf(),
            key_prefix: key_prefix.to_string(),
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            TransferJob::Download { .. } => Direction::Download,
            TransferJob::Upload { .. } => Direction::Upload,
        }
    }

    /// Source identifier: the object key or the local path
    pub fn source_id(&self) -> String {
        match self {
            TransferJob::Download { key, .. } => key.clone(),
            TransferJob::Upload { path, .. } => path.display().to_string(),
        }
    }

    /// Key-style path below the local root
    pub fn relative_path(&self) -> Result<String> {
        match self {
            TransferJob::Download { relative_path, .. } => Ok(relative_path.clone()),
            TransferJob::Upload {
                path, local_root, ..
            } => path::relative_local_path(path, local_root),
        }
    }

    /// Resolve the destination: local file for downloads, key for uploads
    pub fn destination(&self) -> Result<Destination> {
        match self {
            TransferJob::Download {
                local_root,
                relative_path,
                ..
            } => path::local_destination(local_root, relative_path).map(Destination::File),
            TransferJob::Upload { key_prefix, .. } => {
                let relative_path = self.relative_path()?;
                Ok(Destination::Object(path::join_key(key_prefix, &relative_path)))
            }
        }
    }
}

/// An ordered slice of jobs owned by exactly one worker
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: usize,
    pub jobs: Vec<TransferJob>,
}

impl Batch {
    pub fn new(id: usize, jobs: Vec<TransferJob>) -> Self {
        Self { id, jobs }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_job_relative_path() {
        let root = PathBuf::from("/srv/models/flux");
        let job = TransferJob::download("models/flux/unet/diffusion.bin", "models/flux/", &root)
            .unwrap();

        assert_eq!(job.direction(), Direction::Download);
        assert_eq!(job.relative_path().unwrap(), "unet/diffusion.bin");
        assert_eq!(job.source_id(), "models/flux/unet/diffusion.bin");
        assert_eq!(
            job.destination().unwrap(),
            Destination::File(root.join("unet").join("diffusion.bin"))
        );
    }

    #[test]
    fn test_download_job_rejects_foreign_key() {
        let root = PathBuf::from("/srv");
        let err = TransferJob::download("other/a.bin", "models/flux/", &root).unwrap_err();
        assert!(matches!(err, SyncError::Enumeration { .. }));
    }

    #[test]
    fn test_download_job_with_traversal_fails_at_destination() {
        let root = PathBuf::from("/srv/models");
        let job = TransferJob::download("models/../../etc/passwd", "models/", &root).unwrap();
        assert!(matches!(job.destination(), Err(SyncError::Filesystem { .. })));
    }

    #[test]
    fn test_upload_job_both_prefix_forms() {
        let root = Path::new("local_setup");
        let file = root.join("unet").join("diffusion.bin");

        for prefix in ["models/flux", "models/flux/"] {
            let job = TransferJob::upload(file.clone(), root, prefix);
            assert_eq!(job.direction(), Direction::Upload);
            assert_eq!(job.relative_path().unwrap(), "unet/diffusion.bin");
            assert_eq!(
                job.destination().unwrap(),
                Destination::Object("models/flux/unet/diffusion.bin".to_string())
            );
        }
    }

    #[test]
    fn test_upload_job_outside_root_fails_at_destination() {
        let file = PathBuf::from("elsewhere/a.bin");
        let job = TransferJob::upload(file.clone(), Path::new("local_setup"), "flux");
        assert_eq!(job.source_id(), file.display().to_string());
        assert!(job.relative_path().is_err());
        assert!(matches!(job.destination(), Err(SyncError::Filesystem { .. })));
    }
}
