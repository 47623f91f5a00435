/*!
 * Path translation between object keys and local paths
 *
 * Keys always use `/`. Local paths are built segment by segment so the
 * same key produces the right path on every platform.
 */

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, SyncError};

pub const KEY_SEPARATOR: char = '/';

/// Normalize a remote prefix to end with exactly one separator
///
/// `"models/flux"`, `"models/flux/"` and `"models/flux//"` all become
/// `"models/flux/"`.
pub fn normalize_prefix(prefix: &str) -> Result<String> {
    let trimmed = prefix.trim().trim_end_matches(KEY_SEPARATOR);
    if trimmed.trim_start_matches(KEY_SEPARATOR).is_empty() {
        return Err(SyncError::Config(format!(
            "Model path must name a prefix inside the bucket, got {:?}",
            prefix
        )));
    }
    Ok(format!("{}{}", trimmed, KEY_SEPARATOR))
}

/// Strip `prefix` from `key`, returning the part below it
///
/// The result never starts with a separator. Returns `None` when `key` is not
/// under `prefix`.
pub fn relative_key<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)
        .map(|rest| rest.trim_start_matches(KEY_SEPARATOR))
}

/// Keys that only mark a "directory" and carry no file content
pub fn is_directory_marker(key: &str, prefix: &str) -> bool {
    key.ends_with(KEY_SEPARATOR) || relative_key(key, prefix).is_some_and(str::is_empty)
}

/// Local directory mirroring `prefix` under `dest_dir`
pub fn local_root(dest_dir: &Path, prefix: &str) -> PathBuf {
    let mut root = dest_dir.to_path_buf();
    for segment in prefix.split(KEY_SEPARATOR).filter(|s| !s.is_empty()) {
        root.push(segment);
    }
    root
}

/// Local path for a relative key under `local_root`
///
/// Rejects empty, `.` and `..` segments so a key can never resolve outside
/// the local root.
pub fn local_destination(local_root: &Path, relative: &str) -> Result<PathBuf> {
    let mut dest = local_root.to_path_buf();
    for segment in relative.split(KEY_SEPARATOR) {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(SyncError::filesystem(
                local_root.join(relative),
                format!("refusing key segment {:?}", segment),
            ));
        }
        dest.push(segment);
    }
    Ok(dest)
}

/// Key-style relative path of `path` below `root`
pub fn relative_local_path(path: &Path, root: &Path) -> Result<String> {
    let rest = path
        .strip_prefix(root)
        .map_err(|_| SyncError::filesystem(path, format!("not under {}", root.display())))?;

    let mut segments = Vec::new();
    for component in rest.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| SyncError::filesystem(path, "path is not valid UTF-8"))?;
                segments.push(part);
            }
            Component::CurDir => {}
            _ => {
                return Err(SyncError::filesystem(path, "unexpected path component"));
            }
        }
    }

    if segments.is_empty() {
        return Err(SyncError::filesystem(path, "path is the local root itself"));
    }
    Ok(segments.join("/"))
}

/// Join a bucket path and a relative key with exactly one separator
///
/// Works the same whether or not `prefix` already ends with `/`.
pub fn join_key(prefix: &str, relative: &str) -> String {
    let prefix = prefix.trim_end_matches(KEY_SEPARATOR);
    let relative = relative.trim_start_matches(KEY_SEPARATOR);
    if prefix.is_empty() {
        relative.to_string()
    } else {
        format!("{}{}{}", prefix, KEY_SEPARATOR, relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("models/flux").unwrap(), "models/flux/");
        assert_eq!(normalize_prefix("models/flux/").unwrap(), "models/flux/");
        assert_eq!(normalize_prefix("models/flux//").unwrap(), "models/flux/");
        assert_eq!(normalize_prefix("flux-1.dev").unwrap(), "flux-1.dev/");
    }

    #[test]
    fn test_normalize_prefix_rejects_empty() {
        assert!(matches!(normalize_prefix(""), Err(SyncError::Config(_))));
        assert!(matches!(normalize_prefix("/"), Err(SyncError::Config(_))));
        assert!(matches!(normalize_prefix("  "), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_relative_key_strips_prefix() {
        assert_eq!(
            relative_key("models/flux/unet/diffusion.bin", "models/flux/"),
            Some("unet/diffusion.bin")
        );
        assert_eq!(relative_key("other/unet.bin", "models/flux/"), None);
    }

    #[test]
    fn test_relative_key_never_starts_with_separator() {
        assert_eq!(relative_key("models/flux//a.bin", "models/flux/"), Some("a.bin"));
    }

    #[test]
    fn test_directory_markers() {
        assert!(is_directory_marker("models/flux/", "models/flux/"));
        assert!(is_directory_marker("models/flux/unet/", "models/flux/"));
        assert!(!is_directory_marker("models/flux/unet/a.bin", "models/flux/"));
    }

    #[test]
    fn test_local_destination() {
        let root = local_root(Path::new("/srv"), "models/flux/");
        assert_eq!(root, Path::new("/srv").join("models").join("flux"));

        let dest = local_destination(&root, "unet/diffusion.bin").unwrap();
        assert_eq!(dest, root.join("unet").join("diffusion.bin"));
    }

    #[test]
    fn test_local_destination_rejects_escape() {
        let root = PathBuf::from("/srv/models");
        assert!(local_destination(&root, "../etc/passwd").is_err());
        assert!(local_destination(&root, "unet/./a.bin").is_err());
        assert!(local_destination(&root, "").is_err());
    }

    #[test]
    fn test_relative_local_path() {
        let root = Path::new("local_setup");
        let path = root.join("unet").join("diffusion.bin");
        assert_eq!(relative_local_path(&path, root).unwrap(), "unet/diffusion.bin");
        assert!(relative_local_path(Path::new("elsewhere/a.bin"), root).is_err());
        assert!(relative_local_path(root, root).is_err());
    }

    #[test]
    fn test_join_key_without_trailing_separator() {
        assert_eq!(
            join_key("models/flux", "unet/diffusion.bin"),
            "models/flux/unet/diffusion.bin"
        );
    }

    #[test]
    fn test_join_key_with_trailing_separator() {
        assert_eq!(
            join_key("models/flux/", "unet/diffusion.bin"),
            "models/flux/unet/diffusion.bin"
        );
    }

    #[test]
    fn test_join_key_empty_prefix() {
        assert_eq!(join_key("", "model_index.json"), "model_index.json");
    }
}
