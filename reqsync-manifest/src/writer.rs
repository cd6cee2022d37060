//! Atomic file replacement.
//!
//! Content is written to `<path>.reqsync.tmp` beside the target and renamed
//! over it, so readers never observe a partially written requirements file.

use std::path::{Path, PathBuf};

use crate::error::{io_err, ManifestError};

/// Suffix of in-flight temp files. Any left in a directory means a run died mid-write.
pub const TMP_SUFFIX: &str = ".reqsync.tmp";

/// `<path>.reqsync.tmp`: pure, no I/O.
pub fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}{TMP_SUFFIX}", path.display()))
}

/// Atomically replace `path` with `content`, creating parent directories.
///
/// On a failed rename the temp file is removed and `path` is left as it was.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = tmp_path(path);
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;

    if let Err(e) = std::fs::rename(&tmp, path) {
        if let Err(cleanup) = std::fs::remove_file(&tmp) {
            tracing::warn!("failed to remove {}: {cleanup}", tmp.display());
        }
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn write_replaces_content_and_removes_tmp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("units.txt");
        fs::write(&path, "old\n").unwrap();

        atomic_write(&path, b"new\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!tmp_path(&path).exists(), ".reqsync.tmp must be cleaned up");
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("requirements").join("units.txt");
        atomic_write(&path, b"pytest\n").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rename_failure_leaves_target_and_cleans_tmp() {
        let root = TempDir::new().unwrap();
        // a non-empty directory cannot be replaced by a file, whoever runs this
        let path = root.path().join("units.txt");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "original").unwrap();

        let err = atomic_write(&path, b"new content").unwrap_err();

        assert!(matches!(err, ManifestError::Io { .. }), "got: {err}");
        assert!(err.to_string().contains("units.txt"));
        assert_eq!(fs::read_to_string(path.join("keep")).unwrap(), "original");
        assert!(!tmp_path(&path).exists(), ".reqsync.tmp should be cleaned up");
    }
}
