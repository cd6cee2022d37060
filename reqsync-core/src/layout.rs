//! Directory layouts and marker files.
//!
//! # Host-side repository ([`RepoLayout`])
//!
//! ```text
//! <root>/
//!   reqsync.yaml                    (optional)
//!   files/ansible-test-branch.txt
//!   files/ansible-test-ref.txt
//!   requirements/*.txt              (reconciled by `update`)
//!   freeze/<major>.<minor>.txt      (written by `freeze`)
//! ```
//!
//! # In-container files directory ([`FilesLayout`])
//!
//! ```text
//! <base>/
//!   ansible-test-ref.txt
//!   pre-build/<major>.<minor>.txt
//!   <context>/freeze/
//!   <context>/requirements/
//!   default/requirements/constants.py
//! ```
//!
//! Path helpers are pure; only the marker and listing helpers touch disk.

use std::path::{Path, PathBuf};

use crate::error::{io_err, CoreError};
use crate::types::PythonVersion;

pub const BRANCH_MARKER: &str = "ansible-test-branch.txt";
pub const REF_MARKER: &str = "ansible-test-ref.txt";

/// Entry in the freeze directory that survives a purge.
pub const FREEZE_KEEP: &str = ".freeze.txt";

// ---------------------------------------------------------------------------
// 1. Host-side repository
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLayout {
    pub root: PathBuf,
}

impl RepoLayout {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn branch_marker(&self) -> PathBuf {
        self.root.join("files").join(BRANCH_MARKER)
    }

    pub fn ref_marker(&self) -> PathBuf {
        self.root.join("files").join(REF_MARKER)
    }

    pub fn requirements_dir(&self) -> PathBuf {
        self.root.join("requirements")
    }

    pub fn freeze_dir(&self) -> PathBuf {
        self.root.join("freeze")
    }
}

// ---------------------------------------------------------------------------
// 2. In-container files directory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesLayout {
    pub base: PathBuf,
}

impl FilesLayout {
    pub fn at(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn ref_marker(&self) -> PathBuf {
        self.base.join(REF_MARKER)
    }

    pub fn freeze_dir(&self, context: &str) -> PathBuf {
        self.base.join(context).join("freeze")
    }

    pub fn requirements_dir(&self, context: &str) -> PathBuf {
        self.base.join(context).join("requirements")
    }

    /// `constants.py` always comes from the `default` context.
    pub fn constants_path(&self) -> PathBuf {
        self.requirements_dir("default").join("constants.py")
    }

    pub fn pre_build_path(&self, version: PythonVersion) -> PathBuf {
        self.base.join("pre-build").join(format!("{version}.txt"))
    }
}

// ---------------------------------------------------------------------------
// 3. Marker files
// ---------------------------------------------------------------------------

/// Read a single-value marker file, trimmed.
pub fn read_marker(path: &Path) -> Result<String, CoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let value = contents.trim();
    if value.is_empty() {
        return Err(CoreError::EmptyMarker {
            path: path.to_path_buf(),
        });
    }
    Ok(value.to_string())
}

/// Write `value` plus a trailing newline, creating the parent directory.
pub fn write_marker(path: &Path, value: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(path, format!("{value}\n")).map_err(|e| io_err(path, e))
}

/// True when `dir` holds at least one entry whose name does not start with `.`.
///
/// A populated freeze directory means the container is being finalised.
pub fn has_visible_entries(dir: &Path) -> Result<bool, CoreError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        if !entry.file_name().to_string_lossy().starts_with('.') {
            return Ok(true);
        }
    }
    Ok(false)
}
