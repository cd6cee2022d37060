//! Domain types shared by the manifest and container crates.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Remote files
// ---------------------------------------------------------------------------

/// A file advertised by the remote listing. Content is fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub name: String,
    pub download_url: String,
}

impl RemoteFile {
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }
}

/// True when `name` is a single normal path component, so joining it onto a
/// directory stays inside that directory.
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

// ---------------------------------------------------------------------------
// Rename mapping
// ---------------------------------------------------------------------------

/// Maps an upstream file name to the name it is stored under locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenameMapping(pub BTreeMap<String, String>);

impl RenameMapping {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Local name for `remote_name`; the name itself when no entry applies.
    pub fn local_name<'a>(&'a self, remote_name: &'a str) -> &'a str {
        self.0.get(remote_name).map(String::as_str).unwrap_or(remote_name)
    }

    /// Fail on the first local name that is not a plain file name.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.0.iter().find(|(_, local)| !is_plain_file_name(local)) {
            Some((remote, local)) => Err(CoreError::InvalidRename {
                remote: remote.clone(),
                local: local.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Mapping keys that none of `remote_names` matched, in key order.
    pub fn unused<'a, I>(&self, remote_names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let seen: HashSet<&str> = remote_names.into_iter().collect();
        self.0
            .keys()
            .filter(|key| !seen.contains(key.as_str()))
            .cloned()
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RenameMapping {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Disposition
// ---------------------------------------------------------------------------

/// Outcome of reconciling a single local path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Disposition {
    /// Local content already matched the remote content.
    Unchanged { path: PathBuf },
    /// Local content was missing or different and has been (or would be) written.
    Updated { path: PathBuf },
    /// Local file had no remote counterpart and has been (or would be) removed.
    Deleted { path: PathBuf },
}

impl Disposition {
    pub fn path(&self) -> &Path {
        match self {
            Disposition::Unchanged { path }
            | Disposition::Updated { path }
            | Disposition::Deleted { path } => path,
        }
    }

    /// Word printed after the path in update output.
    pub fn label(&self) -> &'static str {
        match self {
            Disposition::Unchanged { .. } => "current",
            Disposition::Updated { .. } => "updated",
            Disposition::Deleted { .. } => "deleted",
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Disposition::Unchanged { .. })
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path().display(), self.label())
    }
}

// ---------------------------------------------------------------------------
// Python versions
// ---------------------------------------------------------------------------

/// A `<major>.<minor>` interpreter version, ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
}

impl PythonVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Interpreter binary name, e.g. `python3.12`.
    pub fn binary_name(&self) -> String {
        format!("python{self}")
    }
}

impl FromStr for PythonVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidVersion(s.to_owned());
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ---------------------------------------------------------------------------
// Installed packages
// ---------------------------------------------------------------------------

/// One row of `pip list --format json`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_mapping_reports_unused_keys() {
        let renames: RenameMapping =
            [("cloud.azure.txt", "azure.txt"), ("missing.txt", "gone.txt")]
                .into_iter()
                .collect();
        let unused = renames.unused(["cloud.azure.txt", "units.txt"]);
        assert_eq!(unused, vec!["missing.txt".to_string()]);
    }

    #[test]
    fn rename_mapping_passes_through_unmapped_names() {
        let renames: RenameMapping = [("a.txt", "b.txt")].into_iter().collect();
        assert_eq!(renames.local_name("a.txt"), "b.txt");
        assert_eq!(renames.local_name("c.txt"), "c.txt");
    }

    #[test]
    fn plain_file_names_exclude_paths() {
        for name in ["units.txt", "constants.py", ".hidden"] {
            assert!(is_plain_file_name(name), "{name}");
        }
        for name in ["", ".", "..", "../escaped.txt", "/etc/passwd", "sub/units.txt", "units.txt/", "./units.txt"] {
            assert!(!is_plain_file_name(name), "{name}");
        }
    }

    #[test]
    fn rename_mapping_rejects_non_plain_targets() {
        let renames: RenameMapping = [("a.txt", "/tmp/a.txt")].into_iter().collect();
        let err = renames.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidRename { .. }), "got: {err}");
    }

    #[test]
    fn versions_order_numerically() {
        let mut versions: Vec<PythonVersion> = ["3.10", "3.9", "2.7", "3.13"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        versions.sort();
        let rendered: Vec<String> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["2.7", "3.9", "3.10", "3.13"]);
    }

    #[test]
    fn disposition_display_matches_update_output() {
        let d = Disposition::Updated {
            path: PathBuf::from("requirements/units.txt"),
        };
        assert_eq!(d.to_string(), "requirements/units.txt: updated");
        assert!(d.is_change());
    }

    #[test]
    fn disposition_serializes_with_status_tag() {
        let d = Disposition::Deleted {
            path: PathBuf::from("requirements/old.txt"),
        };
        let json = serde_yaml::to_string(&d).unwrap();
        assert!(json.contains("status: deleted"));
        assert!(json.contains("path: requirements/old.txt"));
    }
}
