//! Optional `reqsync.yaml` read from the update directory.
//!
//! Every field has a default, so a missing file yields the configuration used
//! for `ansible/ansible`. An unknown key is a parse error.

use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::types::{RemoteFile, RenameMapping};

/// File name looked up in the update directory.
pub const CONFIG_FILE: &str = "reqsync.yaml";

/// A single file downloaded from the raw-content host in addition to the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraFile {
    /// Local name under `requirements/`.
    pub name: String,
    /// Path inside the upstream repository.
    pub path: String,
}

/// Upstream source and reconciliation rules for `reqsync update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateConfig {
    pub api_url: String,
    pub raw_url: String,
    /// `<owner>/<repo>`.
    pub repository: String,
    pub requirements_path: String,
    pub extra_files: Vec<ExtraFile>,
    /// Globs matched against upstream names; matching files are not kept locally.
    pub skip: Vec<String>,
    pub renames: RenameMapping,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            raw_url: "https://raw.githubusercontent.com".to_string(),
            repository: "ansible/ansible".to_string(),
            requirements_path: "test/lib/ansible_test/_data/requirements".to_string(),
            extra_files: vec![ExtraFile {
                name: "constants.py".to_string(),
                path: "test/lib/ansible_test/_util/target/common/constants.py".to_string(),
            }],
            // sanity test requirements are installed by ansible-test's --prime-venvs option
            skip: ["sanity.txt", "sanity.*.txt", "sanity.in", "sanity.*.in"]
                .map(String::from)
                .to_vec(),
            renames: RenameMapping::default(),
        }
    }
}

impl UpdateConfig {
    /// `<dir>/reqsync.yaml`: pure, no I/O.
    pub fn path_at(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    /// Load `<dir>/reqsync.yaml`, falling back to defaults when it is absent.
    ///
    /// Returns `CoreError::Parse` (with path + line context) if malformed YAML.
    pub fn load_at(dir: &Path) -> Result<Self, CoreError> {
        let path = Self::path_at(dir);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(io_err(path, e)),
        };
        let config: Self =
            serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse { path, source: e })?;
        config.skip_patterns()?;
        config.renames.validate()?;
        Ok(config)
    }

    /// Compile [`UpdateConfig::skip`] into glob patterns.
    pub fn skip_patterns(&self) -> Result<Vec<Pattern>, CoreError> {
        self.skip
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| CoreError::Pattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect()
    }

    /// `GET` target resolving a branch to its head commit.
    pub fn branch_url(&self, branch: &str) -> String {
        format!("{}/repos/{}/branches/{branch}", self.api_url, self.repository)
    }

    /// `GET` target listing the requirements directory at `git_ref`.
    pub fn contents_url(&self, git_ref: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}?ref={git_ref}",
            self.api_url, self.repository, self.requirements_path
        )
    }

    /// Extra files pinned to `git_ref` on the raw-content host.
    pub fn extra_remote_files(&self, git_ref: &str) -> Vec<RemoteFile> {
        self.extra_files
            .iter()
            .map(|f| {
                RemoteFile::new(
                    f.name.clone(),
                    format!("{}/{}/{git_ref}/{}", self.raw_url, self.repository, f.path),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = UpdateConfig::load_at(dir.path()).unwrap();
        assert_eq!(config, UpdateConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "repository: example/fork\nrenames:\n  cloud.azure.txt: azure.txt\n",
        )
        .unwrap();
        let config = UpdateConfig::load_at(dir.path()).unwrap();
        assert_eq!(config.repository, "example/fork");
        assert_eq!(config.renames.local_name("cloud.azure.txt"), "azure.txt");
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.skip, UpdateConfig::default().skip);
    }

    #[test]
    fn unknown_key_is_parse_error_with_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "repo: typo\n").unwrap();
        let err = UpdateConfig::load_at(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn rename_escaping_the_directory_is_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "renames:\n  cloud.azure.txt: ../escaped.txt\n",
        )
        .unwrap();
        let err = UpdateConfig::load_at(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRename { .. }), "got: {err}");
        assert!(err.to_string().contains("../escaped.txt"));
    }

    #[test]
    fn bad_glob_is_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "skip: [\"[unclosed\"]\n").unwrap();
        let err = UpdateConfig::load_at(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::Pattern { .. }), "got: {err}");
    }

    #[test]
    fn urls_use_repository_and_ref() {
        let config = UpdateConfig::default();
        assert_eq!(
            config.branch_url("devel"),
            "https://api.github.com/repos/ansible/ansible/branches/devel"
        );
        assert_eq!(
            config.contents_url("abc123"),
            "https://api.github.com/repos/ansible/ansible/contents/test/lib/ansible_test/_data/requirements?ref=abc123"
        );
        let extra = config.extra_remote_files("abc123");
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].name, "constants.py");
        assert_eq!(
            extra[0].download_url,
            "https://raw.githubusercontent.com/ansible/ansible/abc123/test/lib/ansible_test/_util/target/common/constants.py"
        );
    }
}
