//! Remote manifest sources.
//!
//! [`RemoteSource`] is the seam between reconciliation and the network; the
//! production implementation is [`GithubSource`], which issues unauthenticated
//! GETs against the GitHub REST API and the raw-content host.

use std::io::Read;

use serde::Deserialize;

use reqsync_core::{RemoteFile, UpdateConfig};

use crate::error::ManifestError;

/// Lists and downloads the desired manifest files.
pub trait RemoteSource {
    /// Resolve `branch` to the SHA of its head commit.
    fn head_commit(&self, branch: &str) -> Result<String, ManifestError>;

    /// List the requirements directory at `git_ref`.
    fn list(&self, git_ref: &str) -> Result<Vec<RemoteFile>, ManifestError>;

    /// Download the raw bytes of `file`.
    fn fetch(&self, file: &RemoteFile) -> Result<Vec<u8>, ManifestError>;
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BranchResponse {
    commit: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

/// [`RemoteSource`] backed by the GitHub Contents API.
pub struct GithubSource {
    agent: ureq::Agent,
    config: UpdateConfig,
}

impl GithubSource {
    pub fn new(config: UpdateConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("reqsync/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent, config }
    }

    fn get(&self, url: &str) -> Result<ureq::Response, ManifestError> {
        tracing::debug!("GET {url}");
        self.agent
            .get(url)
            .set("Accept", "application/vnd.github+json")
            .call()
            .map_err(|e| ManifestError::Http {
                url: url.to_string(),
                source: Box::new(e),
            })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ManifestError> {
        self.get(url)?
            .into_json()
            .map_err(|source| ManifestError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

impl RemoteSource for GithubSource {
    fn head_commit(&self, branch: &str) -> Result<String, ManifestError> {
        let branch: BranchResponse = self.get_json(&self.config.branch_url(branch))?;
        Ok(branch.commit.sha)
    }

    fn list(&self, git_ref: &str) -> Result<Vec<RemoteFile>, ManifestError> {
        let entries: Vec<ContentEntry> = self.get_json(&self.config.contents_url(git_ref))?;
        Ok(into_remote_files(entries))
    }

    fn fetch(&self, file: &RemoteFile) -> Result<Vec<u8>, ManifestError> {
        let mut body = Vec::new();
        self.get(&file.download_url)?
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|source| ManifestError::Decode {
                url: file.download_url.clone(),
                source,
            })?;
        Ok(body)
    }
}

fn into_remote_files(entries: Vec<ContentEntry>) -> Vec<RemoteFile> {
    entries
        .into_iter()
        .filter_map(|entry| match (entry.kind.as_str(), entry.download_url) {
            ("file", Some(url)) => Some(RemoteFile::new(entry.name, url)),
            _ => {
                tracing::debug!("ignoring non-file entry {}", entry.name);
                None
            }
        })
        .collect()
}
