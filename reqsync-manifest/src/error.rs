//! Error types for reqsync-manifest.

use std::path::PathBuf;

use thiserror::Error;

use reqsync_core::CoreError;

/// All errors that can arise from listing, fetching and reconciling manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Layout, marker or config error from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport failure or non-success status from a GET.
    #[error("GET {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// Response body could not be read or decoded.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// Rename-mapping keys that no remote file matched.
    #[error("unused rename mapping entries: {}", .names.join(", "))]
    UnusedRenames { names: Vec<String> },

    /// A local name would not be a single file inside the requirements directory.
    #[error("local name '{local}' for upstream '{remote}' is not a plain file name")]
    InvalidLocalName { remote: String, local: String },

    /// More than one upstream file maps to the same local name.
    #[error("local name '{name}' is claimed by several upstream files: {}", .sources.join(", "))]
    RenameCollision { name: String, sources: Vec<String> },

    /// Temp files from an interrupted run are still present.
    #[error("unexpected leftover temp files: {}", display_paths(.paths))]
    LeftoverTemp { paths: Vec<PathBuf> },
}

/// Convenience constructor for [`ManifestError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
