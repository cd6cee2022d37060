//! Error types for reqsync-container.

use std::path::PathBuf;

use thiserror::Error;

use reqsync_core::{CoreError, Package, PythonVersion};

/// All errors that can arise while driving containers and interpreters.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Layout, marker or version error from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("command `{command}` exited with {status}{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// `pip list --format json` produced something other than a package list.
    #[error("unexpected pip list output for Python {python}: {source}")]
    PipList {
        python: PythonVersion,
        #[source]
        source: serde_json::Error,
    },

    /// Re-installing a requirements file changed the installed package set.
    #[error("conflicts detected in requirements for Python {python} ({requirements})")]
    Conflict {
        python: PythonVersion,
        requirements: String,
        expected: Vec<Package>,
        actual: Vec<Package>,
    },

    #[error("PyYAML for Python {python} was not compiled with libyaml support")]
    MissingLibyaml { python: PythonVersion },

    #[error("the coverage module for Python {python} does not have a working C extension")]
    MissingCoverageExtension { python: PythonVersion, output: String },

    #[error("unsupported pre-build comment: {line}")]
    PreBuild { line: String },

    #[error("pre-build constraint has no preceding requirement: {line}")]
    OrphanConstraint { line: String },
}

/// Convenience constructor for [`ContainerError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ContainerError {
    ContainerError::Io {
        path: path.into(),
        source,
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
