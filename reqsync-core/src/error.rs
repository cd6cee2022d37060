//! Error types for reqsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration, layout and parsing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A skip pattern in the config is not a valid glob.
    #[error("invalid skip pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A rename target would resolve outside the requirements directory.
    #[error("rename target '{local}' for '{remote}' must be a plain file name")]
    InvalidRename { remote: String, local: String },

    /// A Python version string was not of the form `<major>.<minor>`.
    #[error("invalid Python version '{0}'; expected <major>.<minor>")]
    InvalidVersion(String),

    /// A marker file existed but held only whitespace.
    #[error("marker file {path} is empty")]
    EmptyMarker { path: PathBuf },

    /// `constants.py` did not define the named tuple.
    #[error("{path} does not define {name}")]
    MissingConstant { path: PathBuf, name: String },
}

/// Convenience constructor for [`CoreError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
