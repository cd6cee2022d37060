//! reqsync core library: domain types, configuration, layout, errors.
//!
//! Public API surface:
//! - [`types`]: remote files, rename mappings, dispositions, versions
//! - [`config`]: `reqsync.yaml` loading with defaults
//! - [`layout`]: path helpers and marker files
//! - [`constants`]: supported interpreter versions from `constants.py`
//! - [`error`]: [`CoreError`]

pub mod config;
pub mod constants;
pub mod error;
pub mod layout;
pub mod types;

pub use config::{ExtraFile, UpdateConfig};
pub use constants::SupportedPythons;
pub use error::CoreError;
pub use layout::{FilesLayout, RepoLayout};
pub use types::{is_plain_file_name, Disposition, Package, PythonVersion, RemoteFile, RenameMapping};
