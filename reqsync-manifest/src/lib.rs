//! # reqsync-manifest
//!
//! Remote manifest listing and local reconciliation.
//!
//! Call [`pipeline::update`] to resolve the pinned ref, list the upstream
//! requirements directory and reconcile it into `requirements/`, or
//! [`pipeline::diff`] to preview the same run as unified diffs.

pub mod diff;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod source;
pub mod writer;

pub use diff::{diff_plan, FileDiff};
pub use error::ManifestError;
pub use reconcile::{apply, plan, reconcile, PlanEntry, ReconcileOptions};
pub use source::{GithubSource, RemoteSource};
