//! Shared `update` / `diff` entrypoints used by the CLI.

use reqsync_core::{
    layout::{self, RepoLayout},
    Disposition, RemoteFile, UpdateConfig,
};

use crate::diff::{diff_plan, FileDiff};
use crate::error::ManifestError;
use crate::reconcile::{apply, plan, ReconcileOptions};
use crate::source::RemoteSource;

/// Branch and ref overrides; `None` falls back to the marker file / branch head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub branch: Option<String>,
    pub git_ref: Option<String>,
}

/// Branch and commit a run was pinned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub branch: String,
    pub git_ref: String,
}

#[derive(Debug)]
pub struct UpdateOutcome {
    pub target: ResolvedTarget,
    pub dispositions: Vec<Disposition>,
}

#[derive(Debug)]
pub struct DiffOutcome {
    pub target: ResolvedTarget,
    pub diffs: Vec<FileDiff>,
}

/// Resolve the branch from the override or the branch marker, then the ref
/// from the override or the branch's head commit.
pub fn resolve_target<S: RemoteSource + ?Sized>(
    repo: &RepoLayout,
    source: &S,
    target: Target,
) -> Result<ResolvedTarget, ManifestError> {
    let branch = match target.branch {
        Some(branch) => branch,
        None => layout::read_marker(&repo.branch_marker())?,
    };
    let git_ref = match target.git_ref {
        Some(git_ref) => git_ref,
        None => source.head_commit(&branch)?,
    };
    tracing::debug!("resolved {branch} to {git_ref}");
    Ok(ResolvedTarget { branch, git_ref })
}

/// The requirements listing at `git_ref` plus the configured extra files.
pub fn listing<S: RemoteSource + ?Sized>(
    source: &S,
    config: &UpdateConfig,
    git_ref: &str,
) -> Result<Vec<RemoteFile>, ManifestError> {
    let mut files = source.list(git_ref)?;
    files.extend(config.extra_remote_files(git_ref));
    Ok(files)
}

/// Pin the markers and reconcile `requirements/` against upstream.
///
/// Dry runs leave both the markers and the requirements directory untouched.
pub fn update<S: RemoteSource + ?Sized>(
    repo: &RepoLayout,
    config: &UpdateConfig,
    source: &S,
    target: Target,
    dry_run: bool,
) -> Result<UpdateOutcome, ManifestError> {
    let target = resolve_target(repo, source, target)?;
    let files = listing(source, config, &target.git_ref)?;
    let skip = config.skip_patterns()?;
    let options = ReconcileOptions {
        renames: &config.renames,
        skip: &skip,
        dry_run,
    };
    // Planning writes nothing, so a rejected plan leaves the markers alone.
    let entries = plan(source, &files, &repo.requirements_dir(), &options)?;

    if !dry_run {
        layout::write_marker(&repo.branch_marker(), &target.branch)?;
        layout::write_marker(&repo.ref_marker(), &target.git_ref)?;
    }
    let dispositions = apply(entries, dry_run)?;

    Ok(UpdateOutcome {
        target,
        dispositions,
    })
}

/// Unified diffs of what [`update`] would change. Writes nothing.
pub fn diff<S: RemoteSource + ?Sized>(
    repo: &RepoLayout,
    config: &UpdateConfig,
    source: &S,
    target: Target,
) -> Result<DiffOutcome, ManifestError> {
    let target = resolve_target(repo, source, target)?;
    let files = listing(source, config, &target.git_ref)?;
    let skip = config.skip_patterns()?;
    let options = ReconcileOptions {
        renames: &config.renames,
        skip: &skip,
        dry_run: true,
    };
    let entries = plan(source, &files, &repo.requirements_dir(), &options)?;
    let diffs = diff_plan(&entries, &repo.root)?;

    Ok(DiffOutcome { target, diffs })
}
