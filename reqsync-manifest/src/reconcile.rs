//! Manifest reconciliation.
//!
//! Reconciliation runs in two phases:
//!
//! 1. [`plan`]: validate the rename mapping against the listing, resolve one
//!    distinct plain local name per kept file, scan the local directory, fetch
//!    every kept remote file and classify each path. Nothing is written.
//! 2. [`apply`]: perform the writes and deletes recorded in the plan and
//!    report a [`Disposition`] per path.
//!
//! After a successful apply the local directory holds exactly the (renamed,
//! non-skipped) remote files with byte-identical content.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use glob::Pattern;

use reqsync_core::{is_plain_file_name, Disposition, RemoteFile, RenameMapping};

use crate::error::{io_err, ManifestError};
use crate::source::RemoteSource;
use crate::writer::{atomic_write, TMP_SUFFIX};

/// Rules applied while reconciling a listing into a directory.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions<'a> {
    pub renames: &'a RenameMapping,
    /// Upstream names matching any pattern are treated as absent.
    pub skip: &'a [Pattern],
    pub dry_run: bool,
}

/// One classified path in a reconciliation plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEntry {
    /// Local content already equals the remote content.
    Keep { path: PathBuf },
    /// Local content is missing (`current: None`) or differs from `latest`.
    Write {
        path: PathBuf,
        current: Option<Vec<u8>>,
        latest: Vec<u8>,
    },
    /// Local file with no remote counterpart.
    Remove { path: PathBuf },
}

impl PlanEntry {
    pub fn path(&self) -> &Path {
        match self {
            PlanEntry::Keep { path } | PlanEntry::Write { path, .. } | PlanEntry::Remove { path } => {
                path
            }
        }
    }
}

/// Classify every path without touching the filesystem.
///
/// Entries follow the remote listing order; removals come last, sorted by path.
pub fn plan<S: RemoteSource + ?Sized>(
    source: &S,
    remote: &[RemoteFile],
    local_dir: &Path,
    options: &ReconcileOptions<'_>,
) -> Result<Vec<PlanEntry>, ManifestError> {
    let unused = options
        .renames
        .unused(remote.iter().map(|f| f.name.as_str()));
    if !unused.is_empty() {
        return Err(ManifestError::UnusedRenames { names: unused });
    }

    let kept: Vec<&RemoteFile> = remote
        .iter()
        .filter(|file| {
            let skipped = options.skip.iter().any(|p| p.matches(&file.name));
            if skipped {
                tracing::debug!("skipping {}", file.name);
            }
            !skipped
        })
        .collect();
    let targets = local_names(&kept, options.renames)?;

    let mut untouched = local_files(local_dir)?;
    let mut entries = Vec::with_capacity(kept.len());

    for (file, local_name) in kept.into_iter().zip(targets) {
        let path = local_dir.join(local_name);
        untouched.remove(&path);

        let latest = source.fetch(file)?;
        let current = read_existing(&path)?;

        if current.as_deref() == Some(latest.as_slice()) {
            tracing::debug!("unchanged: {}", path.display());
            entries.push(PlanEntry::Keep { path });
        } else {
            entries.push(PlanEntry::Write {
                path,
                current,
                latest,
            });
        }
    }

    entries.extend(untouched.into_iter().map(|path| PlanEntry::Remove { path }));
    Ok(entries)
}

/// Carry out `entries`; in dry-run mode only report what would happen.
pub fn apply(entries: Vec<PlanEntry>, dry_run: bool) -> Result<Vec<Disposition>, ManifestError> {
    let mut dispositions = Vec::with_capacity(entries.len());
    for entry in entries {
        let disposition = match entry {
            PlanEntry::Keep { path } => Disposition::Unchanged { path },
            PlanEntry::Write { path, latest, .. } => {
                if dry_run {
                    tracing::info!("[dry-run] would write: {}", path.display());
                } else {
                    atomic_write(&path, &latest)?;
                }
                Disposition::Updated { path }
            }
            PlanEntry::Remove { path } => {
                if dry_run {
                    tracing::info!("[dry-run] would delete: {}", path.display());
                } else {
                    std::fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
                    tracing::info!("deleted: {}", path.display());
                }
                Disposition::Deleted { path }
            }
        };
        dispositions.push(disposition);
    }
    Ok(dispositions)
}

/// Reconcile `remote` into `local_dir`: [`plan`] followed by [`apply`].
///
/// Fails before any fetch or write when a rename entry matches no listed file,
/// when a local name is not a plain file name, or when two files map to the
/// same local name.
pub fn reconcile<S: RemoteSource + ?Sized>(
    source: &S,
    remote: &[RemoteFile],
    local_dir: &Path,
    options: &ReconcileOptions<'_>,
) -> Result<Vec<Disposition>, ManifestError> {
    let entries = plan(source, remote, local_dir, options)?;
    apply(entries, options.dry_run)
}

/// Local name for each of `files`, in order.
///
/// Every name must be a plain file name and no two files may share one.
fn local_names<'a>(
    files: &[&'a RemoteFile],
    renames: &'a RenameMapping,
) -> Result<Vec<&'a str>, ManifestError> {
    let mut claims: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut names = Vec::with_capacity(files.len());
    for &file in files {
        let local = renames.local_name(&file.name);
        if !is_plain_file_name(local) {
            return Err(ManifestError::InvalidLocalName {
                remote: file.name.clone(),
                local: local.to_string(),
            });
        }
        claims.entry(local).or_default().push(file.name.clone());
        names.push(local);
    }

    if let Some((name, sources)) = claims.into_iter().find(|(_, sources)| sources.len() > 1) {
        return Err(ManifestError::RenameCollision {
            name: name.to_string(),
            sources,
        });
    }
    Ok(names)
}

/// Regular files directly under `dir`. A missing directory is empty.
fn local_files(dir: &Path) -> Result<BTreeSet<PathBuf>, ManifestError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(io_err(dir, e)),
    };

    let mut files = BTreeSet::new();
    let mut leftovers = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| io_err(entry.path(), e))?
            .is_file();
        if !is_file {
            continue;
        }
        let path = entry.path();
        if entry.file_name().to_string_lossy().ends_with(TMP_SUFFIX) {
            leftovers.push(path);
        } else {
            files.insert(path);
        }
    }

    if !leftovers.is_empty() {
        leftovers.sort();
        return Err(ManifestError::LeftoverTemp { paths: leftovers });
    }
    Ok(files)
}

pub(crate) fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, ManifestError> {
    match std::fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}
