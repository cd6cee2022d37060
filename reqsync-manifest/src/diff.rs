//! Unified diff preview for `reqsync diff`.

use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::error::ManifestError;
use crate::reconcile::{read_existing, PlanEntry};

/// A single file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Render a diff for every entry in `entries` that would change the disk.
///
/// Headers are relative to `base`. Removed files diff against empty content.
/// Content is diffed as-is, line endings included; a change that renders no
/// hunk (such as bytes lost to UTF-8 replacement) is reported as a one-line
/// notice. No files are written.
pub fn diff_plan(entries: &[PlanEntry], base: &Path) -> Result<Vec<FileDiff>, ManifestError> {
    let mut diffs = Vec::new();
    for entry in entries {
        let (old, new) = match entry {
            PlanEntry::Keep { .. } => continue,
            PlanEntry::Write {
                current, latest, ..
            } => (lossy(current.as_deref()), lossy(Some(latest.as_slice()))),
            PlanEntry::Remove { path } => (lossy(read_existing(path)?.as_deref()), String::new()),
        };

        let path = entry.path();
        let relative = path.strip_prefix(base).unwrap_or(path);
        let old_header = format!("a/{}", relative.display());
        let new_header = format!("b/{}", relative.display());
        let mut unified = TextDiff::from_lines(&old, &new)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();
        if unified.is_empty() {
            unified = format!("Files {old_header} and {new_header} differ\n");
        }

        diffs.push(FileDiff {
            path: path.to_path_buf(),
            unified_diff: unified,
        });
    }
    Ok(diffs)
}

fn lossy(bytes: Option<&[u8]>) -> String {
    bytes
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default()
}
