//! `reqsync update`: pin the upstream ref and reconcile `requirements/`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use reqsync_core::{layout::RepoLayout, Disposition, UpdateConfig};
use reqsync_manifest::{
    pipeline::{self, Target},
    GithubSource,
};

/// Arguments for `reqsync update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Upstream branch (defaults to files/ansible-test-branch.txt).
    #[arg(long)]
    pub branch: Option<String>,

    /// Upstream commit (defaults to the branch head).
    #[arg(long = "ref", value_name = "REF")]
    pub git_ref: Option<String>,

    /// Repository root holding files/, requirements/ and reqsync.yaml.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Show what would change without writing any files.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct UpdateJson<'a> {
    branch: &'a str,
    #[serde(rename = "ref")]
    git_ref: &'a str,
    dry_run: bool,
    files: &'a [Disposition],
}

impl UpdateArgs {
    pub fn run(self) -> Result<()> {
        let config = UpdateConfig::load_at(&self.dir).context("failed to load reqsync.yaml")?;
        let repo = RepoLayout::at(&self.dir);
        let source = GithubSource::new(config.clone());
        let target = Target {
            branch: self.branch,
            git_ref: self.git_ref,
        };

        let outcome = pipeline::update(&repo, &config, &source, target, self.dry_run)
            .context("update failed")?;

        if self.json {
            let report = UpdateJson {
                branch: &outcome.target.branch,
                git_ref: &outcome.target.git_ref,
                dry_run: self.dry_run,
                files: &outcome.dispositions,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        print_results(&outcome.dispositions, &repo.root, self.dry_run);
        let changed = outcome.dispositions.iter().filter(|d| d.is_change()).count();
        let summary = format!(
            "✓ {} @ {} ({changed} changed, {} current)",
            outcome.target.branch,
            outcome.target.git_ref,
            outcome.dispositions.len() - changed
        );
        println!("{}", summary.green());
        Ok(())
    }
}

fn print_results(dispositions: &[Disposition], root: &Path, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    for disposition in dispositions {
        println!("{prefix}{}", result_line(disposition, root));
    }
}

/// `<path>: <label>` with the path relative to the repository root.
fn result_line(disposition: &Disposition, root: &Path) -> String {
    let path = disposition.path();
    let relative = path.strip_prefix(root).unwrap_or(path);
    format!("{}: {}", relative.display(), disposition.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_lines_are_relative_to_default_dir() {
        let root = PathBuf::from(".");
        let repo = RepoLayout::at(&root);
        let disposition = Disposition::Unchanged {
            path: repo.requirements_dir().join("units.txt"),
        };
        assert_eq!(
            result_line(&disposition, &repo.root),
            "requirements/units.txt: current"
        );
    }

    #[test]
    fn result_lines_are_relative_to_explicit_dir() {
        let repo = RepoLayout::at(Path::new("/work/container"));
        let disposition = Disposition::Deleted {
            path: repo.requirements_dir().join("old.txt"),
        };
        assert_eq!(
            result_line(&disposition, &repo.root),
            "requirements/old.txt: deleted"
        );
    }
}
