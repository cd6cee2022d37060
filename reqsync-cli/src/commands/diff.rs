//! `reqsync diff`: show unified diffs for what update would change.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use reqsync_core::{layout::RepoLayout, UpdateConfig};
use reqsync_manifest::{
    pipeline::{self, Target},
    GithubSource,
};

/// Arguments for `reqsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Upstream branch (defaults to files/ansible-test-branch.txt).
    #[arg(long)]
    pub branch: Option<String>,

    /// Upstream commit (defaults to the branch head).
    #[arg(long = "ref", value_name = "REF")]
    pub git_ref: Option<String>,

    /// Repository root holding files/, requirements/ and reqsync.yaml.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let config = UpdateConfig::load_at(&self.dir).context("failed to load reqsync.yaml")?;
        let repo = RepoLayout::at(&self.dir);
        let source = GithubSource::new(config.clone());
        let target = Target {
            branch: self.branch,
            git_ref: self.git_ref,
        };

        let result = pipeline::diff(&repo, &config, &source, target).context("diff failed")?;

        if result.diffs.is_empty() {
            println!("No differences at {}.", result.target.git_ref);
            return Ok(());
        }

        for diff in result.diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }

        Ok(())
    }
}
