//! `reqsync freeze <container>`: freeze pip packages from a built image.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use reqsync_container::{freeze, SystemRunner};
use reqsync_core::layout::RepoLayout;

/// Arguments for `reqsync freeze`.
#[derive(Args, Debug)]
pub struct FreezeArgs {
    /// Image tag to build and inspect.
    pub container: String,

    /// Repository root used as the Docker build context.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

impl FreezeArgs {
    pub fn run(self) -> Result<()> {
        let repo = RepoLayout::at(&self.dir);
        let report = freeze::freeze(&SystemRunner, &repo, &self.container)
            .with_context(|| format!("freeze failed for '{}'", self.container))?;

        for path in &report.written {
            println!("  ✎  {}", path.display());
        }
        Ok(())
    }
}
