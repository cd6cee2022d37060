//! `reqsync prime <context>`: prime ansible-test sanity virtual environments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use reqsync_container::{
    prime::{self, PrimeOptions},
    SystemRunner,
};
use reqsync_core::layout::FilesLayout;

/// Arguments for `reqsync prime`.
#[derive(Args, Debug)]
pub struct PrimeArgs {
    /// Container context (e.g. "default").
    pub context: String,

    /// Directory holding ansible-test-ref.txt and the context directories.
    #[arg(long, default_value = ".")]
    pub files_dir: PathBuf,

    /// Interpreter used to run ansible-test.
    #[arg(long, default_value = "python3")]
    pub python: String,

    /// Repository to clone.
    #[arg(long, default_value = prime::DEFAULT_REPO_URL)]
    pub repo_url: String,

    /// Scratch directory for the clone; removed afterwards.
    #[arg(long, default_value = prime::DEFAULT_WORK_DIR)]
    pub work_dir: PathBuf,
}

impl PrimeArgs {
    pub fn run(self) -> Result<()> {
        let files = FilesLayout::at(&self.files_dir);
        let options = PrimeOptions {
            python: self.python,
            repo_url: self.repo_url,
            work_dir: self.work_dir,
            ..PrimeOptions::new(self.context.clone())
        };

        let primed = prime::prime(&SystemRunner, &files, &options)
            .with_context(|| format!("priming failed for context '{}'", self.context))?;

        if !primed {
            println!(
                "Context '{}' has no frozen requirements; nothing to prime.",
                self.context
            );
        }
        Ok(())
    }
}
