//! `reqsync requirements <context>`: install requirements into each interpreter.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use reqsync_container::{install, SystemRunner};
use reqsync_core::{layout::FilesLayout, SupportedPythons};

/// Arguments for `reqsync requirements`.
#[derive(Args, Debug)]
pub struct RequirementsArgs {
    /// Container context (e.g. "default").
    pub context: String,

    /// Directory holding pre-build/ and the context directories.
    #[arg(long, default_value = ".")]
    pub files_dir: PathBuf,
}

impl RequirementsArgs {
    pub fn run(self) -> Result<()> {
        let files = FilesLayout::at(&self.files_dir);
        let constants = files.constants_path();
        let supported = SupportedPythons::load(&constants)
            .with_context(|| format!("cannot read supported versions from {}", constants.display()))?;
        let controller_min = supported
            .controller_min()
            .with_context(|| format!("{} lists no controller versions", constants.display()))?;

        let pythons = install::discover_pythons(&supported);
        tracing::debug!("found {} supported interpreters", pythons.len());

        install::install_all(&SystemRunner, &files, &self.context, &pythons, controller_min)
            .with_context(|| format!("requirements setup failed for context '{}'", self.context))
    }
}
