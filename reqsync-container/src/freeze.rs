//! `reqsync freeze`: capture installed package versions from a built image.

use std::path::PathBuf;

use regex::Regex;

use reqsync_core::{
    layout::{RepoLayout, FREEZE_KEEP},
    PythonVersion,
};

use crate::display;
use crate::error::{io_err, ContainerError};
use crate::runner::{path_arg, CommandRunner, CommandSpec};

/// Interpreter versions found in the image and the files written for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeReport {
    pub versions: Vec<PythonVersion>,
    pub written: Vec<PathBuf>,
}

/// Purge `freeze/`, build `container` from the repo root and write one
/// `freeze/<major>.<minor>.txt` per `python<major>.<minor>` in `/usr/bin`.
pub fn freeze<R: CommandRunner + ?Sized>(
    runner: &R,
    repo: &RepoLayout,
    container: &str,
) -> Result<FreezeReport, ContainerError> {
    let freeze_dir = repo.freeze_dir();

    display::section("Purging existing frozen requirements.");
    purge(&freeze_dir)?;

    display::section("Building a container to freeze the requirements.");
    runner.run_checked(
        &CommandSpec::new("docker")
            .args(["build", "-t", container])
            .arg(path_arg(&repo.root)),
    )?;

    display::section("Finding supported Python versions.");
    let listing = runner.run_checked(
        &CommandSpec::new("docker")
            .args(["run", container, "ls", "/usr/bin"])
            .captured(),
    )?;
    let versions = parse_interpreters(&listing.stdout);

    let mut written = Vec::with_capacity(versions.len());
    for version in &versions {
        display::section(&format!("Freezing requirements for Python {version}."));
        let frozen = runner.run_checked(
            &CommandSpec::new("docker")
                .args(["run", container])
                .arg(format!("/usr/bin/python{version}"))
                .args([
                    "-m",
                    "pip.__main__",
                    "freeze",
                    "-qqq",
                    "--disable-pip-version-check",
                ])
                .captured(),
        )?;

        let path = freeze_dir.join(format!("{version}.txt"));
        std::fs::write(&path, frozen.stdout).map_err(|e| io_err(&path, e))?;
        tracing::info!("wrote: {}", path.display());
        written.push(path);
    }

    display::section("Freezing completed.");
    Ok(FreezeReport { versions, written })
}

/// Versions of every `python<major>.<minor>` line in an `ls` listing, ascending.
pub fn parse_interpreters(listing: &str) -> Vec<PythonVersion> {
    let Ok(pattern) = Regex::new(r"^python(\d+\.\d+)$") else {
        return Vec::new();
    };
    let mut versions: Vec<PythonVersion> = listing
        .lines()
        .filter_map(|line| pattern.captures(line.trim()))
        .filter_map(|c| c[1].parse().ok())
        .collect();
    versions.sort();
    versions.dedup();
    versions
}

/// Remove everything in `dir` except the keep-file, creating `dir` if needed.
fn purge(dir: &std::path::Path) -> Result<(), ContainerError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        if entry.file_name() == FREEZE_KEEP {
            continue;
        }
        let path = entry.path();
        std::fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
        tracing::debug!("purged: {}", path.display());
    }
    Ok(())
}
