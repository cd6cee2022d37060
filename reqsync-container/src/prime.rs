//! `reqsync prime`: pre-populate ansible-test sanity virtual environments.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reqsync_core::layout::{self, FilesLayout};

use crate::display;
use crate::error::{io_err, ContainerError};
use crate::runner::{path_arg, CommandRunner, CommandSpec};

pub const DEFAULT_REPO_URL: &str = "https://github.com/ansible/ansible";
pub const DEFAULT_WORK_DIR: &str = "/tmp/sanity";
pub const DEFAULT_PYPI_ENDPOINT: &str = "https://d2c8fqinjk13kw.cloudfront.net/simple/";

/// Inputs to a priming run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeOptions {
    pub context: String,
    /// Interpreter used to launch `ansible-test`.
    pub python: String,
    pub repo_url: String,
    /// Scratch directory holding the clone; removed afterwards.
    pub work_dir: PathBuf,
    pub pypi_endpoint: String,
    /// pip's download cache, removed afterwards when set.
    pub pip_cache: Option<PathBuf>,
}

impl PrimeOptions {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            python: "python3".to_string(),
            repo_url: DEFAULT_REPO_URL.to_string(),
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            pypi_endpoint: DEFAULT_PYPI_ENDPOINT.to_string(),
            pip_cache: dirs::home_dir().map(|home| home.join(".cache").join("pip")),
        }
    }
}

/// Prime sanity venvs when the context's freeze directory is populated.
///
/// Returns `false` without running anything for an unfrozen context.
pub fn prime<R: CommandRunner + ?Sized>(
    runner: &R,
    files: &FilesLayout,
    options: &PrimeOptions,
) -> Result<bool, ContainerError> {
    if !layout::has_visible_entries(&files.freeze_dir(&options.context))? {
        tracing::debug!("context {} is not frozen; nothing to prime", options.context);
        return Ok(false);
    }

    setup_sanity_venvs(runner, files, options)?;
    Ok(true)
}

fn setup_sanity_venvs<R: CommandRunner + ?Sized>(
    runner: &R,
    files: &FilesLayout,
    options: &PrimeOptions,
) -> Result<(), ContainerError> {
    let git_ref = layout::read_marker(&files.ref_marker())?;
    let clone_dir = options.work_dir.join("ansible");
    let mut working_dir = clone_dir.clone();

    let prime = CommandSpec::new(&options.python)
        .arg(path_arg(&clone_dir.join("bin").join("ansible-test")))
        .args([
            "sanity",
            "--prime-venvs",
            "-v",
            "--color",
            "--allow-disabled",
        ]);

    display::section("Cloning Ansible");
    runner.run_checked(
        &CommandSpec::new("git")
            .args(["clone", "--depth", "500", "--branch", "devel"])
            .arg(&options.repo_url)
            .arg(path_arg(&clone_dir)),
    )?;
    runner.run_checked(
        &CommandSpec::new("git")
            .args(["reset", "--hard"])
            .arg(&git_ref)
            .cwd(&clone_dir),
    )?;

    if options.context == "default" {
        working_dir = options
            .work_dir
            .join("ansible_collections")
            .join("ns")
            .join("col");
        std::fs::create_dir_all(&working_dir).map_err(|e| io_err(&working_dir, e))?;
        let placeholder = working_dir.join("placeholder.txt");
        std::fs::write(&placeholder, "").map_err(|e| io_err(&placeholder, e))?;

        display::section("Priming Sanity Virtual Environments (import 2.6 with coverage)");
        runner.run_checked(
            &prime
                .clone()
                .args([
                    "--python",
                    "2.6",
                    "--test",
                    "import",
                    "--coverage",
                    "--pypi-proxy",
                    "--pypi-endpoint",
                ])
                .arg(&options.pypi_endpoint)
                .cwd(&working_dir),
        )?;
    }

    display::section("Priming Sanity Virtual Environments (without coverage)");
    runner.run_checked(&prime.clone().cwd(&working_dir))?;

    display::section("Priming Sanity Virtual Environments (with coverage)");
    runner.run_checked(&prime.arg("--coverage").cwd(&working_dir))?;

    display::section("Cleaning Up");
    remove_tree(&options.work_dir)?;
    if let Some(cache) = options.pip_cache.as_deref() {
        remove_tree(cache)?;
    }
    Ok(())
}

fn remove_tree(path: &Path) -> Result<(), ContainerError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("nothing to clean up at {}", path.display());
            Ok(())
        }
        Err(e) => Err(io_err(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::fake::*;
    use std::fs;
    use tempfile::TempDir;

    fn files_dir(frozen: bool) -> (TempDir, FilesLayout) {
        let base = TempDir::new().unwrap();
        let files = FilesLayout::at(base.path());
        for context in ["default", "ansible-core-ci"] {
            fs::create_dir_all(files.freeze_dir(context)).unwrap();
            fs::write(files.freeze_dir(context).join(".freeze.txt"), "").unwrap();
            if frozen {
                fs::write(files.freeze_dir(context).join("3.12.txt"), "PyYAML==6.0.2\n").unwrap();
            }
        }
        fs::write(files.ref_marker(), "0123abcd\n").unwrap();
        (base, files)
    }

    fn options(context: &str, scratch: &TempDir) -> PrimeOptions {
        PrimeOptions {
            work_dir: scratch.path().join("sanity"),
            pip_cache: Some(scratch.path().join("pip-cache")),
            ..PrimeOptions::new(context)
        }
    }

    #[test]
    fn unfrozen_context_is_a_no_op() {
        let (_base, files) = files_dir(false);
        let scratch = TempDir::new().unwrap();
        let runner = FakeRunner::new();

        let primed = prime(&runner, &files, &options("default", &scratch)).unwrap();

        assert!(!primed);
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn default_context_primes_import_then_both_coverage_modes() {
        let (_base, files) = files_dir(true);
        let scratch = TempDir::new().unwrap();
        let pip_cache = scratch.path().join("pip-cache");
        fs::create_dir_all(&pip_cache).unwrap();
        let runner = FakeRunner::new();

        assert!(prime(&runner, &files, &options("default", &scratch)).unwrap());

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[0].args[0], "clone");
        assert_eq!(calls[1].args, ["reset", "--hard", "0123abcd"]);

        let collection = scratch.path().join("sanity/ansible_collections/ns/col");
        assert!(calls[2].args.contains(&"2.6".to_string()));
        assert_eq!(calls[2].args.last().unwrap(), DEFAULT_PYPI_ENDPOINT);
        assert_eq!(calls[2].cwd.as_deref(), Some(collection.as_path()));
        assert!(!calls[3].args.contains(&"--coverage".to_string()));
        assert_eq!(calls[4].args.last().unwrap(), "--coverage");

        assert!(!scratch.path().join("sanity").exists(), "work dir must be removed");
        assert!(!pip_cache.exists(), "pip cache must be removed");
    }

    #[test]
    fn other_contexts_run_from_the_clone() {
        let (_base, files) = files_dir(true);
        let scratch = TempDir::new().unwrap();
        let runner = FakeRunner::new();

        prime(&runner, &files, &options("ansible-core-ci", &scratch)).unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 4);
        let clone = scratch.path().join("sanity/ansible");
        assert_eq!(calls[2].cwd.as_deref(), Some(clone.as_path()));
    }

    #[test]
    fn clone_failure_aborts() {
        let (_base, files) = files_dir(true);
        let scratch = TempDir::new().unwrap();
        let runner = FakeRunner::new().on("git clone", failed(128, "network unreachable"));

        let err = prime(&runner, &files, &options("default", &scratch)).unwrap_err();

        assert!(matches!(err, ContainerError::CommandFailed { .. }), "got: {err}");
        assert_eq!(runner.calls.borrow().len(), 1);
    }
}
