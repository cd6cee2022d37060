//! `pip` invocations for a single interpreter.

use std::path::{Path, PathBuf};

use reqsync_core::{Package, PythonVersion};

use crate::error::ContainerError;
use crate::runner::{path_arg, CommandRunner, CommandSpec};

/// An interpreter found on the search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Python {
    pub version: PythonVersion,
    pub path: PathBuf,
}

impl Python {
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(path_arg(&self.path))
    }
}

/// `python -m pip` bound to one interpreter and runner.
pub struct Pip<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    python: &'a Python,
}

impl<'a, R: CommandRunner + ?Sized> Pip<'a, R> {
    pub fn new(runner: &'a R, python: &'a Python) -> Self {
        Self { runner, python }
    }

    fn pip(&self) -> CommandSpec {
        self.python
            .command()
            .args(["-m", "pip", "--disable-pip-version-check"])
    }

    pub fn install<I, S>(&self, args: I) -> Result<(), ContainerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .run_checked(&self.pip().arg("install").args(args))?;
        Ok(())
    }

    /// `pip install -r <requirements> -c <constraints>`.
    pub fn install_requirements(
        &self,
        requirements: &Path,
        constraints: &Path,
    ) -> Result<(), ContainerError> {
        self.install([
            "-r".to_string(),
            path_arg(requirements),
            "-c".to_string(),
            path_arg(constraints),
        ])
    }

    /// Installed packages sorted by name, as reported by `pip list`.
    pub fn list(&self) -> Result<Vec<Package>, ContainerError> {
        let output = self
            .runner
            .run_checked(&self.pip().args(["list", "--format", "json"]).captured())?;
        let mut packages: Vec<Package> =
            serde_json::from_str(output.stdout.trim()).map_err(|source| {
                ContainerError::PipList {
                    python: self.python.version,
                    source,
                }
            })?;
        packages.sort();
        Ok(packages)
    }

    pub fn check(&self) -> Result<(), ContainerError> {
        self.runner.run_checked(&self.pip().arg("check"))?;
        Ok(())
    }

    /// Build wheels for `requirements` under the given constraints file.
    pub fn wheel(&self, requirements: &[String], constraints: &Path) -> Result<(), ContainerError> {
        self.runner.run_checked(
            &self
                .pip()
                .arg("wheel")
                .args(requirements.iter().cloned())
                .args(["-c".to_string(), path_arg(constraints)]),
        )?;
        Ok(())
    }

    pub fn purge_cache(&self) -> Result<(), ContainerError> {
        self.runner
            .run_checked(&self.pip().args(["cache", "purge"]))?;
        Ok(())
    }
}
